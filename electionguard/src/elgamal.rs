use crate::*;

/// An exponential ElGamal keypair.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ElGamalKeyPair {
    pub secret_key: ElementModQ,
    pub public_key: ElementModP,
}

impl ElGamalKeyPair {
    /// Derive the keypair for `secret`, which must be within `[2, Q)`.
    pub fn from_secret(secret: &ElementModQ) -> Result<Self, Error> {
        if secret.as_int() < ElementModQ::two().as_int() || !secret.is_in_bounds() {
            return Err(Error::InvalidSecretKey);
        }

        Ok(ElGamalKeyPair {
            secret_key: secret.clone(),
            public_key: g_pow_p(secret),
        })
    }
}

/// An exponential ElGamal ciphertext `(g^r, pk^r * g^m)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    pub pad: ElementModP,
    pub data: ElementModP,
}

impl ElGamalCiphertext {
    /// Recover the plaintext given `product = pk^r`.
    pub fn decrypt_known_product(
        &self,
        product: &ElementModP,
        dlog: &DiscreteLog,
    ) -> Result<u64, Error> {
        dlog.discrete_log(&div_p(&self.data, product)?)
    }

    pub fn decrypt(&self, secret_key: &ElementModQ, dlog: &DiscreteLog) -> Result<u64, Error> {
        self.decrypt_known_product(&pow_p(&self.pad, secret_key), dlog)
    }

    /// Recover the plaintext using the nonce the ciphertext was encrypted with.
    pub fn decrypt_known_nonce(
        &self,
        public_key: &ElementModP,
        nonce: &ElementModQ,
        dlog: &DiscreteLog,
    ) -> Result<u64, Error> {
        self.decrypt_known_product(&pow_p(public_key, nonce), dlog)
    }

    /// A single key holder's share of the decryption product, `pad^secret`.
    pub fn partial_decrypt(&self, secret_key: &ElementModQ) -> ElementModP {
        pow_p(&self.pad, secret_key)
    }

    pub fn is_valid_residue(&self) -> bool {
        self.pad.is_valid_residue() && self.data.is_valid_residue()
    }
}

impl CryptoHashable for ElGamalCiphertext {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[(&self.pad).into(), (&self.data).into()])
    }
}

/// Encrypt `message` under `public_key` with the given nonce.
///
/// Fails if the nonce is zero or the public key is not a member of the group.
pub fn elgamal_encrypt(
    message: u64,
    nonce: &ElementModQ,
    public_key: &ElementModP,
) -> Result<ElGamalCiphertext, Error> {
    if !nonce.is_in_bounds_no_zero() || !public_key.is_valid_residue() {
        return Err(Error::InvalidEncryption);
    }

    let pad = g_pow_p(nonce);
    let data = mult_p(&[&pow_p(public_key, nonce), &g_pow_p(&ElementModQ::from(message))]);

    Ok(ElGamalCiphertext { pad, data })
}

/// Homomorphically add ciphertexts. The sum of no ciphertexts is `(1, 1)`, an encryption of zero.
pub fn elgamal_add(ciphertexts: &[&ElGamalCiphertext]) -> ElGamalCiphertext {
    let pads: Vec<&ElementModP> = ciphertexts.iter().map(|c| &c.pad).collect();
    let datas: Vec<&ElementModP> = ciphertexts.iter().map(|c| &c.data).collect();

    ElGamalCiphertext {
        pad: mult_p(&pads),
        data: mult_p(&datas),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(
            ElGamalKeyPair::from_secret(&ElementModQ::zero()),
            Err(Error::InvalidSecretKey)
        ));
        assert!(matches!(
            ElGamalKeyPair::from_secret(&ElementModQ::one()),
            Err(Error::InvalidSecretKey)
        ));
        assert!(matches!(
            ElGamalKeyPair::from_secret(&int_to_q_unchecked(Q.clone())),
            Err(Error::InvalidSecretKey)
        ));
        assert!(ElGamalKeyPair::from_secret(&ElementModQ::two()).is_ok());
    }

    #[test]
    fn test_simple_encryption() {
        let keypair = ElGamalKeyPair::from_secret(&ElementModQ::two()).unwrap();
        assert_eq!(keypair.public_key, g_pow_p(&ElementModQ::two()));

        let ciphertext = elgamal_encrypt(0, &ElementModQ::one(), &keypair.public_key).unwrap();
        assert_eq!(ciphertext.pad, ElementModP::generator());
        assert_eq!(ciphertext.data, g_pow_p(&ElementModQ::two()));

        let dlog = DiscreteLog::new();
        assert_eq!(ciphertext.decrypt(&keypair.secret_key, &dlog).unwrap(), 0);
    }

    #[test]
    fn test_encrypt_decrypt() {
        let keypair = ElGamalKeyPair::from_secret(&ElementModQ::from(7331)).unwrap();
        let nonces = Nonces::new(&ElementModQ::from(1));
        let dlog = DiscreteLog::new();

        for m in (0..1000u64).step_by(37) {
            let nonce = nonces.get(m);
            let ciphertext = elgamal_encrypt(m, &nonce, &keypair.public_key).unwrap();
            assert!(ciphertext.is_valid_residue());
            assert_eq!(ciphertext.decrypt(&keypair.secret_key, &dlog).unwrap(), m);
            assert_eq!(
                ciphertext
                    .decrypt_known_nonce(&keypair.public_key, &nonce, &dlog)
                    .unwrap(),
                m
            );
            let product = ciphertext.partial_decrypt(&keypair.secret_key);
            assert_eq!(ciphertext.decrypt_known_product(&product, &dlog).unwrap(), m);
        }
    }

    #[test]
    fn test_invalid_encryption() {
        let keypair = ElGamalKeyPair::from_secret(&ElementModQ::from(5)).unwrap();
        assert!(matches!(
            elgamal_encrypt(1, &ElementModQ::zero(), &keypair.public_key),
            Err(Error::InvalidEncryption)
        ));
        assert!(matches!(
            elgamal_encrypt(1, &ElementModQ::one(), &int_to_p_unchecked(&*P - 1u32)),
            Err(Error::InvalidEncryption)
        ));
    }

    #[test]
    fn test_homomorphic_add() {
        let keypair = ElGamalKeyPair::from_secret(&ElementModQ::from(99)).unwrap();
        let dlog = DiscreteLog::new();

        let c1 = elgamal_encrypt(3, &ElementModQ::from(11), &keypair.public_key).unwrap();
        let c2 = elgamal_encrypt(4, &ElementModQ::from(12), &keypair.public_key).unwrap();
        let sum = elgamal_add(&[&c1, &c2]);
        assert_eq!(sum.decrypt(&keypair.secret_key, &dlog).unwrap(), 7);

        // The sum is an encryption under the summed nonce
        assert_eq!(
            sum,
            elgamal_encrypt(7, &ElementModQ::from(23), &keypair.public_key).unwrap()
        );

        let empty = elgamal_add(&[]);
        assert_eq!(empty.decrypt(&keypair.secret_key, &dlog).unwrap(), 0);
    }

    #[test]
    fn test_ciphertext_hash() {
        let keypair = ElGamalKeyPair::from_secret(&ElementModQ::from(99)).unwrap();
        let c1 = elgamal_encrypt(1, &ElementModQ::from(11), &keypair.public_key).unwrap();
        let c2 = elgamal_encrypt(1, &ElementModQ::from(12), &keypair.public_key).unwrap();
        assert_eq!(c1.crypto_hash(), c1.clone().crypto_hash());
        assert_ne!(c1.crypto_hash(), c2.crypto_hash());
        assert_eq!(
            c1.crypto_hash(),
            hash_elems(&[(&c1.pad).into(), (&c1.data).into()])
        );
    }
}
