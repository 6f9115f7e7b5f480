use crate::*;

/// The public cryptographic context of an election.
///
/// Every proof on every ballot is bound to `crypto_extended_base_hash`, so ballots encrypted
/// under one context never verify under another.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CiphertextElectionContext {
    /// Number of guardians holding a share of the election key
    pub number_of_guardians: u64,

    /// Minimum number of guardians needed to decrypt
    pub quorum: u64,

    /// The joint election public key
    pub elgamal_public_key: ElementModP,

    /// Hash of the guardians' key commitments
    pub commitment_hash: ElementModQ,

    pub manifest_hash: ElementModQ,

    /// Hash of the group parameters, guardian settings and manifest
    pub crypto_base_hash: ElementModQ,

    /// `crypto_base_hash` extended with the commitment hash
    pub crypto_extended_base_hash: ElementModQ,
}

impl CiphertextElectionContext {
    pub fn get_public_key(&self) -> &ElementModP {
        &self.elgamal_public_key
    }
}

/// Build the election context, deriving both base hashes.
pub fn make_ciphertext_election_context(
    number_of_guardians: u64,
    quorum: u64,
    elgamal_public_key: &ElementModP,
    commitment_hash: &ElementModQ,
    manifest_hash: &ElementModQ,
) -> CiphertextElectionContext {
    let crypto_base_hash = hash_elems(&[
        (&*P).into(),
        (&*Q).into(),
        (&*G).into(),
        number_of_guardians.into(),
        quorum.into(),
        manifest_hash.into(),
    ]);
    let crypto_extended_base_hash =
        hash_elems(&[(&crypto_base_hash).into(), commitment_hash.into()]);

    CiphertextElectionContext {
        number_of_guardians,
        quorum,
        elgamal_public_key: elgamal_public_key.clone(),
        commitment_hash: commitment_hash.clone(),
        manifest_hash: manifest_hash.clone(),
        crypto_base_hash,
        crypto_extended_base_hash,
    }
}
