//! Non-interactive Chaum-Pedersen proofs, made non-interactive with `hash_elems` challenges.
//!
//! Every proof draws its randomness from a `Nonces` sequence keyed by a proof-specific header,
//! so proofs are as reproducible as the encryptions they accompany.

use crate::*;
use log::warn;

/// What a proof is being used to demonstrate.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofUsage {
    #[serde(rename = "Unknown")]
    Unknown,

    #[serde(rename = "Prove knowledge of secret value")]
    SecretValue,

    #[serde(rename = "Prove value within selection's limit")]
    SelectionLimit,

    #[serde(rename = "Prove selection's value (0 or 1)")]
    SelectionValue,
}

const DISJUNCTIVE_HEADER: &str = "disjoint-chaum-pedersen-proof";
const CONSTANT_HEADER: &str = "constant-chaum-pedersen-proof";
const GENERIC_HEADER: &str = "generic-chaum-pedersen-proof";

/// Upper bound on the constant a `ConstantChaumPedersenProof` may claim.
pub const MAX_PROOF_CONSTANT: u64 = 1_000_000_000;

/// Proof that a ciphertext encrypts either zero or one, without revealing which.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DisjunctiveChaumPedersenProof {
    pub proof_zero_pad: ElementModP,
    pub proof_zero_data: ElementModP,
    pub proof_one_pad: ElementModP,
    pub proof_one_data: ElementModP,
    pub proof_zero_challenge: ElementModQ,
    pub proof_one_challenge: ElementModQ,
    pub challenge: ElementModQ,
    pub proof_zero_response: ElementModQ,
    pub proof_one_response: ElementModQ,
    pub usage: ProofUsage,
}

impl DisjunctiveChaumPedersenProof {
    /// Verify the proof against `message`, encrypted under `public_key`, with `hash_header`
    /// as the challenge's domain separator.
    pub fn is_valid(
        &self,
        message: &ElGamalCiphertext,
        public_key: &ElementModP,
        hash_header: &ElementModQ,
    ) -> bool {
        let alpha = &message.pad;
        let beta = &message.data;
        let a0 = &self.proof_zero_pad;
        let b0 = &self.proof_zero_data;
        let a1 = &self.proof_one_pad;
        let b1 = &self.proof_one_data;
        let c0 = &self.proof_zero_challenge;
        let c1 = &self.proof_one_challenge;
        let c = &self.challenge;
        let v0 = &self.proof_zero_response;
        let v1 = &self.proof_one_response;

        let residues = [alpha, beta, a0, b0, a1, b1]
            .iter()
            .all(|e| e.is_valid_residue());
        let in_bounds = [c0, c1, v0, v1].iter().all(|e| e.is_in_bounds());

        let consistent_c = &add_q(&[c0, c1]) == c
            && c == &hash_elems(&[
                hash_header.into(),
                alpha.into(),
                beta.into(),
                a0.into(),
                b0.into(),
                a1.into(),
                b1.into(),
            ]);

        let consistent_gv0 = g_pow_p(v0) == mult_p(&[a0, &pow_p(alpha, c0)]);
        let consistent_gv1 = g_pow_p(v1) == mult_p(&[a1, &pow_p(alpha, c1)]);
        let consistent_kv0 = pow_p(public_key, v0) == mult_p(&[b0, &pow_p(beta, c0)]);
        let consistent_gc1kv1 = mult_p(&[&g_pow_p(c1), &pow_p(public_key, v1)])
            == mult_p(&[b1, &pow_p(beta, c1)]);

        let success = residues
            && in_bounds
            && consistent_c
            && consistent_gv0
            && consistent_gv1
            && consistent_kv0
            && consistent_gc1kv1;

        if !success {
            warn!(
                "found an invalid disjunctive Chaum-Pedersen proof: residues={} in_bounds={} \
                 consistent_c={} consistent_gv0={} consistent_gv1={} consistent_kv0={} \
                 consistent_gc1kv1={}",
                residues,
                in_bounds,
                consistent_c,
                consistent_gv0,
                consistent_gv1,
                consistent_kv0,
                consistent_gc1kv1
            );
        }
        success
    }
}

/// Produce a disjunctive proof that `message` encrypts `plaintext`, which must be 0 or 1.
///
/// `r` is the nonce `message` was encrypted with and `seed` keys the proof's own randomness.
pub fn make_disjunctive_chaum_pedersen(
    message: &ElGamalCiphertext,
    r: &ElementModQ,
    public_key: &ElementModP,
    hash_header: &ElementModQ,
    seed: &ElementModQ,
    plaintext: u64,
) -> Result<DisjunctiveChaumPedersenProof, Error> {
    match plaintext {
        0 => Ok(make_disjunctive_chaum_pedersen_zero(
            message,
            r,
            public_key,
            hash_header,
            seed,
        )),
        1 => Ok(make_disjunctive_chaum_pedersen_one(
            message,
            r,
            public_key,
            hash_header,
            seed,
        )),
        other => Err(Error::InvalidPlaintext(format!(
            "disjunctive proofs only support 0 or 1, got {}",
            other
        ))),
    }
}

fn disjunctive_challenge(
    hash_header: &ElementModQ,
    message: &ElGamalCiphertext,
    commitments: [&ElementModP; 4],
) -> ElementModQ {
    hash_elems(&[
        hash_header.into(),
        (&message.pad).into(),
        (&message.data).into(),
        commitments[0].into(),
        commitments[1].into(),
        commitments[2].into(),
        commitments[3].into(),
    ])
}

/// Disjunctive proof for an encryption of zero: the zero branch is real, the one branch simulated.
pub fn make_disjunctive_chaum_pedersen_zero(
    message: &ElGamalCiphertext,
    r: &ElementModQ,
    public_key: &ElementModP,
    hash_header: &ElementModQ,
    seed: &ElementModQ,
) -> DisjunctiveChaumPedersenProof {
    let alpha = &message.pad;
    let beta = &message.data;

    let nonces = Nonces::with_headers(seed, &[DISJUNCTIVE_HEADER.into()]);
    let c1 = nonces.get(0);
    let v1 = nonces.get(1);
    let u0 = nonces.get(2);

    let a0 = g_pow_p(&u0);
    let b0 = pow_p(public_key, &u0);
    let neg_c1 = negate_q(&c1);
    let a1 = mult_p(&[&g_pow_p(&v1), &pow_p(alpha, &neg_c1)]);
    let b1 = mult_p(&[&pow_p(public_key, &v1), &g_pow_p(&c1), &pow_p(beta, &neg_c1)]);

    let c = disjunctive_challenge(hash_header, message, [&a0, &b0, &a1, &b1]);
    let c0 = a_minus_b_q(&c, &c1);
    let v0 = a_plus_bc_q(&u0, &c0, r);

    DisjunctiveChaumPedersenProof {
        proof_zero_pad: a0,
        proof_zero_data: b0,
        proof_one_pad: a1,
        proof_one_data: b1,
        proof_zero_challenge: c0,
        proof_one_challenge: c1,
        challenge: c,
        proof_zero_response: v0,
        proof_one_response: v1,
        usage: ProofUsage::SelectionValue,
    }
}

/// Disjunctive proof for an encryption of one: the one branch is real, the zero branch simulated.
pub fn make_disjunctive_chaum_pedersen_one(
    message: &ElGamalCiphertext,
    r: &ElementModQ,
    public_key: &ElementModP,
    hash_header: &ElementModQ,
    seed: &ElementModQ,
) -> DisjunctiveChaumPedersenProof {
    let alpha = &message.pad;
    let beta = &message.data;

    let nonces = Nonces::with_headers(seed, &[DISJUNCTIVE_HEADER.into()]);
    let c0 = nonces.get(0);
    let v0 = nonces.get(1);
    let u1 = nonces.get(2);

    let neg_c0 = negate_q(&c0);
    let a0 = mult_p(&[&g_pow_p(&v0), &pow_p(alpha, &neg_c0)]);
    let b0 = mult_p(&[&pow_p(public_key, &v0), &pow_p(beta, &neg_c0)]);
    let a1 = g_pow_p(&u1);
    let b1 = pow_p(public_key, &u1);

    let c = disjunctive_challenge(hash_header, message, [&a0, &b0, &a1, &b1]);
    let c1 = a_minus_b_q(&c, &c0);
    let v1 = a_plus_bc_q(&u1, &c1, r);

    DisjunctiveChaumPedersenProof {
        proof_zero_pad: a0,
        proof_zero_data: b0,
        proof_one_pad: a1,
        proof_one_data: b1,
        proof_zero_challenge: c0,
        proof_one_challenge: c1,
        challenge: c,
        proof_zero_response: v0,
        proof_one_response: v1,
        usage: ProofUsage::SelectionValue,
    }
}

/// Proof that a ciphertext encrypts a publicly known constant.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConstantChaumPedersenProof {
    pub pad: ElementModP,
    pub data: ElementModP,
    pub challenge: ElementModQ,
    pub response: ElementModQ,
    #[serde(with = "hex_u64")]
    pub constant: u64,
    pub usage: ProofUsage,
}

impl ConstantChaumPedersenProof {
    pub fn is_valid(
        &self,
        message: &ElGamalCiphertext,
        public_key: &ElementModP,
        hash_header: &ElementModQ,
    ) -> bool {
        let alpha = &message.pad;
        let beta = &message.data;
        let a = &self.pad;
        let b = &self.data;
        let c = &self.challenge;
        let v = &self.response;

        let residues = [alpha, beta, a, b].iter().all(|e| e.is_valid_residue());
        let in_bounds = c.is_in_bounds() && v.is_in_bounds();
        let constant_in_bounds = self.constant < MAX_PROOF_CONSTANT;

        let consistent_c = c
            == &hash_elems(&[
                hash_header.into(),
                alpha.into(),
                beta.into(),
                a.into(),
                b.into(),
            ]);
        let consistent_gv = g_pow_p(v) == mult_p(&[a, &pow_p(alpha, c)]);
        let c_times_constant = mult_q(&[c, &ElementModQ::from(self.constant)]);
        let consistent_kv = constant_in_bounds
            && mult_p(&[&g_pow_p(&c_times_constant), &pow_p(public_key, v)])
                == mult_p(&[b, &pow_p(beta, c)]);

        let success =
            residues && in_bounds && constant_in_bounds && consistent_c && consistent_gv && consistent_kv;

        if !success {
            warn!(
                "found an invalid constant Chaum-Pedersen proof: residues={} in_bounds={} \
                 constant_in_bounds={} consistent_c={} consistent_gv={} consistent_kv={}",
                residues, in_bounds, constant_in_bounds, consistent_c, consistent_gv, consistent_kv
            );
        }
        success
    }
}

/// Produce a proof that `message`, encrypted with nonce `r`, encrypts `constant`.
pub fn make_constant_chaum_pedersen(
    message: &ElGamalCiphertext,
    constant: u64,
    r: &ElementModQ,
    public_key: &ElementModP,
    seed: &ElementModQ,
    hash_header: &ElementModQ,
) -> ConstantChaumPedersenProof {
    let alpha = &message.pad;
    let beta = &message.data;

    let u = Nonces::with_headers(seed, &[CONSTANT_HEADER.into()]).get(0);
    let a = g_pow_p(&u);
    let b = pow_p(public_key, &u);
    let c = hash_elems(&[
        hash_header.into(),
        alpha.into(),
        beta.into(),
        (&a).into(),
        (&b).into(),
    ]);
    let v = a_plus_bc_q(&u, &c, r);

    ConstantChaumPedersenProof {
        pad: a,
        data: b,
        challenge: c,
        response: v,
        constant,
        usage: ProofUsage::SelectionLimit,
    }
}

/// Proof of knowledge of `x` such that `gx = g^x` and `hx = h^x`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChaumPedersenProofGeneric {
    pub a: ElementModP,
    pub b: ElementModP,
    pub c: ElementModQ,
    pub r: ElementModQ,
}

impl ChaumPedersenProofGeneric {
    /// Verify the proof. With `check_c` false the challenge is not recomputed, which is
    /// only appropriate for proofs produced by `make_fake_chaum_pedersen_generic`.
    pub fn is_valid(
        &self,
        g: &ElementModP,
        gx: &ElementModP,
        h: &ElementModP,
        hx: &ElementModP,
        base_hash: &ElementModQ,
        check_c: bool,
    ) -> bool {
        let residues = [g, gx, h, hx, &self.a, &self.b]
            .iter()
            .all(|e| e.is_valid_residue());
        let in_bounds = self.c.is_in_bounds() && self.r.is_in_bounds();

        let consistent_c = !check_c
            || self.c == hash_elems(&[base_hash.into(), (&self.a).into(), (&self.b).into()]);
        let consistent_gx = pow_p(g, &self.r) == mult_p(&[&self.a, &pow_p(gx, &self.c)]);
        let consistent_hx = pow_p(h, &self.r) == mult_p(&[&self.b, &pow_p(hx, &self.c)]);

        let success = residues && in_bounds && consistent_c && consistent_gx && consistent_hx;
        if !success {
            warn!(
                "found an invalid generic Chaum-Pedersen proof: residues={} in_bounds={} \
                 consistent_c={} consistent_gx={} consistent_hx={}",
                residues, in_bounds, consistent_c, consistent_gx, consistent_hx
            );
        }
        success
    }
}

/// Produce a generic proof that `g^x` and `h^x` share the exponent `x`.
pub fn make_chaum_pedersen_generic(
    g: &ElementModP,
    h: &ElementModP,
    x: &ElementModQ,
    seed: &ElementModQ,
    hash_header: &ElementModQ,
) -> ChaumPedersenProofGeneric {
    let w = Nonces::with_headers(seed, &[GENERIC_HEADER.into()]).get(0);
    let a = pow_p(g, &w);
    let b = pow_p(h, &w);
    let c = hash_elems(&[hash_header.into(), (&a).into(), (&b).into()]);
    let r = a_plus_bc_q(&w, x, &c);

    ChaumPedersenProofGeneric { a, b, c, r }
}

/// Produce a proof for an arbitrary challenge `c` without knowing `x`.
///
/// The result verifies only when the challenge check is skipped, which makes it useful for
/// simulating transcripts and for testing that verifiers do check the challenge.
pub fn make_fake_chaum_pedersen_generic(
    g: &ElementModP,
    gx: &ElementModP,
    h: &ElementModP,
    hx: &ElementModP,
    c: &ElementModQ,
    seed: &ElementModQ,
) -> Result<ChaumPedersenProofGeneric, Error> {
    let r = Nonces::with_headers(seed, &[GENERIC_HEADER.into()]).get(0);
    let a = div_p(&pow_p(g, &r), &pow_p(gx, c))?;
    let b = div_p(&pow_p(h, &r), &pow_p(hx, c))?;

    Ok(ChaumPedersenProofGeneric {
        a,
        b,
        c: c.clone(),
        r,
    })
}

/// Proof that a ciphertext decrypts to a claimed plaintext under a public key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChaumPedersenDecryptionProof {
    pub proof: ChaumPedersenProofGeneric,
}

impl ChaumPedersenDecryptionProof {
    pub fn is_valid(
        &self,
        plaintext: u64,
        ciphertext: &ElGamalCiphertext,
        public_key: &ElementModP,
        base_hash: &ElementModQ,
    ) -> bool {
        let g_m = g_pow_p(&ElementModQ::from(plaintext));
        let hx = match div_p(&ciphertext.data, &g_m) {
            Ok(hx) => hx,
            Err(_) => return false,
        };

        self.proof.is_valid(
            &ElementModP::generator(),
            public_key,
            &ciphertext.pad,
            &hx,
            base_hash,
            true,
        )
    }
}

/// Prove that `ciphertext` decrypts under `secret_key` without revealing the key.
pub fn make_chaum_pedersen_decryption_proof(
    ciphertext: &ElGamalCiphertext,
    secret_key: &ElementModQ,
    seed: &ElementModQ,
    base_hash: &ElementModQ,
) -> ChaumPedersenDecryptionProof {
    ChaumPedersenDecryptionProof {
        proof: make_chaum_pedersen_generic(
            &ElementModP::generator(),
            &ciphertext.pad,
            secret_key,
            seed,
            base_hash,
        ),
    }
}
