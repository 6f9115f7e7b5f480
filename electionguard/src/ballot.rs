use crate::*;
use log::warn;

/// Write-in text attached to a selection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExtendedData {
    pub value: String,
    pub length: u64,
}

/// A voter's choice for a single selection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaintextBallotSelection {
    pub object_id: String,
    pub sequence_order: u64,
    pub vote: u64,
    #[serde(default)]
    pub is_placeholder_selection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_data: Option<ExtendedData>,
}

impl PlaintextBallotSelection {
    /// A selection is valid if it belongs to `expected_object_id` and its vote is 0 or 1.
    pub fn is_valid(&self, expected_object_id: &str) -> bool {
        if self.object_id != expected_object_id {
            warn!(
                "selection {} does not match expected selection {}",
                self.object_id, expected_object_id
            );
            return false;
        }
        if self.vote > 1 {
            warn!("selection {} has invalid vote {}", self.object_id, self.vote);
            return false;
        }
        true
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaintextBallotContest {
    pub object_id: String,
    pub sequence_order: u64,
    pub ballot_selections: Vec<PlaintextBallotSelection>,
}

impl PlaintextBallotContest {
    /// Total of all votes in the contest.
    pub fn selection_count(&self) -> u64 {
        self.ballot_selections.iter().map(|s| s.vote).sum()
    }

    pub fn is_overvoted(&self, description: &ContestDescription) -> bool {
        self.selection_count() > description.number_elected
    }

    /// Check the contest against its description: matching id, known selections, 0/1 votes
    /// and no overvote.
    pub fn is_valid(&self, description: &ContestDescription) -> bool {
        if self.object_id != description.object_id {
            warn!(
                "contest {} does not match expected contest {}",
                self.object_id, description.object_id
            );
            return false;
        }

        if self.ballot_selections.len() > description.ballot_selections.len() {
            warn!(
                "contest {} has {} selections but only {} are described",
                self.object_id,
                self.ballot_selections.len(),
                description.ballot_selections.len()
            );
            return false;
        }

        for selection in &self.ballot_selections {
            let known = description
                .ballot_selections
                .iter()
                .any(|d| d.object_id == selection.object_id);
            if !known {
                warn!(
                    "contest {} has unknown selection {}",
                    self.object_id, selection.object_id
                );
                return false;
            }
            if !selection.is_valid(&selection.object_id) {
                return false;
            }
        }

        if self.is_overvoted(description) {
            warn!(
                "contest {} is overvoted: {} votes for {} seats",
                self.object_id,
                self.selection_count(),
                description.number_elected
            );
            return false;
        }
        true
    }
}

/// A voter's choices, as handed to `encrypt_ballot`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaintextBallot {
    pub object_id: String,
    pub style_id: String,
    pub contests: Vec<PlaintextBallotContest>,
}

/// An encrypted selection with its zero-or-one proof.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CiphertextBallotSelection {
    pub object_id: String,

    #[serde(with = "hex_u64")]
    pub sequence_order: u64,

    /// Hash of the `SelectionDescription` this selection encrypts
    pub description_hash: ElementModQ,

    pub ciphertext: ElGamalCiphertext,

    pub crypto_hash: ElementModQ,

    #[serde(with = "hex_bool")]
    pub is_placeholder_selection: bool,

    /// The encryption nonce. Sensitive, and removed before a ballot is published.
    pub nonce: Option<ElementModQ>,

    pub proof: DisjunctiveChaumPedersenProof,

    pub extended_data: Option<ElGamalCiphertext>,
}

fn selection_hash(object_id: &str, seed_hash: &ElementModQ, ciphertext: &ElGamalCiphertext) -> ElementModQ {
    hash_elems(&[
        object_id.into(),
        seed_hash.into(),
        ciphertext.crypto_hash().into(),
    ])
}

impl CryptoHashCheckable for CiphertextBallotSelection {
    fn crypto_hash_with(&self, seed_hash: &ElementModQ) -> ElementModQ {
        selection_hash(&self.object_id, seed_hash, &self.ciphertext)
    }
}

impl CiphertextBallotSelection {
    /// Verify the selection's hash and proof against its description hash.
    pub fn is_valid_encryption(
        &self,
        seed_hash: &ElementModQ,
        public_key: &ElementModP,
        extended_base_hash: &ElementModQ,
    ) -> bool {
        if seed_hash != &self.description_hash {
            warn!(
                "selection {} has mismatching description hash: expected {} got {}",
                self.object_id, seed_hash, self.description_hash
            );
            return false;
        }

        let recalculated = self.crypto_hash_with(seed_hash);
        if recalculated != self.crypto_hash {
            warn!(
                "selection {} has mismatching crypto hash: expected {} got {}",
                self.object_id, recalculated, self.crypto_hash
            );
            return false;
        }

        self.proof
            .is_valid(&self.ciphertext, public_key, extended_base_hash)
    }
}

/// Encrypt-side constructor: hashes the ciphertext and proves it encrypts `plaintext`.
#[allow(clippy::too_many_arguments)]
pub fn make_ciphertext_ballot_selection(
    object_id: &str,
    sequence_order: u64,
    description_hash: &ElementModQ,
    ciphertext: ElGamalCiphertext,
    public_key: &ElementModP,
    extended_base_hash: &ElementModQ,
    proof_seed: &ElementModQ,
    plaintext: u64,
    is_placeholder_selection: bool,
    nonce: &ElementModQ,
) -> Result<CiphertextBallotSelection, Error> {
    let crypto_hash = selection_hash(object_id, description_hash, &ciphertext);
    let proof = make_disjunctive_chaum_pedersen(
        &ciphertext,
        nonce,
        public_key,
        extended_base_hash,
        proof_seed,
        plaintext,
    )?;

    Ok(CiphertextBallotSelection {
        object_id: object_id.to_owned(),
        sequence_order,
        description_hash: description_hash.clone(),
        ciphertext,
        crypto_hash,
        is_placeholder_selection,
        nonce: Some(nonce.clone()),
        proof,
        extended_data: None,
    })
}

/// An encrypted contest with its selection-limit proof.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CiphertextBallotContest {
    pub object_id: String,

    #[serde(with = "hex_u64")]
    pub sequence_order: u64,

    pub description_hash: ElementModQ,

    /// Real selections followed by placeholders
    pub ballot_selections: Vec<CiphertextBallotSelection>,

    /// Homomorphic sum of every selection ciphertext
    pub ciphertext_accumulation: ElGamalCiphertext,

    pub crypto_hash: ElementModQ,

    pub nonce: Option<ElementModQ>,

    pub proof: ConstantChaumPedersenProof,
}

fn contest_hash(
    object_id: &str,
    seed_hash: &ElementModQ,
    selections: &[CiphertextBallotSelection],
) -> ElementModQ {
    let mut sorted: Vec<&CiphertextBallotSelection> = selections.iter().collect();
    sorted.sort_by_key(|s| s.sequence_order);

    let mut elems: Vec<Hashable> = Vec::with_capacity(sorted.len() + 2);
    elems.push(object_id.into());
    elems.push(seed_hash.into());
    elems.extend(sorted.into_iter().map(|s| Hashable::from(&s.crypto_hash)));
    hash_elems(&elems)
}

fn accumulate(selections: &[CiphertextBallotSelection]) -> ElGamalCiphertext {
    let ciphertexts: Vec<&ElGamalCiphertext> = selections.iter().map(|s| &s.ciphertext).collect();
    elgamal_add(&ciphertexts)
}

impl CryptoHashCheckable for CiphertextBallotContest {
    fn crypto_hash_with(&self, seed_hash: &ElementModQ) -> ElementModQ {
        contest_hash(&self.object_id, seed_hash, &self.ballot_selections)
    }
}

impl CiphertextBallotContest {
    /// Verify the contest's hash, accumulation and proof. Selections are not checked here.
    pub fn is_valid_encryption(
        &self,
        seed_hash: &ElementModQ,
        public_key: &ElementModP,
        extended_base_hash: &ElementModQ,
    ) -> bool {
        if seed_hash != &self.description_hash {
            warn!(
                "contest {} has mismatching description hash: expected {} got {}",
                self.object_id, seed_hash, self.description_hash
            );
            return false;
        }

        let recalculated = self.crypto_hash_with(seed_hash);
        if recalculated != self.crypto_hash {
            warn!(
                "contest {} has mismatching crypto hash: expected {} got {}",
                self.object_id, recalculated, self.crypto_hash
            );
            return false;
        }

        let accumulation = accumulate(&self.ballot_selections);
        if accumulation != self.ciphertext_accumulation {
            warn!("contest {} has mismatching accumulation", self.object_id);
            return false;
        }

        self.proof
            .is_valid(&accumulation, public_key, extended_base_hash)
    }

    /// Check the contest's shape against its manifest description.
    ///
    /// The constant-sum proof must claim `number_elected`, and the selections must be exactly the
    /// description's selections plus its placeholders, each bound to its own description hash.
    /// `description` must come from an `InternalManifest` so its placeholders are filled in.
    pub fn is_valid_for_description(&self, description: &ContestDescription) -> bool {
        if self.object_id != description.object_id
            || self.sequence_order != description.sequence_order
        {
            warn!(
                "contest {} does not match description {}",
                self.object_id, description.object_id
            );
            return false;
        }

        let description_hash = description.crypto_hash();
        if description_hash != self.description_hash {
            warn!(
                "contest {} has mismatching description hash: expected {} got {}",
                self.object_id, description_hash, self.description_hash
            );
            return false;
        }

        if self.proof.constant != description.number_elected {
            warn!(
                "contest {} proves a sum of {} but elects {}",
                self.object_id, self.proof.constant, description.number_elected
            );
            return false;
        }

        let mut expected: Vec<&str> = description
            .ballot_selections
            .iter()
            .chain(description.placeholder_selections.iter())
            .map(|s| s.object_id.as_str())
            .collect();
        let mut found: Vec<&str> = self
            .ballot_selections
            .iter()
            .map(|s| s.object_id.as_str())
            .collect();
        expected.sort_unstable();
        found.sort_unstable();
        if expected != found {
            warn!(
                "contest {} has selections {:?} but its description has {:?}",
                self.object_id, found, expected
            );
            return false;
        }

        for selection in &self.ballot_selections {
            let selection_description = match description.selection_for(&selection.object_id) {
                Some(d) => d,
                None => return false,
            };
            if selection.description_hash != selection_description.crypto_hash()
                || selection.sequence_order != selection_description.sequence_order
                || selection.is_placeholder_selection != description.is_placeholder(selection_description)
            {
                warn!(
                    "selection {} in contest {} does not match its description",
                    selection.object_id, self.object_id
                );
                return false;
            }
        }
        true
    }
}

/// Encrypt-side constructor: accumulates the selections and proves they sum to `number_elected`.
///
/// Every selection must still carry its nonce.
#[allow(clippy::too_many_arguments)]
pub fn make_ciphertext_ballot_contest(
    object_id: &str,
    sequence_order: u64,
    description_hash: &ElementModQ,
    ballot_selections: Vec<CiphertextBallotSelection>,
    public_key: &ElementModP,
    extended_base_hash: &ElementModQ,
    proof_seed: &ElementModQ,
    number_elected: u64,
    nonce: &ElementModQ,
) -> Result<CiphertextBallotContest, Error> {
    let crypto_hash = contest_hash(object_id, description_hash, &ballot_selections);

    let nonces = ballot_selections
        .iter()
        .map(|s| s.nonce.as_ref())
        .collect::<Option<Vec<&ElementModQ>>>()
        .ok_or(Error::MissingValue("selection nonce"))?;
    let aggregate_nonce = add_q(&nonces);
    let accumulation = accumulate(&ballot_selections);

    let proof = make_constant_chaum_pedersen(
        &accumulation,
        number_elected,
        &aggregate_nonce,
        public_key,
        proof_seed,
        extended_base_hash,
    );

    Ok(CiphertextBallotContest {
        object_id: object_id.to_owned(),
        sequence_order,
        description_hash: description_hash.clone(),
        ballot_selections,
        ciphertext_accumulation: accumulation,
        crypto_hash,
        nonce: Some(nonce.clone()),
        proof,
    })
}

/// An encrypted ballot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CiphertextBallot {
    pub object_id: String,
    pub style_id: String,
    pub manifest_hash: ElementModQ,

    /// Seed of the ballot code, usually the previous ballot's code on the same device
    pub code_seed: ElementModQ,

    pub contests: Vec<CiphertextBallotContest>,

    /// Tracking code, `hash(code_seed, timestamp, crypto_hash)`
    pub code: ElementModQ,

    /// Seconds since the epoch
    pub timestamp: u64,

    pub crypto_hash: ElementModQ,

    /// The ballot nonce every other nonce was derived from
    pub nonce: Option<ElementModQ>,
}

fn ballot_hash(
    object_id: &str,
    seed_hash: &ElementModQ,
    contests: &[CiphertextBallotContest],
) -> ElementModQ {
    let mut sorted: Vec<&CiphertextBallotContest> = contests.iter().collect();
    sorted.sort_by_key(|c| c.sequence_order);

    let mut elems: Vec<Hashable> = Vec::with_capacity(sorted.len() + 2);
    elems.push(object_id.into());
    elems.push(seed_hash.into());
    elems.extend(sorted.into_iter().map(|c| Hashable::from(&c.crypto_hash)));
    hash_elems(&elems)
}

/// The ballot tracking code.
pub fn get_ballot_code(
    code_seed: &ElementModQ,
    timestamp: u64,
    crypto_hash: &ElementModQ,
) -> ElementModQ {
    hash_elems(&[code_seed.into(), timestamp.into(), crypto_hash.into()])
}

impl CryptoHashCheckable for CiphertextBallot {
    fn crypto_hash_with(&self, seed_hash: &ElementModQ) -> ElementModQ {
        ballot_hash(&self.object_id, seed_hash, &self.contests)
    }
}

impl CiphertextBallot {
    /// Verify every hash and proof in the ballot.
    pub fn is_valid_encryption(
        &self,
        manifest_hash: &ElementModQ,
        public_key: &ElementModP,
        extended_base_hash: &ElementModQ,
    ) -> bool {
        if manifest_hash != &self.manifest_hash {
            warn!(
                "ballot {} has mismatching manifest hash: expected {} got {}",
                self.object_id, manifest_hash, self.manifest_hash
            );
            return false;
        }

        let recalculated = self.crypto_hash_with(manifest_hash);
        if recalculated != self.crypto_hash {
            warn!(
                "ballot {} has mismatching crypto hash: expected {} got {}",
                self.object_id, recalculated, self.crypto_hash
            );
            return false;
        }

        for contest in &self.contests {
            for selection in &contest.ballot_selections {
                if !selection.is_valid_encryption(
                    &selection.description_hash,
                    public_key,
                    extended_base_hash,
                ) {
                    return false;
                }
            }
            if !contest.is_valid_encryption(&contest.description_hash, public_key, extended_base_hash)
            {
                return false;
            }
        }
        true
    }

    /// Verify the ballot against the manifest it claims to encrypt, then every hash and proof.
    ///
    /// The ballot must carry exactly the contests of its style, and each contest must match its
    /// description (see `CiphertextBallotContest::is_valid_for_description`).
    pub fn is_valid_for_manifest(
        &self,
        manifest: &InternalManifest,
        public_key: &ElementModP,
        extended_base_hash: &ElementModQ,
    ) -> bool {
        if manifest.get_ballot_style(&self.style_id).is_none() {
            warn!(
                "ballot {} has unknown ballot style {}",
                self.object_id, self.style_id
            );
            return false;
        }

        let mut expected: Vec<&str> = manifest
            .get_contests_for(&self.style_id)
            .into_iter()
            .map(|c| c.object_id.as_str())
            .collect();
        let mut found: Vec<&str> = self.contests.iter().map(|c| c.object_id.as_str()).collect();
        expected.sort_unstable();
        found.sort_unstable();
        if expected != found {
            warn!(
                "ballot {} has contests {:?} but style {} has {:?}",
                self.object_id, found, self.style_id, expected
            );
            return false;
        }

        for contest in &self.contests {
            let valid = manifest
                .contest_for(&contest.object_id)
                .map_or(false, |description| contest.is_valid_for_description(description));
            if !valid {
                return false;
            }
        }

        self.is_valid_encryption(&manifest.manifest_hash, public_key, extended_base_hash)
    }

    /// A copy of the ballot with every nonce removed, suitable for publishing.
    pub fn without_nonces(&self) -> CiphertextBallot {
        let mut ballot = self.clone();
        ballot.nonce = None;
        for contest in &mut ballot.contests {
            contest.nonce = None;
            for selection in &mut contest.ballot_selections {
                selection.nonce = None;
            }
        }
        ballot
    }
}

pub fn make_ciphertext_ballot(
    object_id: &str,
    style_id: &str,
    manifest_hash: &ElementModQ,
    code_seed: &ElementModQ,
    contests: Vec<CiphertextBallotContest>,
    nonce: Option<&ElementModQ>,
    timestamp: u64,
) -> CiphertextBallot {
    let crypto_hash = ballot_hash(object_id, manifest_hash, &contests);
    let code = get_ballot_code(code_seed, timestamp, &crypto_hash);

    CiphertextBallot {
        object_id: object_id.to_owned(),
        style_id: style_id.to_owned(),
        manifest_hash: manifest_hash.clone(),
        code_seed: code_seed.clone(),
        contests,
        code,
        timestamp,
        crypto_hash,
        nonce: nonce.cloned(),
    }
}

/// What a voter takes home: the ballot nonce and the ballot hash recomputed under it.
///
/// Both values are decimal strings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BallotReceipt {
    pub seed: String,
    pub hash: String,
}

impl BallotReceipt {
    pub fn new(ballot: &CiphertextBallot) -> Result<Self, Error> {
        let seed = ballot.nonce.as_ref().ok_or(Error::MissingValue("ballot nonce"))?;
        let hash = ballot.crypto_hash_with(seed);

        Ok(BallotReceipt {
            seed: seed.as_int().to_str_radix(10),
            hash: hash.as_int().to_str_radix(10),
        })
    }
}
