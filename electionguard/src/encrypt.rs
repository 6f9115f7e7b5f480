//! Ballot encryption: selection, contest, then ballot.
//!
//! Every nonce is derived from the ballot nonce through `Nonces`, so an encrypted ballot can be
//! regenerated exactly from its plaintext, the manifest and the ballot nonce.

use crate::*;
use log::{debug, warn};

/// A plaintext selection for `description` with the given vote.
pub fn selection_from(
    description: &SelectionDescription,
    is_placeholder: bool,
    is_affirmative: bool,
) -> PlaintextBallotSelection {
    PlaintextBallotSelection {
        object_id: description.object_id.clone(),
        sequence_order: description.sequence_order,
        vote: if is_affirmative { 1 } else { 0 },
        is_placeholder_selection: is_placeholder,
        extended_data: None,
    }
}

/// A plaintext contest with no votes cast.
pub fn contest_from(description: &ContestDescription) -> PlaintextBallotContest {
    PlaintextBallotContest {
        object_id: description.object_id.clone(),
        sequence_order: description.sequence_order,
        ballot_selections: description
            .ballot_selections
            .iter()
            .map(|s| selection_from(s, false, false))
            .collect(),
    }
}

/// Encrypt one selection.
///
/// The nonce is drawn from a sequence keyed by the description hash and `nonce_seed`, at the
/// selection's sequence order. The proof is seeded by the next nonce in that sequence.
#[allow(clippy::too_many_arguments)]
pub fn encrypt_selection(
    selection: &PlaintextBallotSelection,
    description: &SelectionDescription,
    public_key: &ElementModP,
    extended_base_hash: &ElementModQ,
    nonce_seed: &ElementModQ,
    is_placeholder: bool,
    should_verify_proofs: bool,
) -> Result<CiphertextBallotSelection, Error> {
    if !selection.is_valid(&description.object_id) {
        return Err(Error::InvalidPlaintext(format!(
            "selection {} cannot be encrypted as {}",
            selection.object_id, description.object_id
        )));
    }

    let description_hash = description.crypto_hash();
    let nonce_sequence = Nonces::with_headers(&description_hash, &[nonce_seed.into()]);
    let selection_nonce = nonce_sequence.get(description.sequence_order);
    let proof_seed = nonce_sequence.next_after(description.sequence_order);

    let ciphertext = elgamal_encrypt(selection.vote, &selection_nonce, public_key)?;

    let encrypted = make_ciphertext_ballot_selection(
        &description.object_id,
        description.sequence_order,
        &description_hash,
        ciphertext,
        public_key,
        extended_base_hash,
        &proof_seed,
        selection.vote,
        is_placeholder,
        &selection_nonce,
    )?;

    if should_verify_proofs
        && !encrypted.is_valid_encryption(&description_hash, public_key, extended_base_hash)
    {
        warn!("selection {} failed verification", encrypted.object_id);
        return Err(Error::InvalidEncryption);
    }

    Ok(encrypted)
}

/// Encrypt one contest, padding it with placeholders so exactly `number_elected` selections are
/// made.
///
/// Selections the voter left out are encrypted as zero. Placeholders are selected one at a time
/// until the contest is full.
pub fn encrypt_contest(
    contest: &PlaintextBallotContest,
    description: &ContestDescription,
    public_key: &ElementModP,
    extended_base_hash: &ElementModQ,
    nonce_seed: &ElementModQ,
    should_verify_proofs: bool,
) -> Result<CiphertextBallotContest, Error> {
    if contest.is_overvoted(description) {
        warn!(
            "contest {} has {} votes for {} seats",
            contest.object_id,
            contest.selection_count(),
            description.number_elected
        );
        return Err(Error::Overvote(contest.object_id.clone()));
    }
    if !contest.is_valid(description) {
        return Err(Error::InvalidPlaintext(format!(
            "contest {} failed validation",
            contest.object_id
        )));
    }

    let description_hash = description.crypto_hash();
    let nonce_sequence = Nonces::with_headers(&description_hash, &[nonce_seed.into()]);
    let contest_nonce = nonce_sequence.get(description.sequence_order);
    let proof_seed = nonce_sequence.next_after(description.sequence_order);

    let mut encrypted_selections =
        Vec::with_capacity(description.ballot_selections.len() + description.placeholder_selections.len());
    let mut selection_count = 0;

    for selection_description in &description.ballot_selections {
        let voted = contest
            .ballot_selections
            .iter()
            .find(|s| s.object_id == selection_description.object_id);

        let encrypted = match voted {
            Some(selection) => {
                selection_count += selection.vote;
                encrypt_selection(
                    selection,
                    selection_description,
                    public_key,
                    extended_base_hash,
                    &contest_nonce,
                    false,
                    should_verify_proofs,
                )?
            }
            None => encrypt_selection(
                &selection_from(selection_description, false, false),
                selection_description,
                public_key,
                extended_base_hash,
                &contest_nonce,
                false,
                should_verify_proofs,
            )?,
        };
        encrypted_selections.push(encrypted);
    }

    for placeholder in &description.placeholder_selections {
        let select_placeholder = selection_count < description.number_elected;
        if select_placeholder {
            selection_count += 1;
        }

        encrypted_selections.push(encrypt_selection(
            &selection_from(placeholder, true, select_placeholder),
            placeholder,
            public_key,
            extended_base_hash,
            &contest_nonce,
            true,
            should_verify_proofs,
        )?);
    }

    let encrypted = make_ciphertext_ballot_contest(
        &description.object_id,
        description.sequence_order,
        &description_hash,
        encrypted_selections,
        public_key,
        extended_base_hash,
        &proof_seed,
        description.number_elected,
        &contest_nonce,
    )?;

    if should_verify_proofs
        && !encrypted.is_valid_encryption(&description_hash, public_key, extended_base_hash)
    {
        warn!("contest {} failed verification", encrypted.object_id);
        return Err(Error::InvalidEncryption);
    }

    debug!(
        "encrypted contest {} with {} selections",
        encrypted.object_id,
        encrypted.ballot_selections.len()
    );
    Ok(encrypted)
}

/// Encrypt every contest the ballot's style covers, in manifest order.
///
/// Contests missing from the ballot are encrypted as undervotes.
pub fn encrypt_ballot_contests(
    ballot: &PlaintextBallot,
    manifest: &InternalManifest,
    context: &CiphertextElectionContext,
    nonce_seed: &ElementModQ,
    should_verify_proofs: bool,
) -> Result<Vec<CiphertextBallotContest>, Error> {
    let mut encrypted_contests = vec![];

    for description in manifest.get_contests_for(&ballot.style_id) {
        let voted = ballot
            .contests
            .iter()
            .find(|c| c.object_id == description.object_id);

        let encrypted = match voted {
            Some(contest) => encrypt_contest(
                contest,
                description,
                &context.elgamal_public_key,
                &context.crypto_extended_base_hash,
                nonce_seed,
                should_verify_proofs,
            )?,
            None => encrypt_contest(
                &contest_from(description),
                description,
                &context.elgamal_public_key,
                &context.crypto_extended_base_hash,
                nonce_seed,
                should_verify_proofs,
            )?,
        };
        encrypted_contests.push(encrypted);
    }

    Ok(encrypted_contests)
}

/// Encrypt a ballot.
///
/// `encryption_seed` seeds the ballot code. When `nonce` is `None` a random ballot nonce is drawn,
/// and the ballot cannot be regenerated later. Any failure aborts the whole ballot.
#[allow(clippy::too_many_arguments)]
pub fn encrypt_ballot(
    ballot: &PlaintextBallot,
    manifest: &InternalManifest,
    context: &CiphertextElectionContext,
    encryption_seed: &ElementModQ,
    nonce: Option<&ElementModQ>,
    timestamp: u64,
    should_verify_proofs: bool,
) -> Result<CiphertextBallot, Error> {
    if manifest.get_ballot_style(&ballot.style_id).is_none() {
        return Err(Error::UnknownBallotStyle(ballot.style_id.clone()));
    }

    let random_nonce;
    let nonce = match nonce {
        Some(nonce) => nonce,
        None => {
            random_nonce = rand_q();
            &random_nonce
        }
    };

    let nonce_seed = hash_elems(&[
        (&manifest.manifest_hash).into(),
        (&ballot.object_id).into(),
        nonce.into(),
    ]);

    let contests =
        encrypt_ballot_contests(ballot, manifest, context, &nonce_seed, should_verify_proofs)?;

    let encrypted = make_ciphertext_ballot(
        &ballot.object_id,
        &ballot.style_id,
        &manifest.manifest_hash,
        encryption_seed,
        contests,
        Some(nonce),
        timestamp,
    );

    if should_verify_proofs
        && !encrypted.is_valid_encryption(
            &manifest.manifest_hash,
            &context.elgamal_public_key,
            &context.crypto_extended_base_hash,
        )
    {
        warn!("ballot {} failed verification", encrypted.object_id);
        return Err(Error::InvalidEncryption);
    }

    debug!(
        "encrypted ballot {} with code {}",
        encrypted.object_id, encrypted.code
    );
    Ok(encrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description() -> ContestDescription {
        let mut description = ContestDescription {
            object_id: "council".to_owned(),
            sequence_order: 2,
            electoral_district_id: "city".to_owned(),
            vote_variation: VoteVariationType::NOfM,
            number_elected: 2,
            votes_allowed: Some(2),
            name: "City Council".to_owned(),
            ballot_selections: vec![
                SelectionDescription {
                    object_id: "ann-selection".to_owned(),
                    sequence_order: 0,
                    candidate_id: "ann".to_owned(),
                },
                SelectionDescription {
                    object_id: "ben-selection".to_owned(),
                    sequence_order: 1,
                    candidate_id: "ben".to_owned(),
                },
                SelectionDescription {
                    object_id: "cat-selection".to_owned(),
                    sequence_order: 2,
                    candidate_id: "cat".to_owned(),
                },
            ],
            ballot_title: None,
            ballot_subtitle: None,
            placeholder_selections: vec![],
        };
        description.placeholder_selections =
            generate_placeholder_selections_from(&description, 2).unwrap();
        description
    }

    fn keypair() -> ElGamalKeyPair {
        ElGamalKeyPair::from_secret(&ElementModQ::from(4242)).unwrap()
    }

    #[test]
    fn test_contest_from_is_blank() {
        let contest = contest_from(&description());
        assert_eq!(contest.object_id, "council");
        assert_eq!(contest.ballot_selections.len(), 3);
        assert_eq!(contest.selection_count(), 0);
        assert!(contest.is_valid(&description()));
    }

    #[test]
    fn test_encrypt_selection() {
        let keypair = keypair();
        let contest_description = description();
        let description = &contest_description.ballot_selections[1];
        let selection = selection_from(description, false, true);
        let extended_base_hash = ElementModQ::from(77);
        let nonce_seed = ElementModQ::from(88);

        let encrypted = encrypt_selection(
            &selection,
            description,
            &keypair.public_key,
            &extended_base_hash,
            &nonce_seed,
            false,
            true,
        )
        .unwrap();

        let nonces = Nonces::with_headers(&description.crypto_hash(), &[(&nonce_seed).into()]);
        assert_eq!(encrypted.nonce, Some(nonces.get(1)));
        assert_eq!(encrypted.description_hash, description.crypto_hash());
        assert!(!encrypted.is_placeholder_selection);
        assert!(encrypted.is_valid_encryption(
            &description.crypto_hash(),
            &keypair.public_key,
            &extended_base_hash
        ));

        let dlog = DiscreteLog::new();
        assert_eq!(encrypted.ciphertext.decrypt(&keypair.secret_key, &dlog).unwrap(), 1);

        // Deterministic given the same seed
        let again = encrypt_selection(
            &selection,
            description,
            &keypair.public_key,
            &extended_base_hash,
            &nonce_seed,
            false,
            false,
        )
        .unwrap();
        assert_eq!(encrypted, again);
    }

    #[test]
    fn test_encrypt_selection_rejects_bad_input() {
        let keypair = keypair();
        let descriptions = description().ballot_selections;

        let mut overvote = selection_from(&descriptions[0], false, true);
        overvote.vote = 2;
        assert!(matches!(
            encrypt_selection(
                &overvote,
                &descriptions[0],
                &keypair.public_key,
                &ElementModQ::one(),
                &ElementModQ::one(),
                false,
                true
            ),
            Err(Error::InvalidPlaintext(_))
        ));

        let mismatched = selection_from(&descriptions[0], false, true);
        assert!(matches!(
            encrypt_selection(
                &mismatched,
                &descriptions[1],
                &keypair.public_key,
                &ElementModQ::one(),
                &ElementModQ::one(),
                false,
                true
            ),
            Err(Error::InvalidPlaintext(_))
        ));
    }

    #[test]
    fn test_encrypt_contest_fills_placeholders() {
        let keypair = keypair();
        let description = description();
        let extended_base_hash = ElementModQ::from(77);
        let dlog = DiscreteLog::new();

        // One vote of two: the first placeholder is selected
        let mut contest = contest_from(&description);
        contest.ballot_selections[2].vote = 1;

        let encrypted = encrypt_contest(
            &contest,
            &description,
            &keypair.public_key,
            &extended_base_hash,
            &ElementModQ::from(5),
            true,
        )
        .unwrap();

        assert_eq!(encrypted.ballot_selections.len(), 5);
        let votes: Vec<u64> = encrypted
            .ballot_selections
            .iter()
            .map(|s| s.ciphertext.decrypt(&keypair.secret_key, &dlog).unwrap())
            .collect();
        assert_eq!(votes, vec![0, 0, 1, 1, 0]);

        let placeholders: Vec<bool> = encrypted
            .ballot_selections
            .iter()
            .map(|s| s.is_placeholder_selection)
            .collect();
        assert_eq!(placeholders, vec![false, false, false, true, true]);

        assert_eq!(
            encrypted
                .ciphertext_accumulation
                .decrypt(&keypair.secret_key, &dlog)
                .unwrap(),
            2
        );
        assert_eq!(encrypted.proof.constant, 2);
        assert!(encrypted.is_valid_encryption(
            &description.crypto_hash(),
            &keypair.public_key,
            &extended_base_hash
        ));
    }

    #[test]
    fn test_encrypt_contest_rejects_overvote() {
        let keypair = keypair();
        let description = description();
        let mut contest = contest_from(&description);
        for selection in &mut contest.ballot_selections {
            selection.vote = 1;
        }

        assert!(matches!(
            encrypt_contest(
                &contest,
                &description,
                &keypair.public_key,
                &ElementModQ::one(),
                &ElementModQ::one(),
                true
            ),
            Err(Error::Overvote(ref id)) if id == "council"
        ));
    }

    #[test]
    fn test_encrypt_contest_rejects_unknown_selection() {
        let keypair = keypair();
        let description = description();
        let mut contest = contest_from(&description);
        contest.ballot_selections[0].object_id = "dan-selection".to_owned();

        assert!(matches!(
            encrypt_contest(
                &contest,
                &description,
                &keypair.public_key,
                &ElementModQ::one(),
                &ElementModQ::one(),
                true
            ),
            Err(Error::InvalidPlaintext(_))
        ));
    }
}
