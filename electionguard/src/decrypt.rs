use crate::*;
use log::{debug, warn};

/// A decrypted selection and the proof that it was decrypted correctly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaintextBallotSelectionWithProof {
    pub selection: PlaintextBallotSelection,
    pub decryption_proof: ChaumPedersenDecryptionProof,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaintextBallotContestWithProofs {
    pub object_id: String,
    pub sequence_order: u64,
    pub ballot_selections: Vec<PlaintextBallotSelectionWithProof>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaintextBallotWithProofs {
    pub object_id: String,
    pub style_id: String,
    pub contests: Vec<PlaintextBallotContestWithProofs>,
}

fn plaintext_selection(selection: &CiphertextBallotSelection, vote: u64) -> PlaintextBallotSelection {
    PlaintextBallotSelection {
        object_id: selection.object_id.clone(),
        sequence_order: selection.sequence_order,
        vote,
        is_placeholder_selection: selection.is_placeholder_selection,
        extended_data: None,
    }
}

fn check_secret_key(context: &CiphertextElectionContext, secret_key: &ElementModQ) -> Result<(), Error> {
    if &g_pow_p(secret_key) != context.get_public_key() {
        warn!("secret key does not match the election public key");
        return Err(Error::InvalidSecretKey);
    }
    Ok(())
}

/// Decrypt a selection with the election secret key and prove the decryption.
///
/// The proof is bound to the context's base hash, and its randomness is derived from the
/// selection hash and the secret key.
pub fn decrypt_selection_with_secret(
    selection: &CiphertextBallotSelection,
    description: &SelectionDescription,
    context: &CiphertextElectionContext,
    secret_key: &ElementModQ,
    dlog: &DiscreteLog,
    should_verify_proofs: bool,
) -> Result<PlaintextBallotSelectionWithProof, Error> {
    check_secret_key(context, secret_key)?;

    if should_verify_proofs
        && !selection.is_valid_encryption(
            &description.crypto_hash(),
            context.get_public_key(),
            &context.crypto_extended_base_hash,
        )
    {
        return Err(Error::InvalidEncryption);
    }

    let vote = selection.ciphertext.decrypt(secret_key, dlog)?;
    let proof_seed = hash_elems(&[(&selection.crypto_hash).into(), secret_key.into()]);
    let decryption_proof = make_chaum_pedersen_decryption_proof(
        &selection.ciphertext,
        secret_key,
        &proof_seed,
        &context.crypto_base_hash,
    );

    Ok(PlaintextBallotSelectionWithProof {
        selection: plaintext_selection(selection, vote),
        decryption_proof,
    })
}

/// Decrypt a selection with its encryption nonce.
///
/// With `nonce_seed` the nonce is regenerated the way `encrypt_selection` derived it, otherwise
/// the nonce stored on the selection is used.
pub fn decrypt_selection_with_nonce(
    selection: &CiphertextBallotSelection,
    description: &SelectionDescription,
    context: &CiphertextElectionContext,
    nonce_seed: Option<&ElementModQ>,
    dlog: &DiscreteLog,
    should_verify_proofs: bool,
) -> Result<PlaintextBallotSelection, Error> {
    let description_hash = description.crypto_hash();

    if should_verify_proofs
        && !selection.is_valid_encryption(
            &description_hash,
            context.get_public_key(),
            &context.crypto_extended_base_hash,
        )
    {
        return Err(Error::InvalidEncryption);
    }

    let nonce = match nonce_seed {
        Some(seed) => Nonces::with_headers(&description_hash, &[seed.into()])
            .get(description.sequence_order),
        None => selection
            .nonce
            .clone()
            .ok_or(Error::MissingValue("selection nonce"))?,
    };

    if g_pow_p(&nonce) != selection.ciphertext.pad {
        warn!("nonce does not match selection {}", selection.object_id);
        return Err(Error::InvalidEncryption);
    }

    let vote = selection
        .ciphertext
        .decrypt_known_nonce(context.get_public_key(), &nonce, dlog)?;
    Ok(plaintext_selection(selection, vote))
}

/// Decrypt every selection in a contest with the election secret key.
pub fn decrypt_contest_with_secret(
    contest: &CiphertextBallotContest,
    description: &ContestDescription,
    context: &CiphertextElectionContext,
    secret_key: &ElementModQ,
    dlog: &DiscreteLog,
    should_verify_proofs: bool,
    remove_placeholders: bool,
) -> Result<PlaintextBallotContestWithProofs, Error> {
    if should_verify_proofs
        && !(contest.is_valid_for_description(description)
            && contest.is_valid_encryption(
                &description.crypto_hash(),
                context.get_public_key(),
                &context.crypto_extended_base_hash,
            ))
    {
        return Err(Error::InvalidEncryption);
    }

    let mut ballot_selections = Vec::with_capacity(contest.ballot_selections.len());
    for selection in &contest.ballot_selections {
        if remove_placeholders && selection.is_placeholder_selection {
            continue;
        }
        let selection_description = description
            .selection_for(&selection.object_id)
            .ok_or(Error::MissingValue("selection description"))?;

        ballot_selections.push(decrypt_selection_with_secret(
            selection,
            selection_description,
            context,
            secret_key,
            dlog,
            should_verify_proofs,
        )?);
    }

    Ok(PlaintextBallotContestWithProofs {
        object_id: contest.object_id.clone(),
        sequence_order: contest.sequence_order,
        ballot_selections,
    })
}

/// Decrypt every selection in a contest with nonces.
///
/// With `nonce_seed` (the ballot's nonce seed) the contest nonce is regenerated, otherwise the
/// nonce stored on the contest is used.
pub fn decrypt_contest_with_nonce(
    contest: &CiphertextBallotContest,
    description: &ContestDescription,
    context: &CiphertextElectionContext,
    nonce_seed: Option<&ElementModQ>,
    dlog: &DiscreteLog,
    should_verify_proofs: bool,
    remove_placeholders: bool,
) -> Result<PlaintextBallotContest, Error> {
    let description_hash = description.crypto_hash();

    if should_verify_proofs
        && !(contest.is_valid_for_description(description)
            && contest.is_valid_encryption(
                &description_hash,
                context.get_public_key(),
                &context.crypto_extended_base_hash,
            ))
    {
        return Err(Error::InvalidEncryption);
    }

    let contest_nonce = match nonce_seed {
        Some(seed) => Nonces::with_headers(&description_hash, &[seed.into()])
            .get(description.sequence_order),
        None => contest
            .nonce
            .clone()
            .ok_or(Error::MissingValue("contest nonce"))?,
    };

    let mut ballot_selections = Vec::with_capacity(contest.ballot_selections.len());
    for selection in &contest.ballot_selections {
        if remove_placeholders && selection.is_placeholder_selection {
            continue;
        }
        let selection_description = description
            .selection_for(&selection.object_id)
            .ok_or(Error::MissingValue("selection description"))?;

        ballot_selections.push(decrypt_selection_with_nonce(
            selection,
            selection_description,
            context,
            Some(&contest_nonce),
            dlog,
            should_verify_proofs,
        )?);
    }

    Ok(PlaintextBallotContest {
        object_id: contest.object_id.clone(),
        sequence_order: contest.sequence_order,
        ballot_selections,
    })
}

/// Decrypt a whole ballot with the election secret key.
///
/// With `should_verify_proofs` the ballot is verified against the manifest once up front;
/// individual contests and selections are not re-verified.
pub fn decrypt_ballot_with_secret(
    ballot: &CiphertextBallot,
    manifest: &InternalManifest,
    context: &CiphertextElectionContext,
    secret_key: &ElementModQ,
    dlog: &DiscreteLog,
    should_verify_proofs: bool,
    remove_placeholders: bool,
) -> Result<PlaintextBallotWithProofs, Error> {
    if should_verify_proofs
        && !ballot.is_valid_for_manifest(
            manifest,
            context.get_public_key(),
            &context.crypto_extended_base_hash,
        )
    {
        return Err(Error::InvalidEncryption);
    }

    let mut contests = Vec::with_capacity(ballot.contests.len());
    for contest in &ballot.contests {
        let description = manifest
            .contest_for(&contest.object_id)
            .ok_or(Error::MissingValue("contest description"))?;
        contests.push(decrypt_contest_with_secret(
            contest,
            description,
            context,
            secret_key,
            dlog,
            false,
            remove_placeholders,
        )?);
    }

    debug!("decrypted ballot {} with secret key", ballot.object_id);
    Ok(PlaintextBallotWithProofs {
        object_id: ballot.object_id.clone(),
        style_id: ballot.style_id.clone(),
        contests,
    })
}

/// Decrypt a whole ballot from its ballot nonce, either `nonce` or the one stored on the ballot.
pub fn decrypt_ballot_with_nonce(
    ballot: &CiphertextBallot,
    manifest: &InternalManifest,
    context: &CiphertextElectionContext,
    nonce: Option<&ElementModQ>,
    dlog: &DiscreteLog,
    should_verify_proofs: bool,
    remove_placeholders: bool,
) -> Result<PlaintextBallot, Error> {
    if should_verify_proofs
        && !ballot.is_valid_for_manifest(
            manifest,
            context.get_public_key(),
            &context.crypto_extended_base_hash,
        )
    {
        return Err(Error::InvalidEncryption);
    }

    let nonce = nonce
        .or_else(|| ballot.nonce.as_ref())
        .ok_or(Error::MissingValue("ballot nonce"))?;
    let nonce_seed = hash_elems(&[
        (&manifest.manifest_hash).into(),
        (&ballot.object_id).into(),
        nonce.into(),
    ]);

    let mut contests = Vec::with_capacity(ballot.contests.len());
    for contest in &ballot.contests {
        let description = manifest
            .contest_for(&contest.object_id)
            .ok_or(Error::MissingValue("contest description"))?;
        contests.push(decrypt_contest_with_nonce(
            contest,
            description,
            context,
            Some(&nonce_seed),
            dlog,
            false,
            remove_placeholders,
        )?);
    }

    debug!("decrypted ballot {} with nonce", ballot.object_id);
    Ok(PlaintextBallot {
        object_id: ballot.object_id.clone(),
        style_id: ballot.style_id.clone(),
        contests,
    })
}

/// Check that `plaintext` is provably the decryption of `ciphertext`.
pub fn validate_decrypted_selection(
    context: &CiphertextElectionContext,
    plaintext: &PlaintextBallotSelectionWithProof,
    ciphertext: &CiphertextBallotSelection,
) -> bool {
    plaintext.decryption_proof.is_valid(
        plaintext.selection.vote,
        &ciphertext.ciphertext,
        context.get_public_key(),
        &context.crypto_base_hash,
    )
}
