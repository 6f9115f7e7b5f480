use crate::config::Config;
use electionguard::*;

pub fn command_verify(matches: &clap::ArgMatches, config: &Config) {
    let manifest = crate::load_manifest("verify", matches);
    let context = crate::context_for("verify", config, &manifest);
    let ballot: CiphertextBallot = crate::read_json("verify", matches, "BALLOT");

    if !ballot.is_valid_for_manifest(
        &manifest,
        &context.elgamal_public_key,
        &context.crypto_extended_base_hash,
    ) {
        eprintln!(
            "electionguard verify: ballot {} failed verification (run with -v for details)",
            ballot.object_id
        );
        std::process::exit(1);
    }

    println!("> Ballot {} verified OK", ballot.object_id);
    println!("  code: {}", ballot.code);
}
