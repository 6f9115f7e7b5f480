use crate::config::{parse_q, Config};
use electionguard::*;

pub fn command_decrypt(matches: &clap::ArgMatches, config: &Config) {
    let manifest = crate::load_manifest("decrypt", matches);
    let context = crate::context_for("decrypt", config, &manifest);
    let ballot: CiphertextBallot = crate::read_json("decrypt", matches, "BALLOT");

    let dlog = DiscreteLog::with_max_exponent(config.max_dlog);
    let remove_placeholders = !matches.is_present("keep-placeholders");

    let nonce = matches.value_of("nonce").map(|nonce| {
        parse_q("nonce", nonce).unwrap_or_else(|e| {
            eprintln!("electionguard decrypt: {}", e);
            std::process::exit(1);
        })
    });

    // The secret key is preferred since it also proves the decryption
    match (&config.secret_key, nonce) {
        (Some(secret_key), None) => {
            let decrypted = decrypt_ballot_with_secret(
                &ballot,
                &manifest,
                &context,
                secret_key,
                &dlog,
                true,
                remove_placeholders,
            )
            .unwrap_or_else(|e| {
                eprintln!("electionguard decrypt: {}", e);
                std::process::exit(1);
            });
            crate::print_json("decrypt", &decrypted);
        }
        (_, nonce) => {
            let decrypted = decrypt_ballot_with_nonce(
                &ballot,
                &manifest,
                &context,
                nonce.as_ref(),
                &dlog,
                true,
                remove_placeholders,
            )
            .unwrap_or_else(|e| {
                eprintln!("electionguard decrypt: {}", e);
                std::process::exit(1);
            });
            crate::print_json("decrypt", &decrypted);
        }
    }
}
