use crate::config::{parse_q, Config};
use electionguard::*;
use chrono::Utc;

pub fn command_encrypt(matches: &clap::ArgMatches, config: &Config) {
    let manifest = crate::load_manifest("encrypt", matches);
    let context = crate::context_for("encrypt", config, &manifest);
    let ballot: PlaintextBallot = crate::read_json("encrypt", matches, "BALLOT");

    let nonce = matches.value_of("nonce").map(|nonce| {
        parse_q("nonce", nonce).unwrap_or_else(|e| {
            eprintln!("electionguard encrypt: {}", e);
            std::process::exit(1);
        })
    });

    let timestamp = match matches.value_of("timestamp") {
        Some(timestamp) => timestamp.parse().unwrap_or_else(|e| {
            eprintln!("electionguard encrypt: invalid timestamp {}: {}", timestamp, e);
            std::process::exit(1);
        }),
        None => now(),
    };

    let encryption_seed = config
        .encryption_seed
        .clone()
        .unwrap_or_else(|| manifest.manifest_hash.clone());

    let encrypted = encrypt_ballot(
        &ballot,
        &manifest,
        &context,
        &encryption_seed,
        nonce.as_ref(),
        timestamp,
        !matches.is_present("skip-verify"),
    )
    .unwrap_or_else(|e| {
        eprintln!("electionguard encrypt: {}", e);
        std::process::exit(1);
    });

    if let Some(filename) = matches.value_of("receipt") {
        write_receipt(&encrypted, &crate::expand(filename));
    }

    if matches.is_present("publish") {
        crate::print_json("encrypt", &encrypted.without_nonces());
    } else {
        crate::print_json("encrypt", &encrypted);
    }
}

fn write_receipt(ballot: &CiphertextBallot, filename: &str) {
    let receipt = BallotReceipt::new(ballot).unwrap_or_else(|e| {
        eprintln!("electionguard encrypt: {}", e);
        std::process::exit(1);
    });

    let json = serde_json::to_string_pretty(&receipt).unwrap_or_else(|e| {
        eprintln!("electionguard encrypt: unable to serialize receipt: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = std::fs::write(filename, json) {
        eprintln!("electionguard encrypt: unable to write {}: {}", filename, e);
        std::process::exit(1);
    }
}

fn now() -> u64 {
    let timestamp = Utc::now().timestamp();
    if timestamp < 0 {
        eprintln!("electionguard encrypt: system clock is before 1970");
        std::process::exit(1);
    }
    timestamp as u64
}
