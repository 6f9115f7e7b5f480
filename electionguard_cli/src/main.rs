use clap::{App, AppSettings, Arg, SubCommand};
use electionguard::*;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::de::DeserializeOwned;

mod command_decrypt;
mod command_encrypt;
mod command_hash;
mod command_keygen;
mod command_verify;
mod config;

use command_decrypt::command_decrypt;
use command_encrypt::command_encrypt;
use command_hash::command_hash;
use command_keygen::command_keygen;
use command_verify::command_verify;
use config::Config;

fn main() {
    let matches = App::new("ElectionGuard CLI")
        .version("0.1")
        .about("Encrypts and verifies ElectionGuard ballots")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("public-key")
                .long("public-key")
                .takes_value(true)
                .help("Election public key in hex - can also be set with ELECTIONGUARD_PUBLIC_KEY"),
        )
        .arg(
            Arg::with_name("secret-key")
                .long("secret-key")
                .takes_value(true)
                .help("Election secret key in hex - can also be set with ELECTIONGUARD_SECRET_KEY"),
        )
        .arg(
            Arg::with_name("encryption-seed")
                .long("encryption-seed")
                .takes_value(true)
                .help("Ballot code seed in hex - can also be set with ELECTIONGUARD_ENCRYPTION_SEED"),
        )
        .subcommand(
            SubCommand::with_name("keygen")
                .about("Derive the election public key from --secret-key, or generate a new keypair"),
        )
        .subcommand(
            SubCommand::with_name("hash")
                .about("Print the hash of an election manifest")
                .arg(
                    Arg::with_name("MANIFEST")
                        .index(1)
                        .required(true)
                        .help("Election manifest in JSON format"),
                ),
        )
        .subcommand(
            SubCommand::with_name("encrypt")
                .about("Encrypt a plaintext ballot")
                .arg(
                    Arg::with_name("MANIFEST")
                        .index(1)
                        .required(true)
                        .help("Election manifest in JSON format"),
                )
                .arg(
                    Arg::with_name("BALLOT")
                        .index(2)
                        .required(true)
                        .help("Plaintext ballot in JSON format"),
                )
                .arg(
                    Arg::with_name("nonce")
                        .long("nonce")
                        .takes_value(true)
                        .help("Ballot nonce in hex, random if not given"),
                )
                .arg(
                    Arg::with_name("timestamp")
                        .long("timestamp")
                        .takes_value(true)
                        .help("Ballot timestamp in seconds, now if not given"),
                )
                .arg(
                    Arg::with_name("receipt")
                        .long("receipt")
                        .takes_value(true)
                        .help("Write the voter's receipt to this file"),
                )
                .arg(
                    Arg::with_name("publish")
                        .long("publish")
                        .help("Remove all nonces from the encrypted ballot"),
                )
                .arg(
                    Arg::with_name("skip-verify")
                        .long("skip-verify")
                        .help("Do not verify proofs after encrypting"),
                ),
        )
        .subcommand(
            SubCommand::with_name("verify")
                .about("Verify the hashes and proofs of an encrypted ballot")
                .arg(
                    Arg::with_name("MANIFEST")
                        .index(1)
                        .required(true)
                        .help("Election manifest in JSON format"),
                )
                .arg(
                    Arg::with_name("BALLOT")
                        .index(2)
                        .required(true)
                        .help("Encrypted ballot in JSON format"),
                ),
        )
        .subcommand(
            SubCommand::with_name("decrypt")
                .about("Decrypt an encrypted ballot with the secret key or the ballot nonce")
                .arg(
                    Arg::with_name("MANIFEST")
                        .index(1)
                        .required(true)
                        .help("Election manifest in JSON format"),
                )
                .arg(
                    Arg::with_name("BALLOT")
                        .index(2)
                        .required(true)
                        .help("Encrypted ballot in JSON format"),
                )
                .arg(
                    Arg::with_name("nonce")
                        .long("nonce")
                        .takes_value(true)
                        .help("Decrypt with this ballot nonce instead of the secret key"),
                )
                .arg(
                    Arg::with_name("keep-placeholders")
                        .long("keep-placeholders")
                        .help("Include placeholder selections in the output"),
                ),
        )
        .get_matches();

    let level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if let Err(e) = init_logging(level) {
        eprintln!("electionguard: unable to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = Config::from_env()
        .and_then(|config| config.with_matches(&matches))
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        });

    // Subcommands
    if let Some(_matches) = matches.subcommand_matches("keygen") {
        command_keygen(&config);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("hash") {
        command_hash(matches);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("encrypt") {
        command_encrypt(matches, &config);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("verify") {
        command_verify(matches, &config);
        std::process::exit(0);
    }
    if let Some(matches) = matches.subcommand_matches("decrypt") {
        command_decrypt(matches, &config);
        std::process::exit(0);
    }
}

fn init_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l} {t} - {m}{n}")))
        .build();

    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;

    log4rs::init_config(config)?;
    Ok(())
}

/// Expand `~` and environment variables in a path argument.
pub fn expand(path: &str) -> String {
    match shellexpand::full(path) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            eprintln!("electionguard: unable to expand {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Read and parse a JSON file named by a required argument, exiting on failure.
pub fn read_json<T: DeserializeOwned>(command: &str, matches: &clap::ArgMatches, arg: &str) -> T {
    let filename = match matches.value_of(arg) {
        Some(filename) => expand(filename),
        None => {
            eprintln!("electionguard {}: {} filename required", command, arg);
            std::process::exit(1);
        }
    };

    let file_bytes = match std::fs::read(&filename) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("electionguard {}: unable to read {}: {}", command, filename, e);
            std::process::exit(1);
        }
    };

    serde_json::from_slice(&file_bytes).unwrap_or_else(|e| {
        eprintln!("electionguard {}: unable to parse {}: {}", command, filename, e);
        std::process::exit(1);
    })
}

/// Load the manifest, check it and add placeholders.
pub fn load_manifest(command: &str, matches: &clap::ArgMatches) -> InternalManifest {
    let manifest: Manifest = read_json(command, matches, "MANIFEST");
    if !manifest.is_valid() {
        eprintln!("electionguard {}: {}", command, Error::InvalidManifest);
        std::process::exit(1);
    }

    InternalManifest::new(manifest).unwrap_or_else(|e| {
        eprintln!("electionguard {}: {}", command, e);
        std::process::exit(1);
    })
}

pub fn context_for(
    command: &str,
    config: &Config,
    manifest: &InternalManifest,
) -> CiphertextElectionContext {
    config.context(&manifest.manifest_hash).unwrap_or_else(|e| {
        eprintln!("electionguard {}: {}", command, e);
        std::process::exit(1);
    })
}

pub fn print_json<T: serde::Serialize>(command: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("electionguard {}: unable to serialize output: {}", command, e);
            std::process::exit(1);
        }
    }
}
