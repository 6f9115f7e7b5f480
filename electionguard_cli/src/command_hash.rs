use electionguard::*;

pub fn command_hash(matches: &clap::ArgMatches) {
    let manifest: Manifest = crate::read_json("hash", matches, "MANIFEST");
    if !manifest.is_valid() {
        eprintln!("electionguard hash: warning: manifest failed validation");
    }

    println!("{}", manifest.crypto_hash());
}
