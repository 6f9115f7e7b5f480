use crate::config::Config;
use electionguard::*;

pub fn command_keygen(config: &Config) {
    let secret = match &config.secret_key {
        Some(secret) => secret.clone(),
        None => generate_secret(),
    };

    let keypair = ElGamalKeyPair::from_secret(&secret).unwrap_or_else(|e| {
        eprintln!("electionguard keygen: {}", e);
        std::process::exit(1);
    });

    println!("secret-key: {}", keypair.secret_key);
    println!("public-key: {}", keypair.public_key);
}

// rand_q covers [0, Q) and a secret must be at least 2
fn generate_secret() -> ElementModQ {
    loop {
        let secret = rand_q();
        if secret.as_int() >= ElementModQ::two().as_int() {
            return secret;
        }
    }
}
