use electionguard::*;
use num_bigint::BigUint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("electionguard: {0} is not a valid hexadecimal element: {1}")]
    InvalidElement(&'static str, String),

    #[error("electionguard: {0} is not a valid number: {1}")]
    InvalidNumber(&'static str, std::num::ParseIntError),

    #[error("electionguard: {0} is required")]
    Missing(&'static str),

    #[error("electionguard: public key does not match the secret key")]
    MismatchedKeys,

    #[error("electionguard: quorum {0} exceeds number of guardians {1}")]
    InvalidQuorum(u64, u64),
}

/// Election settings, read from `ELECTIONGUARD_*` environment variables and overridden by flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub public_key: Option<ElementModP>,
    pub secret_key: Option<ElementModQ>,
    pub encryption_seed: Option<ElementModQ>,
    pub guardians: u64,
    pub quorum: u64,
    pub commitment_hash: ElementModQ,
    pub max_dlog: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            public_key: None,
            secret_key: None,
            encryption_seed: None,
            guardians: 1,
            quorum: 1,
            commitment_hash: ElementModQ::two(),
            max_dlog: DEFAULT_MAX_EXPONENT,
        }
    }
}

fn parse_hex(name: &'static str, value: &str) -> Result<BigUint, ConfigError> {
    BigUint::parse_bytes(value.trim().as_bytes(), 16)
        .ok_or_else(|| ConfigError::InvalidElement(name, value.to_owned()))
}

pub fn parse_q(name: &'static str, value: &str) -> Result<ElementModQ, ConfigError> {
    int_to_q(parse_hex(name, value)?).ok_or_else(|| ConfigError::InvalidElement(name, value.to_owned()))
}

pub fn parse_p(name: &'static str, value: &str) -> Result<ElementModP, ConfigError> {
    int_to_p(parse_hex(name, value)?).ok_or_else(|| ConfigError::InvalidElement(name, value.to_owned()))
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidNumber(name, e))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup("ELECTIONGUARD_PUBLIC_KEY") {
            config.public_key = Some(parse_p("public key", &value)?);
        }
        if let Some(value) = lookup("ELECTIONGUARD_SECRET_KEY") {
            config.secret_key = Some(parse_q("secret key", &value)?);
        }
        if let Some(value) = lookup("ELECTIONGUARD_ENCRYPTION_SEED") {
            config.encryption_seed = Some(parse_q("encryption seed", &value)?);
        }
        if let Some(value) = lookup("ELECTIONGUARD_GUARDIANS") {
            config.guardians = parse_u64("guardians", &value)?;
        }
        if let Some(value) = lookup("ELECTIONGUARD_QUORUM") {
            config.quorum = parse_u64("quorum", &value)?;
        }
        if let Some(value) = lookup("ELECTIONGUARD_COMMITMENT_HASH") {
            config.commitment_hash = parse_q("commitment hash", &value)?;
        }
        if let Some(value) = lookup("ELECTIONGUARD_MAX_DLOG") {
            config.max_dlog = parse_u64("max dlog", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line flags on top of the environment.
    pub fn with_matches(mut self, matches: &clap::ArgMatches) -> Result<Self, ConfigError> {
        if let Some(value) = matches.value_of("public-key") {
            self.public_key = Some(parse_p("public key", value)?);
        }
        if let Some(value) = matches.value_of("secret-key") {
            self.secret_key = Some(parse_q("secret key", value)?);
        }
        if let Some(value) = matches.value_of("encryption-seed") {
            self.encryption_seed = Some(parse_q("encryption seed", value)?);
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum > self.guardians {
            return Err(ConfigError::InvalidQuorum(self.quorum, self.guardians));
        }
        if let (Some(public_key), Some(secret_key)) = (&self.public_key, &self.secret_key) {
            if &g_pow_p(secret_key) != public_key {
                return Err(ConfigError::MismatchedKeys);
            }
        }
        Ok(())
    }

    /// The election public key, derived from the secret key if only that is configured.
    pub fn public_key(&self) -> Result<ElementModP, ConfigError> {
        match (&self.public_key, &self.secret_key) {
            (Some(public_key), _) => Ok(public_key.clone()),
            (None, Some(secret_key)) => Ok(g_pow_p(secret_key)),
            (None, None) => Err(ConfigError::Missing("public key")),
        }
    }

    pub fn context(&self, manifest_hash: &ElementModQ) -> Result<CiphertextElectionContext, ConfigError> {
        Ok(make_ciphertext_election_context(
            self.guardians,
            self.quorum,
            &self.public_key()?,
            &self.commitment_hash,
            manifest_hash,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = lookup(&[]).unwrap();
        assert_eq!(config.guardians, 1);
        assert_eq!(config.quorum, 1);
        assert_eq!(config.commitment_hash, ElementModQ::two());
        assert_eq!(config.max_dlog, 10_000_000);
        assert!(matches!(config.public_key(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_from_env_vars() {
        let public_key = g_pow_p(&ElementModQ::from(0x7a69)).to_string();
        let config = lookup(&[
            ("ELECTIONGUARD_SECRET_KEY", "7A69"),
            ("ELECTIONGUARD_PUBLIC_KEY", public_key.as_str()),
            ("ELECTIONGUARD_ENCRYPTION_SEED", "ff"),
            ("ELECTIONGUARD_GUARDIANS", "5"),
            ("ELECTIONGUARD_QUORUM", "3"),
            ("ELECTIONGUARD_MAX_DLOG", "1000"),
        ])
        .unwrap();

        assert_eq!(config.secret_key, Some(ElementModQ::from(31337)));
        assert_eq!(config.encryption_seed, Some(ElementModQ::from(255)));
        assert_eq!(config.guardians, 5);
        assert_eq!(config.quorum, 3);
        assert_eq!(config.max_dlog, 1000);
        assert_eq!(config.public_key().unwrap().to_string(), public_key);
    }

    #[test]
    fn test_public_key_from_secret() {
        let config = lookup(&[("ELECTIONGUARD_SECRET_KEY", "02")]).unwrap();
        assert_eq!(config.public_key().unwrap(), g_pow_p(&ElementModQ::two()));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            lookup(&[("ELECTIONGUARD_SECRET_KEY", "not hex")]),
            Err(ConfigError::InvalidElement(_, _))
        ));
        assert!(matches!(
            lookup(&[("ELECTIONGUARD_GUARDIANS", "many")]),
            Err(ConfigError::InvalidNumber(_, _))
        ));
        assert!(matches!(
            lookup(&[("ELECTIONGUARD_QUORUM", "2")]),
            Err(ConfigError::InvalidQuorum(2, 1))
        ));
        assert!(matches!(
            lookup(&[
                ("ELECTIONGUARD_SECRET_KEY", "02"),
                ("ELECTIONGUARD_PUBLIC_KEY", "03")
            ]),
            Err(ConfigError::MismatchedKeys)
        ));
    }
}
