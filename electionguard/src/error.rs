use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("electionguard: invalid secret key - must be within [2, Q)")]
    InvalidSecretKey,

    #[error("electionguard: multiplicative inverse of zero requested")]
    DivisionByZero,

    #[error("electionguard: encryption failed")]
    InvalidEncryption,

    #[error("electionguard: invalid plaintext: {0}")]
    InvalidPlaintext(String),

    #[error("electionguard: placeholder sequence order {1} collides with an existing selection in contest {0}")]
    SequenceCollision(String, u64),

    #[error("electionguard: missing value: {0}")]
    MissingValue(&'static str),

    #[error("electionguard: contest {0} is overvoted")]
    Overvote(String),

    #[error("electionguard: discrete log not found below exponent {0}")]
    DiscreteLogOutOfRange(u64),

    #[error("electionguard: unknown ballot style {0}")]
    UnknownBallotStyle(String),

    #[error("electionguard: manifest failed validation")]
    InvalidManifest,

    #[error("electionguard: JSON error: {0}")]
    JSON(#[from] serde_json::Error),
}
