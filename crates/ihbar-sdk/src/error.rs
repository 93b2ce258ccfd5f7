use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Error, Debug)]
pub enum SdkError {
    /// Query keys of every field that resolved to an empty value.
    #[error("Invalid input query parameter: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Invalid memo template: {0}")]
    Template(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecret(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
