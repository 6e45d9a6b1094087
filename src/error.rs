//! Error types for the Paillier library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaillierError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaillierError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("Random sampling failed: {0}")]
    SamplingFailed(String),

    #[error("Key generation cancelled")]
    Cancelled,

    #[error("Plaintext out of range: must satisfy 0 < m < n")]
    PlaintextOutOfRange,

    #[error("Ciphertext out of range: must satisfy 0 < c < n^2")]
    CiphertextOutOfRange,

    #[error("Decryption failed: ciphertext does not match the private key")]
    DecryptionFailed,

    #[error("Failed to compute modular inverse")]
    ModularInverseError,

    #[error("Empty list provided for batch operation")]
    EmptyBatch,

    #[error("Mismatched lengths: {0}")]
    LengthMismatch(String),
}
