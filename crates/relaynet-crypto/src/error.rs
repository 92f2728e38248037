//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// The key is malformed or cannot be used.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The key type is not supported by the requested operation.
    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    /// The algorithm is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Invalid key length.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length.
        expected: usize,
        /// Actual key length.
        actual: usize,
    },

    /// Invalid initialization vector length.
    #[error("Invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength {
        /// Expected IV length.
        expected: usize,
        /// Actual IV length.
        actual: usize,
    },

    /// Signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Signature verification failed.
    #[error("Signature verification failed")]
    SignatureVerification,

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (invalid ciphertext or key).
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Wrapping or unwrapping a key failed.
    #[error("Key wrap failed: {0}")]
    KeyWrap(String),

    /// Elliptic-curve key agreement failed.
    #[error("Key agreement failed: {0}")]
    KeyAgreement(String),

    /// Encoding or decoding a key failed.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
