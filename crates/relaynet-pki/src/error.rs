//! Error types for certificate operations.

use thiserror::Error;

/// Errors that can occur when issuing or parsing certificates.
#[derive(Error, Debug)]
pub enum CertificateError {
    /// Cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] relaynet_crypto::CryptoError),

    /// DER encoding or decoding failed.
    #[error("Encoding error: {0}")]
    Encoding(#[from] der::Error),

    /// The serialization is not a valid X.509 certificate.
    #[error("Certificate is malformed: {0}")]
    Malformed(String),

    /// The validity end date is not after the start date.
    #[error("The end date must be later than the start date")]
    InvalidValidityPeriod,

    /// A validity date cannot be represented in a certificate.
    #[error("Date cannot be encoded in a certificate: {0}")]
    DateOutOfRange(String),

    /// The issuer certificate lacks the CA basic constraint.
    #[error("Issuer certificate should be marked as CA")]
    IssuerNotCa,

    /// The path length constraint is out of range.
    #[error("Path length constraint must be between 0 and {max} (got {actual})")]
    InvalidPathLenConstraint {
        /// Maximum allowed constraint.
        max: u8,
        /// Requested constraint.
        actual: u8,
    },

    /// The certificate is not valid at the given time.
    #[error("Certificate is not valid at the requested time")]
    OutsideValidityPeriod,

    /// The certificate was not issued by the given issuer.
    #[error("Certificate was not issued by the given issuer")]
    IssuerMismatch,

    /// The certificate signature algorithm is not supported.
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedSignatureAlgorithm(String),
}

/// Result type for certificate operations.
pub type Result<T> = std::result::Result<T, CertificateError>;
