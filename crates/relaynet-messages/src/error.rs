//! Error types for RAMF messages and their envelopes.
//!
//! Each layer has its own error kind so that callers can tell a malformed
//! serialization apart from an authenticity or confidentiality failure:
//!
//! - [`RamfError`]: framing, size and field violations
//! - [`SignedDataError`]: the authenticity envelope
//! - [`EnvelopedDataError`]: the confidentiality envelope
//!
//! [`MessageError`] wraps all of them for operations that cross layers.

use relaynet_crypto::CryptoError;
use relaynet_pki::CertificateError;
use thiserror::Error;

/// Errors raised while serializing or deserializing a RAMF message.
#[derive(Error, Debug)]
pub enum RamfError {
    /// The serialization exceeds the size limit.
    #[error("Message should not be larger than 9 MiB")]
    TooLarge {
        /// Length of the rejected serialization.
        length: usize,
    },

    /// The serialization cannot even hold the format signature.
    #[error("Serialization is too short to contain format signature")]
    TooShortForFormatSignature,

    /// The serialization does not start with the magic constant.
    #[error("Format signature should start with magic constant 'Relaynet'")]
    InvalidMagic,

    /// The concrete message type does not match the requested format.
    #[error("Expected concrete message type {expected:#04x} but got {actual:#04x}")]
    ConcreteTypeMismatch {
        /// Type of the requested format.
        expected: u8,
        /// Type found in the serialization.
        actual: u8,
    },

    /// The concrete message version does not match the requested format.
    #[error("Expected concrete message version {expected:#04x} but got {actual:#04x}")]
    ConcreteVersionMismatch {
        /// Version of the requested format.
        expected: u8,
        /// Version found in the serialization.
        actual: u8,
    },

    /// The signed plaintext is not DER.
    #[error("Message fields are not a DER-encoded")]
    FieldsNotDer,

    /// The signed plaintext is DER but not a SEQUENCE.
    #[error("Message fields are not a ASN.1 sequence")]
    FieldsNotSequence,

    /// The field sequence has the wrong number of items.
    #[error("Message fields should be a sequence of {expected} items (got {actual})")]
    InvalidFieldCount {
        /// Expected number of items.
        expected: usize,
        /// Number of items found.
        actual: usize,
    },

    /// The creation time is not a bare DATE-TIME value.
    #[error("Creation time should be an ASN.1 DATE-TIME value")]
    InvalidCreationTime,

    /// A field has the wrong tag or an invalid value.
    #[error("Field {field} is malformed: {reason}")]
    MalformedField {
        /// Name of the field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A text field contains characters outside the VisibleString range.
    #[error("{field} should only contain visible ASCII characters")]
    InvalidVisibleString {
        /// Name of the field.
        field: &'static str,
    },

    /// The creation date cannot be encoded as a DATE-TIME value.
    #[error("Creation date cannot be encoded as an ASN.1 DATE-TIME value: {0}")]
    CreationDateOutOfRange(String),

    /// The creation date is later than the reference time.
    #[error("Creation date is in the future")]
    CreationDateInFuture,

    /// The expiry date is earlier than the reference time.
    #[error("Message already expired")]
    Expired,

    /// DER encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(#[from] der::Error),
}

/// Errors raised by the authenticity envelope (CMS SignedData).
#[derive(Error, Debug)]
pub enum SignedDataError {
    /// The serialization is not a DER ContentInfo.
    #[error("SignedData value is not DER-encoded: {0}")]
    NotDer(String),

    /// The ContentInfo does not carry SignedData.
    #[error("ContentInfo does not wrap a SignedData value (got {0})")]
    NotSignedData(String),

    /// The SignedData structure is malformed.
    #[error("SignedData value is malformed: {0}")]
    Malformed(String),

    /// There is not exactly one SignerInfo.
    #[error("SignedData should contain exactly one SignerInfo (got {actual})")]
    InvalidSignerInfoCount {
        /// Number of SignerInfo values found.
        actual: usize,
    },

    /// The plaintext is not encapsulated.
    #[error("SignedData should encapsulate its plaintext")]
    MissingContent,

    /// None of the attached certificates matches the SignerInfo.
    #[error("Signer certificate should be attached")]
    SignerCertificateNotFound,

    /// An algorithm is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The messageDigest attribute does not match the plaintext.
    #[error("Message digest attribute does not match the plaintext")]
    DigestMismatch,

    /// The signature does not verify.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A certificate could not be used.
    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    /// Cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// DER encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(#[from] der::Error),
}

/// Errors raised by the confidentiality envelope (CMS EnvelopedData).
#[derive(Error, Debug)]
pub enum EnvelopedDataError {
    /// The serialization is not a DER ContentInfo.
    #[error("EnvelopedData value is not DER-encoded: {0}")]
    NotDer(String),

    /// The ContentInfo does not carry EnvelopedData.
    #[error("ContentInfo does not wrap an EnvelopedData value (got {0})")]
    NotEnvelopedData(String),

    /// The EnvelopedData structure is malformed.
    #[error("EnvelopedData value is malformed: {0}")]
    Malformed(String),

    /// There is not exactly one RecipientInfo.
    #[error("EnvelopedData should have exactly one RecipientInfo (got {actual})")]
    InvalidRecipientInfoCount {
        /// Number of RecipientInfo values found.
        actual: usize,
    },

    /// The RecipientInfo is neither key transport nor key agreement.
    #[error("Unsupported RecipientInfo (got {kind})")]
    UnsupportedRecipientInfo {
        /// Kind of RecipientInfo found.
        kind: String,
    },

    /// A key transport recipient is identified by key identifier only.
    #[error("Required recipient key id to be IssuerAndSerialNumber (got SubjectKeyIdentifier)")]
    KeyTransportRecipientWithoutSerialNumber,

    /// A key agreement RecipientInfo does not have exactly one encrypted key.
    #[error("KeyAgreeRecipientInfo should contain exactly one RecipientEncryptedKey (got {actual})")]
    InvalidRecipientEncryptedKeyCount {
        /// Number of RecipientEncryptedKey values found.
        actual: usize,
    },

    /// The key agreement originator is not an inline public key.
    #[error("Originator should be an OriginatorPublicKey (got {kind})")]
    UnsupportedOriginator {
        /// Kind of originator found.
        kind: &'static str,
    },

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(#[source] CryptoError),

    /// Decryption failed. The cause is kept for diagnostics only.
    #[error("Decryption failed: {0}")]
    Decryption(#[source] CryptoError),

    /// A certificate could not be used.
    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    /// DER encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(#[from] der::Error),
}

/// Errors raised by operations spanning several layers.
#[derive(Error, Debug)]
pub enum MessageError {
    /// RAMF framing or field violation.
    #[error(transparent)]
    Ramf(#[from] RamfError),

    /// Authenticity envelope failure.
    #[error(transparent)]
    SignedData(#[from] SignedDataError),

    /// Confidentiality envelope failure.
    #[error(transparent)]
    EnvelopedData(#[from] EnvelopedDataError),

    /// Certificate failure.
    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    /// Cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Result type for message operations.
pub type Result<T> = std::result::Result<T, MessageError>;
