//! RAMF framing and field serialization.
//!
//! ## Wire Format
//!
//! ```text
//! +-----------------+
//! | magic           | 8 bytes - ASCII "Relaynet"
//! +-----------------+
//! | concrete type   | 1 byte  - e.g. 0x50 for parcels
//! +-----------------+
//! | concrete version| 1 byte
//! +-----------------+
//! | SignedData      | Variable - CMS SignedData over the field sequence
//! +-----------------+
//! ```
//!
//! The signed plaintext is a DER SEQUENCE of five implicitly tagged fields:
//!
//! ```text
//! [0] recipient address   VisibleString
//! [1] message id          VisibleString
//! [2] creation time       DATE-TIME (YYYYMMDDHHMMSS, UTC)
//! [3] ttl                 INTEGER (seconds)
//! [4] payload             OCTET STRING
//! ```
//!
//! Deserialization checks the serialization strictly from left to right:
//! size, format signature, signature, then fields. The first failure wins.

pub mod codec;
pub mod fields;
pub mod message;

pub use codec::{deserialize, serialize, serialize_with_options};
pub use message::Message;

use relaynet_crypto::PrivateKey;

use crate::error::{RamfError, Result};
use crate::limits::{FORMAT_SIGNATURE_LENGTH, FORMAT_SIGNATURE_MAGIC};
use crate::options::SignatureOptions;

/// The first ten bytes of every RAMF serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormatSignature {
    /// Concrete message type.
    pub concrete_type: u8,
    /// Concrete message version.
    pub concrete_version: u8,
}

impl FormatSignature {
    /// Create a format signature.
    pub const fn new(concrete_type: u8, concrete_version: u8) -> Self {
        Self {
            concrete_type,
            concrete_version,
        }
    }

    /// The format signature of `F`.
    pub const fn of<F: RamfFormat>() -> Self {
        Self::new(F::CONCRETE_TYPE, F::CONCRETE_VERSION)
    }

    /// Encode as magic, type and version.
    pub fn to_bytes(&self) -> [u8; FORMAT_SIGNATURE_LENGTH] {
        let mut bytes = [0u8; FORMAT_SIGNATURE_LENGTH];
        bytes[..FORMAT_SIGNATURE_MAGIC.len()].copy_from_slice(FORMAT_SIGNATURE_MAGIC);
        bytes[FORMAT_SIGNATURE_LENGTH - 2] = self.concrete_type;
        bytes[FORMAT_SIGNATURE_LENGTH - 1] = self.concrete_version;
        bytes
    }

    /// Parse the format signature at the start of `serialization`.
    ///
    /// Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than ten bytes or the magic
    /// constant is wrong.
    pub fn parse(serialization: &[u8]) -> std::result::Result<Self, RamfError> {
        if serialization.len() < FORMAT_SIGNATURE_LENGTH {
            return Err(RamfError::TooShortForFormatSignature);
        }
        if &serialization[..FORMAT_SIGNATURE_MAGIC.len()] != FORMAT_SIGNATURE_MAGIC {
            return Err(RamfError::InvalidMagic);
        }
        Ok(Self::new(
            serialization[FORMAT_SIGNATURE_LENGTH - 2],
            serialization[FORMAT_SIGNATURE_LENGTH - 1],
        ))
    }
}

/// A concrete RAMF message format.
///
/// Implementors supply the format signature constants and the conversions
/// to and from the generic [`Message`]. Serialization is provided.
pub trait RamfFormat: Sized {
    /// Concrete message type octet.
    const CONCRETE_TYPE: u8;
    /// Concrete message version octet.
    const CONCRETE_VERSION: u8;

    /// The generic message fields.
    fn message(&self) -> &Message;

    /// Wrap a generic message.
    fn from_message(message: Message) -> Self;

    /// Serialize and sign with the default options.
    ///
    /// # Errors
    ///
    /// See [`codec::serialize`].
    fn serialize(&self, signing_key: &PrivateKey) -> Result<Vec<u8>> {
        codec::serialize(self, signing_key)
    }

    /// Serialize and sign with explicit options.
    ///
    /// # Errors
    ///
    /// See [`codec::serialize_with_options`].
    fn serialize_with_options(
        &self,
        signing_key: &PrivateKey,
        options: &SignatureOptions,
    ) -> Result<Vec<u8>> {
        codec::serialize_with_options(self, signing_key, options)
    }

    /// Deserialize and verify a message of this format.
    ///
    /// # Errors
    ///
    /// See [`codec::deserialize`].
    fn deserialize(serialization: &[u8]) -> Result<Self> {
        codec::deserialize(serialization)
    }
}
