//! # relaynet-messages
//!
//! RAMF message serialization and the CMS envelopes around it.
//!
//! This crate provides:
//! - **RAMF codec**: format signature, signed five-field sequence, 9 MiB limit
//! - **Formats**: [`Parcel`], [`Cargo`] and [`CargoCollectionAuthorization`]
//! - **Authenticity**: CMS SignedData with attached certificates
//! - **Confidentiality**: CMS EnvelopedData with key transport (RSA-OAEP)
//!   or key agreement (ECDH, X9.63 KDF, AES key wrap)
//!
//! ## Layering
//!
//! ```text
//! Message -> field sequence -> SignedData -> "Relaynet" + type + version + SignedData
//! ```
//!
//! The confidentiality envelope is independent of the codec: callers encrypt
//! the payload before building a message, or the whole serialization after.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cms;
pub mod enveloped_data;
pub mod error;
pub mod formats;
pub mod limits;
pub mod options;
pub mod ramf;
pub mod signed_data;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod test_support;

pub use enveloped_data::{
    EnvelopedData, RecipientIdentifier, SessionEnvelopedData, SessionKey, SessionRecipient,
    SessionlessEnvelopedData,
};
pub use error::{EnvelopedDataError, MessageError, RamfError, Result, SignedDataError};
pub use formats::{Cargo, CargoCollectionAuthorization, Parcel};
pub use options::{EncryptionOptions, SignatureOptions};
pub use ramf::{FormatSignature, Message, RamfFormat};
pub use signed_data::SignedData;
