//! # relaynet-pki
//!
//! X.509 v3 certificates binding RAMF nodes to their keys.
//!
//! Provides:
//! - Certificate issuance with CA basic constraints and key identifiers
//! - DER serialization and deserialization
//! - Identity accessors (common name, issuer, serial number, public key)
//! - Equality and hashing by DER encoding

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod certificate;
pub mod error;

#[cfg(test)]
mod proptests;

pub use certificate::{Certificate, CertificateBuilder, MAX_PATH_LEN_CONSTRAINT};
pub use error::{CertificateError, Result};

pub use x509_cert::name::Name;
pub use x509_cert::serial_number::SerialNumber;
