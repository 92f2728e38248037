//! # relaynet-crypto
//!
//! Cryptographic primitives for RAMF messages and their envelopes.
//!
//! This crate provides:
//! - **RSA** (PKCS#1 v1.5 signatures, RSA-OAEP key transport)
//! - **ECDSA / ECDH** over NIST P-256 and P-384
//! - **SHA-2** hashing and the ANSI X9.63 key derivation function
//! - **AES-CBC** content encryption and **AES key wrap** (RFC 3394)
//!
//! Every algorithm carries its ASN.1 object identifier so the CMS layer can
//! map between wire identifiers and implementations without any global state.
//!
//! ## Security
//!
//! All secret data uses `zeroize` for secure memory cleanup.
//! `Debug` output of private keys is redacted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod key_transport;
pub mod keys;
pub mod signature;
pub mod symmetric;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod test_support;

pub use error::{CryptoError, Result};
pub use hash::HashingAlgorithm;
pub use keys::{EcCurve, EcPrivateKey, EcPublicKey, KeyFamily, PrivateKey, PublicKey};
pub use symmetric::SymmetricAlgorithm;

pub use const_oid::ObjectIdentifier;
