//! Algorithm options for the signing and encryption envelopes.
//!
//! # Example
//!
//! ```
//! use relaynet_messages::options::EncryptionOptions;
//! use relaynet_crypto::{HashingAlgorithm, SymmetricAlgorithm};
//!
//! // Use defaults (AES-128, SHA-256)
//! let options = EncryptionOptions::default();
//!
//! // Or customize
//! let options = EncryptionOptions::new()
//!     .with_symmetric_algorithm(SymmetricAlgorithm::Aes256)
//!     .with_hashing_algorithm(HashingAlgorithm::Sha384);
//! ```

use relaynet_crypto::{HashingAlgorithm, SymmetricAlgorithm};
use serde::{Deserialize, Serialize};

/// Options for the confidentiality envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionOptions {
    /// AES variant for content encryption and key wrapping.
    pub symmetric_algorithm: SymmetricAlgorithm,
    /// Hash used by the key agreement KDF.
    pub hashing_algorithm: HashingAlgorithm,
}

impl EncryptionOptions {
    /// Create options with the default algorithms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symmetric algorithm.
    pub fn with_symmetric_algorithm(mut self, algorithm: SymmetricAlgorithm) -> Self {
        self.symmetric_algorithm = algorithm;
        self
    }

    /// Set the KDF hashing algorithm.
    pub fn with_hashing_algorithm(mut self, algorithm: HashingAlgorithm) -> Self {
        self.hashing_algorithm = algorithm;
        self
    }
}

/// Options for the authenticity envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureOptions {
    /// Hash used for the message digest and the signature.
    pub hashing_algorithm: HashingAlgorithm,
}

impl SignatureOptions {
    /// Create options with the default algorithm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hashing algorithm.
    pub fn with_hashing_algorithm(mut self, algorithm: HashingAlgorithm) -> Self {
        self.hashing_algorithm = algorithm;
        self
    }
}
