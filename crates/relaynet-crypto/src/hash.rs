//! SHA-2 hashing and the ANSI X9.63 key derivation function.
//!
//! The X9.63 KDF is the one used by `dhSinglePass-stdDH-sha*kdf-scheme`
//! (RFC 5753), so each hashing algorithm also knows its ECDH scheme OID.
//!
//! ```text
//! K(i) = Hash(Z || Counter(i) || SharedInfo), Counter(1) = 0x00000001
//! KEK  = K(1) || K(2) || ... truncated to the requested length
//! ```

use ansi_x963_kdf::derive_key_into;
use const_oid::ObjectIdentifier;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// SHA-256 (2.16.840.1.101.3.4.2.1).
pub const ID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
/// SHA-384 (2.16.840.1.101.3.4.2.2).
pub const ID_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
/// SHA-512 (2.16.840.1.101.3.4.2.3).
pub const ID_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");

/// dhSinglePass-stdDH-sha256kdf-scheme (1.3.132.1.11.1).
pub const ID_ECDH_SHA256_KDF: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.1.11.1");
/// dhSinglePass-stdDH-sha384kdf-scheme (1.3.132.1.11.2).
pub const ID_ECDH_SHA384_KDF: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.1.11.2");
/// dhSinglePass-stdDH-sha512kdf-scheme (1.3.132.1.11.3).
pub const ID_ECDH_SHA512_KDF: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.1.11.3");

/// Hashing algorithms supported for digests, signatures and key derivation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashingAlgorithm {
    /// SHA-256.
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashingAlgorithm {
    /// All supported algorithms.
    pub const ALL: [HashingAlgorithm; 3] = [Self::Sha256, Self::Sha384, Self::Sha512];

    /// Digest length in bytes.
    pub const fn output_size(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// The digest algorithm OID.
    pub const fn oid(&self) -> ObjectIdentifier {
        match self {
            Self::Sha256 => ID_SHA256,
            Self::Sha384 => ID_SHA384,
            Self::Sha512 => ID_SHA512,
        }
    }

    /// Look up an algorithm by its digest OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|algorithm| algorithm.oid() == *oid)
    }

    /// The OID of the ECDH key agreement scheme whose KDF uses this hash.
    pub const fn ecdh_kdf_oid(&self) -> ObjectIdentifier {
        match self {
            Self::Sha256 => ID_ECDH_SHA256_KDF,
            Self::Sha384 => ID_ECDH_SHA384_KDF,
            Self::Sha512 => ID_ECDH_SHA512_KDF,
        }
    }

    /// Look up an algorithm by its ECDH key agreement scheme OID.
    pub fn from_ecdh_kdf_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.ecdh_kdf_oid() == *oid)
    }

    /// Compute the digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Derive `output_len` bytes from a shared secret with the X9.63 KDF.
    ///
    /// # Errors
    ///
    /// Returns an error if `output_len` is zero or `secret` is empty.
    pub fn x963_kdf(
        &self,
        secret: &[u8],
        shared_info: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        if output_len == 0 {
            return Err(CryptoError::KeyAgreement(
                "KDF output length must not be zero".to_string(),
            ));
        }
        let mut output = Zeroizing::new(vec![0u8; output_len]);
        match self {
            Self::Sha256 => derive_key_into::<sha2_x963::Sha256>(secret, shared_info, &mut output),
            Self::Sha384 => derive_key_into::<sha2_x963::Sha384>(secret, shared_info, &mut output),
            Self::Sha512 => derive_key_into::<sha2_x963::Sha512>(secret, shared_info, &mut output),
        }
        .map_err(|e| CryptoError::KeyAgreement(format!("X9.63 KDF failed: {e:?}")))?;
        Ok(output)
    }
}
