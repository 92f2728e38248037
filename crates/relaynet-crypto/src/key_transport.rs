//! RSA-OAEP key transport.
//!
//! Content-encryption keys are encrypted with RSAES-OAEP using SHA-256 for
//! both the digest and MGF1, and an empty label.

use const_oid::ObjectIdentifier;
use rand::rngs::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// id-RSAES-OAEP (1.2.840.113549.1.1.7).
pub const ID_RSAES_OAEP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.7");
/// id-mgf1 (1.2.840.113549.1.1.8).
pub const ID_MGF1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.8");

/// Encrypt `key` for the holder of `recipient`.
///
/// # Errors
///
/// Returns an error if the key is too long for the modulus.
pub fn encrypt_key(recipient: &RsaPublicKey, key: &[u8]) -> Result<Vec<u8>> {
    recipient
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key)
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Decrypt a key encrypted with [`encrypt_key`].
///
/// # Errors
///
/// Returns an error if the ciphertext was not produced for this key.
pub fn decrypt_key(private_key: &RsaPrivateKey, encrypted: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), encrypted)
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::Decryption(e.to_string()))
}
