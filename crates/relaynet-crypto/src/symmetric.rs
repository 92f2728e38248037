//! AES content encryption (CBC with PKCS#7 padding) and AES key wrap.
//!
//! ## Security Notes
//!
//! - Content-encryption keys are generated with OsRng and zeroized on drop
//! - A fresh random IV is generated for every encryption
//! - CBC provides confidentiality only; authenticity comes from the
//!   signature layer
//! - Key wrap (RFC 3394) detects corruption of the wrapped key

use aes::cipher::generic_array::GenericArray;
use aes::{Aes128, Aes192, Aes256};
use aes_kw::{KekAes128, KekAes192, KekAes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use const_oid::ObjectIdentifier;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// Size of the AES block and therefore of the CBC IV, in bytes.
pub const IV_SIZE: usize = 16;

/// aes128-CBC (2.16.840.1.101.3.4.1.2).
pub const ID_AES128_CBC: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.2");
/// aes192-CBC (2.16.840.1.101.3.4.1.22).
pub const ID_AES192_CBC: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.22");
/// aes256-CBC (2.16.840.1.101.3.4.1.42).
pub const ID_AES256_CBC: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.42");

/// id-aes128-wrap (2.16.840.1.101.3.4.1.5).
pub const ID_AES128_WRAP: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.5");
/// id-aes192-wrap (2.16.840.1.101.3.4.1.25).
pub const ID_AES192_WRAP: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.25");
/// id-aes256-wrap (2.16.840.1.101.3.4.1.45).
pub const ID_AES256_WRAP: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.45");

/// AES variants used for content encryption and key wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetricAlgorithm {
    /// AES with a 128-bit key.
    #[default]
    Aes128,
    /// AES with a 192-bit key.
    Aes192,
    /// AES with a 256-bit key.
    Aes256,
}

impl SymmetricAlgorithm {
    /// All supported algorithms.
    pub const ALL: [SymmetricAlgorithm; 3] = [Self::Aes128, Self::Aes192, Self::Aes256];

    /// Key length in bytes.
    pub const fn key_size(&self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// The content-encryption (CBC) algorithm OID.
    pub const fn cbc_oid(&self) -> ObjectIdentifier {
        match self {
            Self::Aes128 => ID_AES128_CBC,
            Self::Aes192 => ID_AES192_CBC,
            Self::Aes256 => ID_AES256_CBC,
        }
    }

    /// Look up an algorithm by its CBC OID.
    pub fn from_cbc_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|algorithm| algorithm.cbc_oid() == *oid)
    }

    /// The key-wrap algorithm OID.
    pub const fn key_wrap_oid(&self) -> ObjectIdentifier {
        match self {
            Self::Aes128 => ID_AES128_WRAP,
            Self::Aes192 => ID_AES192_WRAP,
            Self::Aes256 => ID_AES256_WRAP,
        }
    }

    /// Look up an algorithm by its key-wrap OID.
    pub fn from_key_wrap_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.key_wrap_oid() == *oid)
    }

    /// Generate a random key of the right size for this algorithm.
    pub fn generate_key(&self) -> Zeroizing<Vec<u8>> {
        let mut key = Zeroizing::new(vec![0u8; self.key_size()]);
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt `plaintext` in CBC mode under a fresh random IV.
    ///
    /// Returns the IV and the padded ciphertext.
    ///
    /// # Errors
    ///
    /// Returns an error if the key has the wrong length.
    pub fn encrypt_cbc(&self, key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        self.check_key(key)?;
        let mut iv = vec![0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = match self {
            Self::Aes128 => cbc_encryptor::<Aes128>(key, &iv)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Self::Aes192 => cbc_encryptor::<Aes192>(key, &iv)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Self::Aes256 => cbc_encryptor::<Aes256>(key, &iv)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        };
        Ok((iv, ciphertext))
    }

    /// Decrypt a CBC ciphertext and strip its padding.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or IV has the wrong length, or if the
    /// padding is invalid.
    pub fn decrypt_cbc(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_key(key)?;
        if iv.len() != IV_SIZE {
            return Err(CryptoError::InvalidIvLength {
                expected: IV_SIZE,
                actual: iv.len(),
            });
        }

        let result = match self {
            Self::Aes128 => cbc_decryptor::<Aes128>(key, iv)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Self::Aes192 => cbc_decryptor::<Aes192>(key, iv)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Self::Aes256 => cbc_decryptor::<Aes256>(key, iv)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        result.map_err(|_| CryptoError::Decryption("invalid ciphertext padding".to_string()))
    }

    /// Wrap a content-encryption key under a key-encryption key (RFC 3394).
    ///
    /// # Errors
    ///
    /// Returns an error if the KEK has the wrong length or the key to wrap is
    /// not a multiple of 8 bytes.
    pub fn wrap_key(&self, kek: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.check_key(kek)?;
        let result = match self {
            Self::Aes128 => KekAes128::new(GenericArray::from_slice(kek)).wrap_vec(key),
            Self::Aes192 => KekAes192::new(GenericArray::from_slice(kek)).wrap_vec(key),
            Self::Aes256 => KekAes256::new(GenericArray::from_slice(kek)).wrap_vec(key),
        };
        result.map_err(|e| CryptoError::KeyWrap(e.to_string()))
    }

    /// Unwrap a key wrapped with [`wrap_key`](Self::wrap_key).
    ///
    /// # Errors
    ///
    /// Returns an error if the KEK has the wrong length or the integrity
    /// check fails.
    pub fn unwrap_key(&self, kek: &[u8], wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.check_key(kek)?;
        let result = match self {
            Self::Aes128 => KekAes128::new(GenericArray::from_slice(kek)).unwrap_vec(wrapped),
            Self::Aes192 => KekAes192::new(GenericArray::from_slice(kek)).unwrap_vec(wrapped),
            Self::Aes256 => KekAes256::new(GenericArray::from_slice(kek)).unwrap_vec(wrapped),
        };
        result
            .map(Zeroizing::new)
            .map_err(|e| CryptoError::KeyWrap(e.to_string()))
    }

    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.key_size() {
            return Err(CryptoError::InvalidKeyLength {
                expected: self.key_size(),
                actual: key.len(),
            });
        }
        Ok(())
    }
}

fn cbc_encryptor<C>(key: &[u8], iv: &[u8]) -> Result<cbc::Encryptor<C>>
where
    C: aes::cipher::BlockEncryptMut + aes::cipher::BlockCipher + aes::cipher::KeyInit,
{
    cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(|e| CryptoError::Encryption(e.to_string()))
}

fn cbc_decryptor<C>(key: &[u8], iv: &[u8]) -> Result<cbc::Decryptor<C>>
where
    C: aes::cipher::BlockDecryptMut + aes::cipher::BlockCipher + aes::cipher::KeyInit,
{
    cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(|e| CryptoError::Decryption(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cbc_roundtrip_all_algorithms() {
        for algorithm in SymmetricAlgorithm::ALL {
            let key = algorithm.generate_key();
            let (iv, ciphertext) = algorithm.encrypt_cbc(&key, b"Hello, RAMF!").unwrap();
            assert_eq!(iv.len(), IV_SIZE);
            let plaintext = algorithm.decrypt_cbc(&key, &iv, &ciphertext).unwrap();
            assert_eq!(plaintext, b"Hello, RAMF!");
        }
    }

    #[test]
    fn test_cbc_pads_to_block_size() {
        let algorithm = SymmetricAlgorithm::Aes128;
        let key = algorithm.generate_key();
        let (_, empty) = algorithm.encrypt_cbc(&key, b"").unwrap();
        assert_eq!(empty.len(), 16);
        let (_, full_block) = algorithm.encrypt_cbc(&key, &[0u8; 16]).unwrap();
        assert_eq!(full_block.len(), 32);
    }

    #[test]
    fn test_cbc_wrong_key_length() {
        let result = SymmetricAlgorithm::Aes256.encrypt_cbc(&[0u8; 16], b"data");
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_cbc_wrong_iv_length() {
        let algorithm = SymmetricAlgorithm::Aes128;
        let key = algorithm.generate_key();
        let result = algorithm.decrypt_cbc(&key, &[0u8; 8], &[0u8; 16]);
        assert!(matches!(result, Err(CryptoError::InvalidIvLength { .. })));
    }

    #[test]
    fn test_cbc_truncated_ciphertext_fails() {
        let algorithm = SymmetricAlgorithm::Aes128;
        let key = algorithm.generate_key();
        let (iv, ciphertext) = algorithm.encrypt_cbc(&key, b"some plaintext").unwrap();
        let result = algorithm.decrypt_cbc(&key, &iv, &ciphertext[..ciphertext.len() - 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_key_wrap_roundtrip() {
        for algorithm in SymmetricAlgorithm::ALL {
            let kek = algorithm.generate_key();
            let cek = SymmetricAlgorithm::Aes128.generate_key();
            let wrapped = algorithm.wrap_key(&kek, &cek).unwrap();
            assert_eq!(wrapped.len(), cek.len() + 8);
            let unwrapped = algorithm.unwrap_key(&kek, &wrapped).unwrap();
            assert_eq!(&unwrapped[..], &cek[..]);
        }
    }

    #[test]
    fn test_key_wrap_rfc3394_vector() {
        // RFC 3394 section 4.1: 128-bit key data with a 128-bit KEK.
        let kek = hex::decode("000102030405060708090A0B0C0D0E0F").unwrap();
        let data = hex::decode("00112233445566778899AABBCCDDEEFF").unwrap();
        let wrapped = SymmetricAlgorithm::Aes128.wrap_key(&kek, &data).unwrap();
        assert_eq!(
            hex::encode_upper(wrapped),
            "1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5"
        );
    }

    #[test]
    fn test_unwrap_with_wrong_kek_fails() {
        let algorithm = SymmetricAlgorithm::Aes128;
        let wrapped = algorithm
            .wrap_key(&algorithm.generate_key(), &algorithm.generate_key())
            .unwrap();
        assert!(algorithm
            .unwrap_key(&algorithm.generate_key(), &wrapped)
            .is_err());
    }

    #[test]
    fn test_oid_lookup() {
        for algorithm in SymmetricAlgorithm::ALL {
            assert_eq!(
                SymmetricAlgorithm::from_cbc_oid(&algorithm.cbc_oid()),
                Some(algorithm)
            );
            assert_eq!(
                SymmetricAlgorithm::from_key_wrap_oid(&algorithm.key_wrap_oid()),
                Some(algorithm)
            );
        }
        assert_eq!(SymmetricAlgorithm::from_cbc_oid(&ID_AES128_WRAP), None);
    }
}
