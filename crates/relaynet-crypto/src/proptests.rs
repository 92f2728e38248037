//! Property-based tests for cryptographic primitives.
//!
//! These tests use proptest to verify cryptographic properties hold
//! for arbitrary inputs. They focus on:
//!
//! - Roundtrip properties (encrypt/decrypt, wrap/unwrap, sign/verify)
//! - Determinism of the key derivation function
//! - Error handling properties (invalid inputs are rejected)

use proptest::prelude::*;

use crate::signature::{sign, verify};
use crate::{EcCurve, EcPrivateKey, HashingAlgorithm, PrivateKey, SymmetricAlgorithm};

fn symmetric_algorithm() -> impl Strategy<Value = SymmetricAlgorithm> {
    prop::sample::select(SymmetricAlgorithm::ALL.to_vec())
}

fn hashing_algorithm() -> impl Strategy<Value = HashingAlgorithm> {
    prop::sample::select(HashingAlgorithm::ALL.to_vec())
}

// ==================== Content Encryption Property Tests ====================

proptest! {
    /// CBC encryption followed by decryption should return the original plaintext.
    #[test]
    fn cbc_roundtrip(algorithm in symmetric_algorithm(), plaintext: Vec<u8>) {
        let key = algorithm.generate_key();
        let (iv, ciphertext) = algorithm.encrypt_cbc(&key, &plaintext).unwrap();
        let decrypted = algorithm.decrypt_cbc(&key, &iv, &ciphertext).unwrap();
        prop_assert_eq!(plaintext, decrypted);
    }

    /// Ciphertexts are always padded to a whole number of blocks.
    #[test]
    fn cbc_ciphertext_is_block_aligned(plaintext in prop::collection::vec(any::<u8>(), 0..200)) {
        let algorithm = SymmetricAlgorithm::Aes128;
        let key = algorithm.generate_key();
        let (_, ciphertext) = algorithm.encrypt_cbc(&key, &plaintext).unwrap();
        prop_assert_eq!(ciphertext.len() % 16, 0);
        prop_assert!(ciphertext.len() > plaintext.len());
    }

    /// Keys of the wrong size are rejected.
    #[test]
    fn cbc_rejects_wrong_key_size(algorithm in symmetric_algorithm(), len in 0usize..64) {
        prop_assume!(len != algorithm.key_size());
        let key = vec![0u8; len];
        prop_assert!(algorithm.encrypt_cbc(&key, b"data").is_err());
    }
}

// ==================== Key Wrap Property Tests ====================

proptest! {
    /// Wrapping followed by unwrapping returns the original key.
    #[test]
    fn key_wrap_roundtrip(
        algorithm in symmetric_algorithm(),
        blocks in 2usize..8,
        seed: u8,
    ) {
        let kek = algorithm.generate_key();
        let key: Vec<u8> = (0..blocks * 8).map(|i| seed.wrapping_add(i as u8)).collect();
        let wrapped = algorithm.wrap_key(&kek, &key).unwrap();
        prop_assert_eq!(wrapped.len(), key.len() + 8);
        let unwrapped = algorithm.unwrap_key(&kek, &wrapped).unwrap();
        prop_assert_eq!(&unwrapped[..], &key[..]);
    }

    /// Any single-byte corruption of a wrapped key is detected.
    #[test]
    fn key_wrap_detects_corruption(index in 0usize..24, flip in 1u8..=255) {
        let algorithm = SymmetricAlgorithm::Aes128;
        let kek = algorithm.generate_key();
        let mut wrapped = algorithm.wrap_key(&kek, &algorithm.generate_key()).unwrap();
        wrapped[index] ^= flip;
        prop_assert!(algorithm.unwrap_key(&kek, &wrapped).is_err());
    }
}

// ==================== Key Derivation Property Tests ====================

proptest! {
    /// The KDF is deterministic and honours the requested length.
    #[test]
    fn kdf_deterministic(
        hashing in hashing_algorithm(),
        secret in prop::collection::vec(any::<u8>(), 1..96),
        info in prop::collection::vec(any::<u8>(), 0..64),
        len in 1usize..130,
    ) {
        let a = hashing.x963_kdf(&secret, &info, len).unwrap();
        let b = hashing.x963_kdf(&secret, &info, len).unwrap();
        prop_assert_eq!(a.len(), len);
        prop_assert_eq!(&a[..], &b[..]);
    }

    /// Shorter outputs are prefixes of longer ones.
    #[test]
    fn kdf_prefix_property(
        hashing in hashing_algorithm(),
        secret in prop::collection::vec(any::<u8>(), 1..64),
        short in 1usize..64,
        extra in 1usize..64,
    ) {
        let short_output = hashing.x963_kdf(&secret, b"", short).unwrap();
        let long_output = hashing.x963_kdf(&secret, b"", short + extra).unwrap();
        prop_assert_eq!(&short_output[..], &long_output[..short]);
    }
}

// ==================== Signature Property Tests ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// ECDSA signatures verify over arbitrary messages.
    #[test]
    fn ecdsa_sign_verify(message: Vec<u8>, hashing in hashing_algorithm()) {
        let key = PrivateKey::generate_ec(EcCurve::P256);
        let signature = sign(&key, &message, hashing).unwrap();
        prop_assert!(verify(&key.public_key(), &message, &signature, hashing).is_ok());
    }

    /// ECDH shared secrets agree between both parties.
    #[test]
    fn ecdh_agreement(_seed in any::<u64>()) {
        let alice = EcPrivateKey::generate(EcCurve::P256);
        let bob = EcPrivateKey::generate(EcCurve::P256);
        let ab = alice.diffie_hellman(&bob.public_key()).unwrap();
        let ba = bob.diffie_hellman(&alice.public_key()).unwrap();
        prop_assert_eq!(&ab[..], &ba[..]);
    }
}
