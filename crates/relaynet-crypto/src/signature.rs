//! Digital signatures: RSA PKCS#1 v1.5 and ECDSA over SHA-2.
//!
//! The message is hashed with the requested [`HashingAlgorithm`] and the
//! digest is signed directly. ECDSA signatures use the DER
//! `Ecdsa-Sig-Value` encoding expected by CMS and X.509.

use const_oid::ObjectIdentifier;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rsa::Pkcs1v15Sign;
use sha2::{Sha256, Sha384, Sha512};

use crate::keys::{EcPrivateKey, EcPublicKey};
use crate::{CryptoError, HashingAlgorithm, KeyFamily, PrivateKey, PublicKey, Result};

/// sha256WithRSAEncryption (1.2.840.113549.1.1.11).
pub const ID_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
/// sha384WithRSAEncryption (1.2.840.113549.1.1.12).
pub const ID_SHA384_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
/// sha512WithRSAEncryption (1.2.840.113549.1.1.13).
pub const ID_SHA512_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
/// ecdsa-with-SHA256 (1.2.840.10045.4.3.2).
pub const ID_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
/// ecdsa-with-SHA384 (1.2.840.10045.4.3.3).
pub const ID_ECDSA_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");
/// ecdsa-with-SHA512 (1.2.840.10045.4.3.4).
pub const ID_ECDSA_WITH_SHA512: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");

const SIGNATURE_ALGORITHMS: [(ObjectIdentifier, KeyFamily, HashingAlgorithm); 6] = [
    (ID_SHA256_WITH_RSA, KeyFamily::Rsa, HashingAlgorithm::Sha256),
    (ID_SHA384_WITH_RSA, KeyFamily::Rsa, HashingAlgorithm::Sha384),
    (ID_SHA512_WITH_RSA, KeyFamily::Rsa, HashingAlgorithm::Sha512),
    (ID_ECDSA_WITH_SHA256, KeyFamily::Ec, HashingAlgorithm::Sha256),
    (ID_ECDSA_WITH_SHA384, KeyFamily::Ec, HashingAlgorithm::Sha384),
    (ID_ECDSA_WITH_SHA512, KeyFamily::Ec, HashingAlgorithm::Sha512),
];

/// The signature algorithm OID for a key family and hash.
pub fn signature_algorithm_oid(family: KeyFamily, hashing: HashingAlgorithm) -> ObjectIdentifier {
    match (family, hashing) {
        (KeyFamily::Rsa, HashingAlgorithm::Sha256) => ID_SHA256_WITH_RSA,
        (KeyFamily::Rsa, HashingAlgorithm::Sha384) => ID_SHA384_WITH_RSA,
        (KeyFamily::Rsa, HashingAlgorithm::Sha512) => ID_SHA512_WITH_RSA,
        (KeyFamily::Ec, HashingAlgorithm::Sha256) => ID_ECDSA_WITH_SHA256,
        (KeyFamily::Ec, HashingAlgorithm::Sha384) => ID_ECDSA_WITH_SHA384,
        (KeyFamily::Ec, HashingAlgorithm::Sha512) => ID_ECDSA_WITH_SHA512,
    }
}

/// Resolve a signature algorithm OID into its key family and hash.
pub fn parse_signature_algorithm(oid: &ObjectIdentifier) -> Option<(KeyFamily, HashingAlgorithm)> {
    SIGNATURE_ALGORITHMS
        .iter()
        .find(|(candidate, _, _)| candidate == oid)
        .map(|(_, family, hashing)| (*family, *hashing))
}

/// Sign `data` with `key`.
///
/// # Errors
///
/// Returns an error if the underlying signer fails.
pub fn sign(key: &PrivateKey, data: &[u8], hashing: HashingAlgorithm) -> Result<Vec<u8>> {
    let digest = hashing.digest(data);
    match key {
        PrivateKey::Rsa(key) => key
            .sign(pkcs1v15_scheme(hashing), &digest)
            .map_err(|e| CryptoError::Signing(e.to_string())),
        PrivateKey::Ec(EcPrivateKey::P256(key)) => {
            let signer = p256::ecdsa::SigningKey::from(key);
            let signature: p256::ecdsa::Signature = signer
                .sign_prehash(&digest)
                .map_err(|e| CryptoError::Signing(e.to_string()))?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        PrivateKey::Ec(EcPrivateKey::P384(key)) => {
            let signer = p384::ecdsa::SigningKey::from(key);
            let signature: p384::ecdsa::Signature = signer
                .sign_prehash(&digest)
                .map_err(|e| CryptoError::Signing(e.to_string()))?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
    }
}

/// Verify a signature produced by [`sign`].
///
/// # Errors
///
/// Returns [`CryptoError::SignatureVerification`] if the signature is
/// malformed or does not match.
pub fn verify(
    key: &PublicKey,
    data: &[u8],
    signature: &[u8],
    hashing: HashingAlgorithm,
) -> Result<()> {
    let digest = hashing.digest(data);
    match key {
        PublicKey::Rsa(key) => key
            .verify(pkcs1v15_scheme(hashing), &digest, signature)
            .map_err(|_| CryptoError::SignatureVerification),
        PublicKey::Ec(EcPublicKey::P256(key)) => {
            let signature = p256::ecdsa::Signature::from_der(signature)
                .map_err(|_| CryptoError::SignatureVerification)?;
            p256::ecdsa::VerifyingKey::from(key)
                .verify_prehash(&digest, &signature)
                .map_err(|_| CryptoError::SignatureVerification)
        }
        PublicKey::Ec(EcPublicKey::P384(key)) => {
            let signature = p384::ecdsa::Signature::from_der(signature)
                .map_err(|_| CryptoError::SignatureVerification)?;
            p384::ecdsa::VerifyingKey::from(key)
                .verify_prehash(&digest, &signature)
                .map_err(|_| CryptoError::SignatureVerification)
        }
    }
}

fn pkcs1v15_scheme(hashing: HashingAlgorithm) -> Pkcs1v15Sign {
    match hashing {
        HashingAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashingAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashingAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}
