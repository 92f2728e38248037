//! Asymmetric key pairs: RSA and elliptic-curve (P-256, P-384).
//!
//! Keys are modelled as tagged unions so that every operation dispatches on
//! the key family explicitly:
//!
//! ```text
//! PrivateKey
//!   +-- Rsa(RsaPrivateKey)          signatures, RSA-OAEP key transport
//!   +-- Ec(EcPrivateKey)            signatures, ECDH key agreement
//!         +-- P256(SecretKey)
//!         +-- P384(SecretKey)
//! ```
//!
//! Public keys are exchanged as DER-encoded SubjectPublicKeyInfo structures.
//!
//! ## Security Notes
//!
//! - Private keys are never printed; `Debug` output is redacted
//! - ECDH shared secrets are zeroized on drop

use const_oid::ObjectIdentifier;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, PrivateKeyInfo};
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use spki::{DecodePublicKey, EncodePublicKey, SubjectPublicKeyInfoRef};
use zeroize::Zeroizing;

use der::Decode;

use crate::{CryptoError, Result};

/// Smallest RSA modulus accepted for new keys, in bits.
pub const MIN_RSA_MODULUS_BITS: usize = 2048;

/// rsaEncryption (1.2.840.113549.1.1.1).
pub const ID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
/// id-ecPublicKey (1.2.840.10045.2.1).
pub const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// secp256r1 (1.2.840.10045.3.1.7).
pub const ID_SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
/// secp384r1 (1.3.132.0.34).
pub const ID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// Key algorithm family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// RSA keys.
    Rsa,
    /// Elliptic-curve keys.
    Ec,
}

/// Supported elliptic curves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EcCurve {
    /// NIST P-256 (secp256r1).
    #[default]
    P256,
    /// NIST P-384 (secp384r1).
    P384,
}

impl EcCurve {
    /// The named-curve OID.
    pub const fn oid(&self) -> ObjectIdentifier {
        match self {
            Self::P256 => ID_SECP256R1,
            Self::P384 => ID_SECP384R1,
        }
    }

    /// Look up a curve by its named-curve OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        [Self::P256, Self::P384]
            .into_iter()
            .find(|curve| curve.oid() == *oid)
    }

    /// Length of an uncompressed SEC1 point on this curve.
    pub const fn uncompressed_point_size(&self) -> usize {
        match self {
            Self::P256 => 65,
            Self::P384 => 97,
        }
    }
}

// ==================== Elliptic-curve keys ====================

/// An elliptic-curve private key.
#[derive(Clone)]
pub enum EcPrivateKey {
    /// P-256 key.
    P256(p256::SecretKey),
    /// P-384 key.
    P384(p384::SecretKey),
}

impl EcPrivateKey {
    /// Generate a new random key on `curve`.
    pub fn generate(curve: EcCurve) -> Self {
        match curve {
            EcCurve::P256 => Self::P256(p256::SecretKey::random(&mut OsRng)),
            EcCurve::P384 => Self::P384(p384::SecretKey::random(&mut OsRng)),
        }
    }

    /// The curve this key lives on.
    pub fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
        }
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> EcPublicKey {
        match self {
            Self::P256(key) => EcPublicKey::P256(key.public_key()),
            Self::P384(key) => EcPublicKey::P384(key.public_key()),
        }
    }

    /// Perform ECDH with `peer` and return the raw shared secret (the
    /// x-coordinate of the shared point).
    ///
    /// # Errors
    ///
    /// Returns an error if `peer` is on a different curve.
    pub fn diffie_hellman(&self, peer: &EcPublicKey) -> Result<Zeroizing<Vec<u8>>> {
        match (self, peer) {
            (Self::P256(secret), EcPublicKey::P256(public)) => {
                let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            (Self::P384(secret), EcPublicKey::P384(public)) => {
                let shared = p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            _ => Err(CryptoError::KeyAgreement(format!(
                "curve mismatch: private key is {:?}, peer key is {:?}",
                self.curve(),
                peer.curve()
            ))),
        }
    }
}

impl std::fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EcPrivateKey({:?}, [REDACTED])", self.curve())
    }
}

/// An elliptic-curve public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EcPublicKey {
    /// P-256 key.
    P256(p256::PublicKey),
    /// P-384 key.
    P384(p384::PublicKey),
}

impl EcPublicKey {
    /// The curve this key lives on.
    pub fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
        }
    }

    /// Encode as an uncompressed SEC1 point.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        match self {
            Self::P256(key) => key.to_encoded_point(false).as_bytes().to_vec(),
            Self::P384(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    /// Decode a SEC1 point on `curve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid point on the curve.
    pub fn from_sec1_bytes(curve: EcCurve, bytes: &[u8]) -> Result<Self> {
        let key = match curve {
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(bytes).map(Self::P256),
            EcCurve::P384 => p384::PublicKey::from_sec1_bytes(bytes).map(Self::P384),
        };
        key.map_err(|_| CryptoError::InvalidKey(format!("not a valid {curve:?} point")))
    }
}

// ==================== Generic keys ====================

/// A private key of any supported family.
#[derive(Clone)]
pub enum PrivateKey {
    /// RSA private key.
    Rsa(RsaPrivateKey),
    /// Elliptic-curve private key.
    Ec(EcPrivateKey),
}

impl PrivateKey {
    /// Generate an RSA key with a modulus of `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns an error if `bits` is below [`MIN_RSA_MODULUS_BITS`].
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        if bits < MIN_RSA_MODULUS_BITS {
            return Err(CryptoError::KeyGeneration(format!(
                "RSA modulus must be at least {MIN_RSA_MODULUS_BITS} bits (got {bits})"
            )));
        }
        RsaPrivateKey::new(&mut OsRng, bits)
            .map(Self::Rsa)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))
    }

    /// Generate an elliptic-curve key on `curve`.
    pub fn generate_ec(curve: EcCurve) -> Self {
        Self::Ec(EcPrivateKey::generate(curve))
    }

    /// The key family.
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Rsa(_) => KeyFamily::Rsa,
            Self::Ec(_) => KeyFamily::Ec,
        }
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            Self::Ec(key) => PublicKey::Ec(key.public_key()),
        }
    }

    /// Encode as a DER PKCS#8 PrivateKeyInfo.
    ///
    /// # Security
    ///
    /// The returned buffer holds secret material and is zeroized on drop.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let document = match self {
            Self::Rsa(key) => key.to_pkcs8_der(),
            Self::Ec(EcPrivateKey::P256(key)) => key.to_pkcs8_der(),
            Self::Ec(EcPrivateKey::P384(key)) => key.to_pkcs8_der(),
        }
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Decode a DER PKCS#8 PrivateKeyInfo.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure is malformed or the algorithm or
    /// curve is unsupported.
    pub fn from_pkcs8_der(bytes: &[u8]) -> Result<Self> {
        let info =
            PrivateKeyInfo::from_der(bytes).map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let invalid = |e: pkcs8::Error| CryptoError::InvalidKey(e.to_string());

        if info.algorithm.oid == ID_RSA_ENCRYPTION {
            return RsaPrivateKey::from_pkcs8_der(bytes)
                .map(Self::Rsa)
                .map_err(invalid);
        }
        if info.algorithm.oid != ID_EC_PUBLIC_KEY {
            return Err(CryptoError::UnsupportedKey(format!(
                "key algorithm {}",
                info.algorithm.oid
            )));
        }
        match ec_curve_parameter(info.algorithm.parameters_oid().ok())? {
            EcCurve::P256 => p256::SecretKey::from_pkcs8_der(bytes)
                .map(|key| Self::Ec(EcPrivateKey::P256(key)))
                .map_err(invalid),
            EcCurve::P384 => p384::SecretKey::from_pkcs8_der(bytes)
                .map(|key| Self::Ec(EcPrivateKey::P384(key)))
                .map_err(invalid),
        }
    }
}

impl From<EcPrivateKey> for PrivateKey {
    fn from(key: EcPrivateKey) -> Self {
        Self::Ec(key)
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self::Rsa(key)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa(_) => write!(f, "PrivateKey(Rsa, [REDACTED])"),
            Self::Ec(key) => write!(f, "PrivateKey({key:?})"),
        }
    }
}

/// A public key of any supported family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    /// RSA public key.
    Rsa(RsaPublicKey),
    /// Elliptic-curve public key.
    Ec(EcPublicKey),
}

impl PublicKey {
    /// The key family.
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Rsa(_) => KeyFamily::Rsa,
            Self::Ec(_) => KeyFamily::Ec,
        }
    }

    /// Encode as a DER SubjectPublicKeyInfo.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            Self::Rsa(key) => key.to_public_key_der(),
            Self::Ec(EcPublicKey::P256(key)) => key.to_public_key_der(),
            Self::Ec(EcPublicKey::P384(key)) => key.to_public_key_der(),
        }
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Decode a DER SubjectPublicKeyInfo.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure is malformed or the algorithm or
    /// curve is unsupported.
    pub fn from_spki_der(bytes: &[u8]) -> Result<Self> {
        let info = SubjectPublicKeyInfoRef::from_der(bytes)
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let invalid = |e: spki::Error| CryptoError::InvalidKey(e.to_string());

        if info.algorithm.oid == ID_RSA_ENCRYPTION {
            return RsaPublicKey::from_public_key_der(bytes)
                .map(Self::Rsa)
                .map_err(invalid);
        }
        if info.algorithm.oid != ID_EC_PUBLIC_KEY {
            return Err(CryptoError::UnsupportedKey(format!(
                "key algorithm {}",
                info.algorithm.oid
            )));
        }
        match ec_curve_parameter(info.algorithm.parameters_oid().ok())? {
            EcCurve::P256 => p256::PublicKey::from_public_key_der(bytes)
                .map(|key| Self::Ec(EcPublicKey::P256(key)))
                .map_err(invalid),
            EcCurve::P384 => p384::PublicKey::from_public_key_der(bytes)
                .map(|key| Self::Ec(EcPublicKey::P384(key)))
                .map_err(invalid),
        }
    }
}

impl From<EcPublicKey> for PublicKey {
    fn from(key: EcPublicKey) -> Self {
        Self::Ec(key)
    }
}

fn ec_curve_parameter(oid: Option<ObjectIdentifier>) -> Result<EcCurve> {
    let oid = oid.ok_or_else(|| CryptoError::InvalidKey("missing named curve".to_string()))?;
    EcCurve::from_oid(&oid).ok_or_else(|| CryptoError::UnsupportedKey(format!("curve {oid}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::rsa_key;

    #[test]
    fn test_ec_generate_curves() {
        assert_eq!(EcPrivateKey::generate(EcCurve::P256).curve(), EcCurve::P256);
        assert_eq!(EcPrivateKey::generate(EcCurve::P384).curve(), EcCurve::P384);
    }

    #[test]
    fn test_ecdh_agreement_is_symmetric() {
        for curve in [EcCurve::P256, EcCurve::P384] {
            let alice = EcPrivateKey::generate(curve);
            let bob = EcPrivateKey::generate(curve);
            let ab = alice.diffie_hellman(&bob.public_key()).unwrap();
            let ba = bob.diffie_hellman(&alice.public_key()).unwrap();
            assert_eq!(&ab[..], &ba[..]);
        }
    }

    #[test]
    fn test_ecdh_curve_mismatch() {
        let alice = EcPrivateKey::generate(EcCurve::P256);
        let bob = EcPrivateKey::generate(EcCurve::P384);
        let result = alice.diffie_hellman(&bob.public_key());
        assert!(matches!(result, Err(CryptoError::KeyAgreement(_))));
    }

    #[test]
    fn test_sec1_roundtrip() {
        for curve in [EcCurve::P256, EcCurve::P384] {
            let public = EcPrivateKey::generate(curve).public_key();
            let bytes = public.to_sec1_bytes();
            assert_eq!(bytes.len(), curve.uncompressed_point_size());
            assert_eq!(EcPublicKey::from_sec1_bytes(curve, &bytes).unwrap(), public);
        }
    }

    #[test]
    fn test_sec1_rejects_wrong_curve() {
        let public = EcPrivateKey::generate(EcCurve::P256).public_key();
        assert!(EcPublicKey::from_sec1_bytes(EcCurve::P384, &public.to_sec1_bytes()).is_err());
    }

    #[test]
    fn test_spki_roundtrip_ec() {
        for curve in [EcCurve::P256, EcCurve::P384] {
            let public = PrivateKey::generate_ec(curve).public_key();
            let der = public.to_spki_der().unwrap();
            assert_eq!(PublicKey::from_spki_der(&der).unwrap(), public);
        }
    }

    #[test]
    fn test_spki_roundtrip_rsa() {
        let public = rsa_key().public_key();
        let der = public.to_spki_der().unwrap();
        let decoded = PublicKey::from_spki_der(&der).unwrap();
        assert_eq!(decoded.family(), KeyFamily::Rsa);
        assert_eq!(decoded, public);
    }

    #[test]
    fn test_spki_rejects_garbage() {
        assert!(PublicKey::from_spki_der(b"not a key").is_err());
    }

    #[test]
    fn test_pkcs8_roundtrip() {
        let ec = PrivateKey::generate_ec(EcCurve::P384);
        let decoded = PrivateKey::from_pkcs8_der(&ec.to_pkcs8_der().unwrap()).unwrap();
        assert_eq!(decoded.public_key(), ec.public_key());

        let rsa = rsa_key();
        let decoded = PrivateKey::from_pkcs8_der(&rsa.to_pkcs8_der().unwrap()).unwrap();
        assert_eq!(decoded.public_key(), rsa.public_key());
    }

    #[test]
    fn test_rsa_minimum_modulus() {
        let result = PrivateKey::generate_rsa(1024);
        assert!(matches!(result, Err(CryptoError::KeyGeneration(_))));
    }

    #[test]
    fn test_debug_redacts_private_keys() {
        let ec = PrivateKey::generate_ec(EcCurve::P256);
        assert_eq!(format!("{ec:?}"), "PrivateKey(EcPrivateKey(P256, [REDACTED]))");
        assert_eq!(format!("{:?}", rsa_key()), "PrivateKey(Rsa, [REDACTED])");
    }

    #[test]
    fn test_family() {
        assert_eq!(PrivateKey::generate_ec(EcCurve::P256).family(), KeyFamily::Ec);
        assert_eq!(rsa_key().family(), KeyFamily::Rsa);
        assert_eq!(rsa_key().public_key().family(), KeyFamily::Rsa);
    }
}
