//! Key agreement recipients (ECDH, X9.63 KDF, AES key wrap).
//!
//! The KEK is derived as
//!
//! ```text
//! Z   = ECDH(originator private key, recipient public key)
//! KEK = X9.63-KDF(Z, DER(ECC-CMS-SharedInfo { wrap algorithm, ukm, KEK bits }))
//! ```

use const_oid::ObjectIdentifier;
use der::asn1::{BitString, OctetString};
use der::{Any, Encode, Tag, TagNumber};
use relaynet_crypto::keys::ID_EC_PUBLIC_KEY;
use relaynet_crypto::{
    CryptoError, EcCurve, EcPrivateKey, EcPublicKey, HashingAlgorithm, PrivateKey, PublicKey,
    SymmetricAlgorithm,
};
use relaynet_pki::Certificate;
use spki::AlgorithmIdentifierOwned;
use tracing::debug;
use zeroize::Zeroizing;

use super::{decrypt_content, encoding, encrypt_content, malformed, serialize_value, RecipientIdentifier};
use crate::cms::{
    algorithm, from_any, implicit, retag, to_any, EccCmsSharedInfo, EnvelopedDataValue,
    IssuerAndSerialNumber, KeyAgreeRecipientIdentifier, KeyAgreeRecipientInfo,
    OriginatorIdentifierOrKey, OriginatorPublicKey, RecipientEncryptedKey, RecipientKeyIdentifier,
    ENVELOPED_DATA_KEY_AGREEMENT_VERSION, KEY_AGREEMENT_RECIPIENT_VERSION,
};
use crate::error::EnvelopedDataError;
use crate::options::EncryptionOptions;

/// A key agreement recipient addressed by key identifier rather than by
/// certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionKey {
    /// Opaque identifier of the key, echoed in the envelope.
    pub key_id: Vec<u8>,
    /// The recipient's EC public key.
    pub public_key: EcPublicKey,
}

impl SessionKey {
    /// Create a session key.
    pub fn new(key_id: impl Into<Vec<u8>>, public_key: EcPublicKey) -> Self {
        Self {
            key_id: key_id.into(),
            public_key,
        }
    }
}

/// The recipient of a [`SessionEnvelopedData`].
#[derive(Clone, Copy, Debug)]
pub enum SessionRecipient<'a> {
    /// A certificate with an EC subject key, identified by issuer and serial.
    Certificate(&'a Certificate),
    /// A bare EC key, identified by its key id.
    Key(&'a SessionKey),
}

impl SessionRecipient<'_> {
    fn public_key(&self) -> Result<EcPublicKey, EnvelopedDataError> {
        match self {
            Self::Certificate(certificate) => match certificate.subject_public_key()? {
                PublicKey::Ec(key) => Ok(key),
                PublicKey::Rsa(_) => Err(EnvelopedDataError::Encryption(
                    CryptoError::UnsupportedKey(
                        "key agreement requires an EC recipient key".to_string(),
                    ),
                )),
            },
            Self::Key(session_key) => Ok(session_key.public_key.clone()),
        }
    }

    fn identifier(&self) -> Result<(KeyAgreeRecipientIdentifier, RecipientIdentifier), der::Error> {
        Ok(match self {
            Self::Certificate(certificate) => (
                KeyAgreeRecipientIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                    issuer: certificate.issuer().clone(),
                    serial_number: certificate.serial_number().clone(),
                }),
                RecipientIdentifier::for_certificate(certificate),
            ),
            Self::Key(session_key) => (
                KeyAgreeRecipientIdentifier::RecipientKeyIdentifier(RecipientKeyIdentifier {
                    subject_key_identifier: OctetString::new(session_key.key_id.clone())?,
                    date: None,
                    other: None,
                }),
                RecipientIdentifier::ByKeyIdentifier(session_key.key_id.clone()),
            ),
        })
    }
}

/// EnvelopedData whose CEK is wrapped with a key agreed through ECDH.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionEnvelopedData {
    value: EnvelopedDataValue,
    recipient_info: KeyAgreeRecipientInfo,
    recipient_id: RecipientIdentifier,
    originator_key: EcPublicKey,
    serialization: Vec<u8>,
}

impl SessionEnvelopedData {
    /// Encrypt `plaintext` for `recipient` using `originator_key` for ECDH.
    ///
    /// Both keys must be on the same curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient has no EC key, the curves differ,
    /// or encryption fails.
    pub fn encrypt(
        plaintext: &[u8],
        recipient: SessionRecipient<'_>,
        originator_key: &EcPrivateKey,
        options: &EncryptionOptions,
    ) -> Result<Self, EnvelopedDataError> {
        let recipient_key = recipient.public_key()?;
        let symmetric = options.symmetric_algorithm;
        let hashing = options.hashing_algorithm;

        let (cek, encrypted_content_info) = encrypt_content(plaintext, symmetric)?;
        let wrap_algorithm = algorithm(symmetric.key_wrap_oid());
        let kek = derive_kek(originator_key, &recipient_key, hashing, symmetric, None)
            .map_err(EnvelopedDataError::Encryption)?;
        let encrypted_key = symmetric
            .wrap_key(&kek, &cek)
            .map_err(EnvelopedDataError::Encryption)?;

        let originator_public_key = originator_key.public_key();
        let (rid, recipient_id) = recipient.identifier()?;
        let recipient_info = KeyAgreeRecipientInfo {
            version: KEY_AGREEMENT_RECIPIENT_VERSION,
            originator: OriginatorIdentifierOrKey::OriginatorKey(OriginatorPublicKey {
                algorithm: AlgorithmIdentifierOwned {
                    oid: ID_EC_PUBLIC_KEY,
                    parameters: Some(to_any(&originator_public_key.curve().oid())?),
                },
                public_key: BitString::from_bytes(&originator_public_key.to_sec1_bytes())?,
            }),
            ukm: None,
            key_encryption_algorithm: AlgorithmIdentifierOwned {
                oid: hashing.ecdh_kdf_oid(),
                parameters: Some(to_any(&wrap_algorithm)?),
            },
            recipient_encrypted_keys: vec![RecipientEncryptedKey {
                rid,
                encrypted_key: OctetString::new(encrypted_key)?,
            }],
        };
        let (value, serialization) = serialize_value(
            ENVELOPED_DATA_KEY_AGREEMENT_VERSION,
            implicit(TagNumber::N1, &to_any(&recipient_info)?)?,
            encrypted_content_info,
        )?;
        Ok(Self {
            value,
            recipient_info,
            recipient_id,
            originator_key: originator_public_key,
            serialization,
        })
    }

    /// Encrypt with a fresh originator key on the recipient's curve.
    ///
    /// The originator private key is returned so that the sender can keep
    /// it for the recipient's response.
    ///
    /// # Errors
    ///
    /// See [`SessionEnvelopedData::encrypt`].
    pub fn encrypt_ephemeral(
        plaintext: &[u8],
        recipient: SessionRecipient<'_>,
        options: &EncryptionOptions,
    ) -> Result<(Self, EcPrivateKey), EnvelopedDataError> {
        let originator_key = EcPrivateKey::generate(recipient.public_key()?.curve());
        let enveloped_data = Self::encrypt(plaintext, recipient, &originator_key, options)?;
        Ok((enveloped_data, originator_key))
    }

    pub(super) fn from_recipient_info(
        value: EnvelopedDataValue,
        recipient_info: &Any,
        serialization: Vec<u8>,
    ) -> Result<Self, EnvelopedDataError> {
        let recipient_info: KeyAgreeRecipientInfo =
            from_any(&retag(recipient_info, Tag::Sequence)?).map_err(malformed)?;

        let recipient_id = match recipient_info.recipient_encrypted_keys.as_slice() {
            [encrypted_key] => match &encrypted_key.rid {
                KeyAgreeRecipientIdentifier::IssuerAndSerialNumber(id) => {
                    RecipientIdentifier::from(id.clone())
                }
                KeyAgreeRecipientIdentifier::RecipientKeyIdentifier(id) => {
                    RecipientIdentifier::ByKeyIdentifier(id.subject_key_identifier.as_bytes().to_vec())
                }
            },
            others => {
                return Err(EnvelopedDataError::InvalidRecipientEncryptedKeyCount {
                    actual: others.len(),
                })
            }
        };

        let originator_key = match &recipient_info.originator {
            OriginatorIdentifierOrKey::OriginatorKey(key) => parse_originator_key(key)?,
            OriginatorIdentifierOrKey::IssuerAndSerialNumber(_) => {
                return Err(EnvelopedDataError::UnsupportedOriginator {
                    kind: "IssuerAndSerialNumber",
                })
            }
            OriginatorIdentifierOrKey::SubjectKeyIdentifier(_) => {
                return Err(EnvelopedDataError::UnsupportedOriginator {
                    kind: "SubjectKeyIdentifier",
                })
            }
        };

        Ok(Self {
            value,
            recipient_info,
            recipient_id,
            originator_key,
            serialization,
        })
    }

    /// The DER serialization.
    pub fn serialize(&self) -> Vec<u8> {
        self.serialization.clone()
    }

    /// Identifier of the recipient certificate or key.
    pub fn recipient_key_id(&self) -> &RecipientIdentifier {
        &self.recipient_id
    }

    /// The originator's ECDH public key embedded in the envelope.
    pub fn originator_key(&self) -> &EcPublicKey {
        &self.originator_key
    }

    /// Decrypt the content with the recipient's EC key.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopedDataError::Decryption`] on any failure, including
    /// a non-EC key or a key on another curve.
    pub fn decrypt(&self, private_key: &PrivateKey) -> Result<Vec<u8>, EnvelopedDataError> {
        self.open(private_key).map_err(|e| {
            debug!(error = %e, "Failed to decrypt session EnvelopedData");
            EnvelopedDataError::Decryption(e)
        })
    }

    fn open(&self, private_key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
        let PrivateKey::Ec(private_key) = private_key else {
            return Err(CryptoError::UnsupportedKey(
                "key agreement requires an EC private key".to_string(),
            ));
        };

        let key_encryption_algorithm = &self.recipient_info.key_encryption_algorithm;
        let hashing = HashingAlgorithm::from_ecdh_kdf_oid(&key_encryption_algorithm.oid)
            .ok_or_else(|| {
                CryptoError::UnsupportedAlgorithm(format!(
                    "key agreement {}",
                    key_encryption_algorithm.oid
                ))
            })?;
        let wrap_algorithm: AlgorithmIdentifierOwned = key_encryption_algorithm
            .parameters
            .as_ref()
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm("missing key wrap algorithm".into()))
            .and_then(|parameters| from_any(parameters).map_err(encoding))?;
        let symmetric = SymmetricAlgorithm::from_key_wrap_oid(&wrap_algorithm.oid).ok_or_else(|| {
            CryptoError::UnsupportedAlgorithm(format!("key wrap {}", wrap_algorithm.oid))
        })?;

        let kek = derive_kek(
            private_key,
            &self.originator_key,
            hashing,
            symmetric,
            self.recipient_info.ukm.clone(),
        )?;
        let encrypted_key = self
            .recipient_info
            .recipient_encrypted_keys
            .first()
            .ok_or_else(|| CryptoError::Decryption("missing encrypted key".to_string()))?;
        let cek = symmetric.unwrap_key(&kek, encrypted_key.encrypted_key.as_bytes())?;
        decrypt_content(&self.value.encrypted_content_info, &cek)
    }
}

fn derive_kek(
    private_key: &EcPrivateKey,
    peer_key: &EcPublicKey,
    hashing: HashingAlgorithm,
    symmetric: SymmetricAlgorithm,
    ukm: Option<OctetString>,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let kek_length = symmetric.key_size();
    let kek_bits = u32::try_from(kek_length * 8)
        .map_err(|_| CryptoError::KeyAgreement("KEK too long".to_string()))?;
    let shared_info = EccCmsSharedInfo {
        key_info: algorithm(symmetric.key_wrap_oid()),
        entity_u_info: ukm,
        supp_pub_info: OctetString::new(kek_bits.to_be_bytes().to_vec()).map_err(encoding)?,
    }
    .to_der()
    .map_err(encoding)?;

    let shared_secret = private_key.diffie_hellman(peer_key)?;
    hashing.x963_kdf(&shared_secret, &shared_info, kek_length)
}

fn parse_originator_key(key: &OriginatorPublicKey) -> Result<EcPublicKey, EnvelopedDataError> {
    if key.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(EnvelopedDataError::Malformed(format!(
            "originator key algorithm {} is not id-ecPublicKey",
            key.algorithm.oid
        )));
    }
    let point = key
        .public_key
        .as_bytes()
        .ok_or_else(|| EnvelopedDataError::Malformed("originator key has unused bits".into()))?;

    let named_curve = match &key.algorithm.parameters {
        Some(parameters) => {
            let oid: ObjectIdentifier = from_any(parameters).map_err(malformed)?;
            Some(EcCurve::from_oid(&oid).ok_or_else(|| {
                EnvelopedDataError::Malformed(format!("unsupported originator curve {oid}"))
            })?)
        }
        None => None,
    };
    let curve = named_curve
        .or_else(|| {
            [EcCurve::P256, EcCurve::P384]
                .into_iter()
                .find(|curve| curve.uncompressed_point_size() == point.len())
        })
        .ok_or_else(|| EnvelopedDataError::Malformed("unknown originator curve".to_string()))?;

    EcPublicKey::from_sec1_bytes(curve, point)
        .map_err(|e| EnvelopedDataError::Malformed(e.to_string()))
}
