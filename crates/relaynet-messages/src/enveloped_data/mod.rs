//! Confidentiality envelope: CMS EnvelopedData with a single recipient.
//!
//! Two recipient modes are supported:
//!
//! - **Sessionless** ([`SessionlessEnvelopedData`]): key transport. A fresh
//!   content-encryption key (CEK) is encrypted with the recipient's RSA key
//!   (RSAES-OAEP, SHA-256).
//! - **Session** ([`SessionEnvelopedData`]): key agreement. ECDH between an
//!   originator key and the recipient's key yields a shared secret, the
//!   X9.63 KDF turns it into a key-encryption key (KEK) and AES key wrap
//!   protects the CEK. The originator public key travels in the envelope.
//!
//! ```text
//! ContentInfo (id-envelopedData)
//! +-- EnvelopedData v0 | v2
//!     +-- recipientInfos        exactly one ktri | kari
//!     +-- encryptedContentInfo  AES-CBC, IV in the algorithm parameters
//! ```
//!
//! ## Security Notes
//!
//! - CEKs, KEKs and shared secrets are held in `Zeroizing` buffers
//! - Every decryption failure surfaces as [`EnvelopedDataError::Decryption`]
//! - Content encryption is unauthenticated AES-CBC; pair it with the
//!   authenticity envelope when integrity matters

pub mod session;
pub mod sessionless;

pub use session::{SessionEnvelopedData, SessionKey, SessionRecipient};
pub use sessionless::SessionlessEnvelopedData;

use der::asn1::{OctetString, SetOfVec};
use der::{Any, Decode, Encode, Tag, TagNumber, Tagged};
use relaynet_crypto::{CryptoError, PrivateKey, SymmetricAlgorithm};
use relaynet_pki::Certificate;
use spki::AlgorithmIdentifierOwned;
use tracing::{debug, trace};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use zeroize::Zeroizing;

use crate::cms::{
    from_any, to_any, ContentInfo, EncryptedContentInfo, EnvelopedDataValue, IssuerAndSerialNumber,
    ID_DATA, ID_ENVELOPED_DATA,
};
use crate::error::EnvelopedDataError;

/// How the single recipient of an envelope is identified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecipientIdentifier {
    /// Recipient certificate by issuer name and serial number.
    BySerialNumber {
        /// Issuer of the recipient certificate.
        issuer: Name,
        /// Serial number of the recipient certificate.
        serial_number: SerialNumber,
    },
    /// Recipient key by opaque key identifier.
    ByKeyIdentifier(Vec<u8>),
}

impl RecipientIdentifier {
    /// Identify `certificate` by its issuer and serial number.
    pub fn for_certificate(certificate: &Certificate) -> Self {
        Self::BySerialNumber {
            issuer: certificate.issuer().clone(),
            serial_number: certificate.serial_number().clone(),
        }
    }

    /// Whether this identifier designates `certificate`.
    pub fn matches(&self, certificate: &Certificate) -> bool {
        match self {
            Self::BySerialNumber {
                issuer,
                serial_number,
            } => certificate.issuer() == issuer && certificate.serial_number() == serial_number,
            Self::ByKeyIdentifier(key_id) => certificate
                .subject_key_identifier()
                .map(|identifier| &identifier == key_id)
                .unwrap_or(false),
        }
    }
}

impl From<IssuerAndSerialNumber> for RecipientIdentifier {
    fn from(id: IssuerAndSerialNumber) -> Self {
        Self::BySerialNumber {
            issuer: id.issuer,
            serial_number: id.serial_number,
        }
    }
}

/// A deserialized EnvelopedData value of either mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvelopedData {
    /// Key transport.
    Sessionless(SessionlessEnvelopedData),
    /// Key agreement.
    Session(SessionEnvelopedData),
}

impl EnvelopedData {
    /// Parse and validate an EnvelopedData serialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not DER, is not EnvelopedData, does
    /// not have exactly one RecipientInfo, or uses an unsupported
    /// RecipientInfo kind.
    pub fn deserialize(serialization: &[u8]) -> Result<Self, EnvelopedDataError> {
        Self::parse(serialization).map_err(|e| {
            debug!(error = %e, "Rejected EnvelopedData value");
            e
        })
    }

    fn parse(serialization: &[u8]) -> Result<Self, EnvelopedDataError> {
        let content_info = ContentInfo::from_der(serialization)
            .map_err(|e| EnvelopedDataError::NotDer(e.to_string()))?;
        if content_info.content_type != ID_ENVELOPED_DATA {
            return Err(EnvelopedDataError::NotEnvelopedData(
                content_info.content_type.to_string(),
            ));
        }
        let value: EnvelopedDataValue = from_any(&content_info.content).map_err(malformed)?;

        let recipient_info = match value.recipient_infos.as_slice() {
            [recipient_info] => recipient_info.clone(),
            others => {
                return Err(EnvelopedDataError::InvalidRecipientInfoCount {
                    actual: others.len(),
                })
            }
        };

        let serialization = serialization.to_vec();
        let tag = recipient_info.tag();
        let enveloped_data = match tag {
            Tag::Sequence => Self::Sessionless(SessionlessEnvelopedData::from_recipient_info(
                value,
                &recipient_info,
                serialization,
            )?),
            Tag::ContextSpecific {
                constructed: true,
                number,
            } if number == TagNumber::N1 => Self::Session(SessionEnvelopedData::from_recipient_info(
                value,
                &recipient_info,
                serialization,
            )?),
            other => {
                return Err(EnvelopedDataError::UnsupportedRecipientInfo {
                    kind: recipient_info_kind(other),
                })
            }
        };
        trace!(recipient = ?enveloped_data.recipient_key_id(), "Parsed EnvelopedData value");
        Ok(enveloped_data)
    }

    /// The DER serialization.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Self::Sessionless(enveloped_data) => enveloped_data.serialize(),
            Self::Session(enveloped_data) => enveloped_data.serialize(),
        }
    }

    /// Decrypt the content with `private_key`.
    ///
    /// RSA keys open sessionless envelopes and EC keys open session
    /// envelopes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopedDataError::Decryption`] on any failure.
    pub fn decrypt(&self, private_key: &PrivateKey) -> Result<Vec<u8>, EnvelopedDataError> {
        match self {
            Self::Sessionless(enveloped_data) => enveloped_data.decrypt(private_key),
            Self::Session(enveloped_data) => enveloped_data.decrypt(private_key),
        }
    }

    /// Identifier of the recipient key.
    pub fn recipient_key_id(&self) -> &RecipientIdentifier {
        match self {
            Self::Sessionless(enveloped_data) => enveloped_data.recipient_key_id(),
            Self::Session(enveloped_data) => enveloped_data.recipient_key_id(),
        }
    }
}

impl From<SessionlessEnvelopedData> for EnvelopedData {
    fn from(enveloped_data: SessionlessEnvelopedData) -> Self {
        Self::Sessionless(enveloped_data)
    }
}

impl From<SessionEnvelopedData> for EnvelopedData {
    fn from(enveloped_data: SessionEnvelopedData) -> Self {
        Self::Session(enveloped_data)
    }
}

fn recipient_info_kind(tag: Tag) -> String {
    match tag {
        Tag::ContextSpecific { number, .. } if number == TagNumber::N2 => "kekri".to_string(),
        Tag::ContextSpecific { number, .. } if number == TagNumber::N3 => "pwri".to_string(),
        Tag::ContextSpecific { number, .. } if number == TagNumber::N4 => "ori".to_string(),
        other => other.to_string(),
    }
}

// ==================== Content encryption ====================

/// Encrypt `plaintext` under a fresh CEK.
pub(crate) fn encrypt_content(
    plaintext: &[u8],
    algorithm: SymmetricAlgorithm,
) -> Result<(Zeroizing<Vec<u8>>, EncryptedContentInfo), EnvelopedDataError> {
    let cek = algorithm.generate_key();
    let (iv, ciphertext) = algorithm
        .encrypt_cbc(&cek, plaintext)
        .map_err(EnvelopedDataError::Encryption)?;
    let content_info = EncryptedContentInfo {
        content_type: ID_DATA,
        content_encryption_algorithm: AlgorithmIdentifierOwned {
            oid: algorithm.cbc_oid(),
            parameters: Some(to_any(&OctetString::new(iv)?)?),
        },
        encrypted_content: Some(OctetString::new(ciphertext)?),
    };
    Ok((cek, content_info))
}

/// Decrypt the content of `content_info` with `cek`.
pub(crate) fn decrypt_content(
    content_info: &EncryptedContentInfo,
    cek: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let algorithm_id = &content_info.content_encryption_algorithm;
    let algorithm = SymmetricAlgorithm::from_cbc_oid(&algorithm_id.oid).ok_or_else(|| {
        CryptoError::UnsupportedAlgorithm(format!("content encryption {}", algorithm_id.oid))
    })?;
    let iv: OctetString = algorithm_id
        .parameters
        .as_ref()
        .ok_or_else(|| CryptoError::Decryption("missing IV".to_string()))
        .and_then(|parameters| from_any(parameters).map_err(encoding))?;
    let ciphertext = content_info
        .encrypted_content
        .as_ref()
        .ok_or_else(|| CryptoError::Decryption("missing encrypted content".to_string()))?;
    algorithm.decrypt_cbc(cek, iv.as_bytes(), ciphertext.as_bytes())
}

/// Wrap an EnvelopedData value with a single recipient in a ContentInfo.
pub(crate) fn serialize_value(
    version: u8,
    recipient_info: Any,
    encrypted_content_info: EncryptedContentInfo,
) -> Result<(EnvelopedDataValue, Vec<u8>), EnvelopedDataError> {
    let value = EnvelopedDataValue {
        version,
        originator_info: None,
        recipient_infos: SetOfVec::try_from(vec![recipient_info])?,
        encrypted_content_info,
        unprotected_attrs: None,
    };
    let serialization = ContentInfo {
        content_type: ID_ENVELOPED_DATA,
        content: to_any(&value)?,
    }
    .to_der()?;
    Ok((value, serialization))
}

pub(crate) fn malformed(error: der::Error) -> EnvelopedDataError {
    EnvelopedDataError::Malformed(error.to_string())
}

pub(crate) fn encoding(error: der::Error) -> CryptoError {
    CryptoError::Encoding(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::implicit;
    use crate::options::EncryptionOptions;
    use crate::test_support::{issue_ca, rsa_key};
    use relaynet_crypto::EcCurve;

    fn serialize_with_recipient_infos(recipient_infos: Vec<Any>) -> Vec<u8> {
        let (_, content_info) = encrypt_content(b"x", SymmetricAlgorithm::Aes128).unwrap();
        let value = EnvelopedDataValue {
            version: 0,
            originator_info: None,
            recipient_infos: SetOfVec::try_from(recipient_infos).unwrap(),
            encrypted_content_info: content_info,
            unprotected_attrs: None,
        };
        ContentInfo {
            content_type: ID_ENVELOPED_DATA,
            content: to_any(&value).unwrap(),
        }
        .to_der()
        .unwrap()
    }

    #[test]
    fn test_content_encryption_roundtrip() {
        for algorithm in SymmetricAlgorithm::ALL {
            let (cek, content_info) = encrypt_content(b"secret", algorithm).unwrap();
            assert_eq!(cek.len(), algorithm.key_size());
            assert_eq!(decrypt_content(&content_info, &cek).unwrap(), b"secret");
        }
    }

    #[test]
    fn test_not_der() {
        assert!(matches!(
            EnvelopedData::deserialize(b"nope"),
            Err(EnvelopedDataError::NotDer(_))
        ));
    }

    #[test]
    fn test_not_enveloped_data() {
        let content_info = ContentInfo {
            content_type: ID_DATA,
            content: to_any(&OctetString::new(b"x".to_vec()).unwrap()).unwrap(),
        };
        assert!(matches!(
            EnvelopedData::deserialize(&content_info.to_der().unwrap()),
            Err(EnvelopedDataError::NotEnvelopedData(_))
        ));
    }

    #[test]
    fn test_malformed_value() {
        let content_info = ContentInfo {
            content_type: ID_ENVELOPED_DATA,
            content: to_any(&OctetString::new(b"x".to_vec()).unwrap()).unwrap(),
        };
        assert!(matches!(
            EnvelopedData::deserialize(&content_info.to_der().unwrap()),
            Err(EnvelopedDataError::Malformed(_))
        ));
    }

    #[test]
    fn test_zero_recipients() {
        let serialization = serialize_with_recipient_infos(Vec::new());
        assert!(matches!(
            EnvelopedData::deserialize(&serialization),
            Err(EnvelopedDataError::InvalidRecipientInfoCount { actual: 0 })
        ));
    }

    #[test]
    fn test_two_recipients() {
        let certificate = issue_ca(rsa_key(), "recipient");
        let first = SessionlessEnvelopedData::encrypt(b"x", &certificate, &EncryptionOptions::default())
            .unwrap();
        let second = SessionlessEnvelopedData::encrypt(b"x", &certificate, &EncryptionOptions::default())
            .unwrap();
        let recipient_info = |enveloped_data: &SessionlessEnvelopedData| {
            let content_info = ContentInfo::from_der(&enveloped_data.serialize()).unwrap();
            let value: EnvelopedDataValue = from_any(&content_info.content).unwrap();
            value.recipient_infos.as_slice()[0].clone()
        };

        let serialization =
            serialize_with_recipient_infos(vec![recipient_info(&first), recipient_info(&second)]);
        assert!(matches!(
            EnvelopedData::deserialize(&serialization),
            Err(EnvelopedDataError::InvalidRecipientInfoCount { actual: 2 })
        ));
    }

    #[test]
    fn test_unsupported_recipient_info_kinds() {
        let body = to_any(&vec![OctetString::new(b"kek".to_vec()).unwrap()]).unwrap();
        for (number, kind) in [
            (TagNumber::N2, "kekri"),
            (TagNumber::N3, "pwri"),
            (TagNumber::N4, "ori"),
        ] {
            let serialization = serialize_with_recipient_infos(vec![implicit(number, &body).unwrap()]);
            match EnvelopedData::deserialize(&serialization) {
                Err(EnvelopedDataError::UnsupportedRecipientInfo { kind: actual }) => {
                    assert_eq!(actual, kind)
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_recipient_identifier_matches_certificate() {
        let key = PrivateKey::generate_ec(EcCurve::P256);
        let certificate = issue_ca(&key, "recipient");
        let other = issue_ca(&key, "other");

        let by_serial = RecipientIdentifier::for_certificate(&certificate);
        assert!(by_serial.matches(&certificate));
        assert!(!by_serial.matches(&other));

        let by_key_id =
            RecipientIdentifier::ByKeyIdentifier(certificate.subject_key_identifier().unwrap());
        assert!(by_key_id.matches(&certificate));
    }
}
