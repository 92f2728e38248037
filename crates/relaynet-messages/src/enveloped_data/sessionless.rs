//! Key transport recipients (RSAES-OAEP).

use der::asn1::OctetString;
use der::Any;
use relaynet_crypto::hash::ID_SHA256;
use relaynet_crypto::key_transport::{self, ID_MGF1, ID_RSAES_OAEP};
use relaynet_crypto::{CryptoError, PrivateKey, PublicKey};
use relaynet_pki::Certificate;
use spki::AlgorithmIdentifierOwned;
use tracing::debug;

use super::{
    decrypt_content, encoding, encrypt_content, malformed, serialize_value, RecipientIdentifier,
};
use crate::cms::{
    algorithm, from_any, to_any, EnvelopedDataValue, IssuerAndSerialNumber, KeyTransRecipientInfo,
    RsaOaepParams, SignerIdentifier, ENVELOPED_DATA_KEY_TRANSPORT_VERSION,
    KEY_TRANSPORT_RECIPIENT_VERSION,
};
use crate::error::EnvelopedDataError;
use crate::options::EncryptionOptions;

/// EnvelopedData whose CEK is encrypted with the recipient's RSA key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionlessEnvelopedData {
    value: EnvelopedDataValue,
    recipient_info: KeyTransRecipientInfo,
    recipient_id: RecipientIdentifier,
    serialization: Vec<u8>,
}

impl SessionlessEnvelopedData {
    /// Encrypt `plaintext` for the holder of `recipient_certificate`'s key.
    ///
    /// Only the symmetric algorithm of `options` applies; RSA-OAEP always
    /// uses SHA-256.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate does not carry an RSA key or
    /// encryption fails.
    pub fn encrypt(
        plaintext: &[u8],
        recipient_certificate: &Certificate,
        options: &EncryptionOptions,
    ) -> Result<Self, EnvelopedDataError> {
        let recipient_key = match recipient_certificate.subject_public_key()? {
            PublicKey::Rsa(key) => key,
            PublicKey::Ec(_) => {
                return Err(EnvelopedDataError::Encryption(CryptoError::UnsupportedKey(
                    "key transport requires an RSA recipient key".to_string(),
                )))
            }
        };

        let (cek, encrypted_content_info) = encrypt_content(plaintext, options.symmetric_algorithm)?;
        let encrypted_key = key_transport::encrypt_key(&recipient_key, &cek)
            .map_err(EnvelopedDataError::Encryption)?;

        let recipient_info = KeyTransRecipientInfo {
            version: KEY_TRANSPORT_RECIPIENT_VERSION,
            rid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: recipient_certificate.issuer().clone(),
                serial_number: recipient_certificate.serial_number().clone(),
            }),
            key_encryption_algorithm: oaep_algorithm()?,
            encrypted_key: OctetString::new(encrypted_key)?,
        };
        let (value, serialization) = serialize_value(
            ENVELOPED_DATA_KEY_TRANSPORT_VERSION,
            to_any(&recipient_info)?,
            encrypted_content_info,
        )?;
        Ok(Self {
            value,
            recipient_info,
            recipient_id: RecipientIdentifier::for_certificate(recipient_certificate),
            serialization,
        })
    }

    pub(super) fn from_recipient_info(
        value: EnvelopedDataValue,
        recipient_info: &Any,
        serialization: Vec<u8>,
    ) -> Result<Self, EnvelopedDataError> {
        let recipient_info: KeyTransRecipientInfo = from_any(recipient_info).map_err(malformed)?;
        let recipient_id = match &recipient_info.rid {
            SignerIdentifier::IssuerAndSerialNumber(id) => RecipientIdentifier::from(id.clone()),
            SignerIdentifier::SubjectKeyIdentifier(_) => {
                return Err(EnvelopedDataError::KeyTransportRecipientWithoutSerialNumber)
            }
        };
        Ok(Self {
            value,
            recipient_info,
            recipient_id,
            serialization,
        })
    }

    /// The DER serialization.
    pub fn serialize(&self) -> Vec<u8> {
        self.serialization.clone()
    }

    /// Identifier of the recipient certificate.
    pub fn recipient_key_id(&self) -> &RecipientIdentifier {
        &self.recipient_id
    }

    /// Decrypt the content with the recipient's RSA key.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopedDataError::Decryption`] on any failure, including
    /// a non-RSA key.
    pub fn decrypt(&self, private_key: &PrivateKey) -> Result<Vec<u8>, EnvelopedDataError> {
        self.open(private_key).map_err(|e| {
            debug!(error = %e, "Failed to decrypt sessionless EnvelopedData");
            EnvelopedDataError::Decryption(e)
        })
    }

    fn open(&self, private_key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
        let PrivateKey::Rsa(private_key) = private_key else {
            return Err(CryptoError::UnsupportedKey(
                "key transport requires an RSA private key".to_string(),
            ));
        };
        check_oaep_algorithm(&self.recipient_info.key_encryption_algorithm)?;
        let cek = key_transport::decrypt_key(
            private_key,
            self.recipient_info.encrypted_key.as_bytes(),
        )?;
        decrypt_content(&self.value.encrypted_content_info, &cek)
    }
}

fn oaep_algorithm() -> der::Result<AlgorithmIdentifierOwned> {
    let params = RsaOaepParams {
        hash_algorithm: Some(algorithm(ID_SHA256)),
        mask_gen_algorithm: Some(AlgorithmIdentifierOwned {
            oid: ID_MGF1,
            parameters: Some(to_any(&algorithm(ID_SHA256))?),
        }),
        p_source_algorithm: None,
    };
    Ok(AlgorithmIdentifierOwned {
        oid: ID_RSAES_OAEP,
        parameters: Some(to_any(&params)?),
    })
}

fn check_oaep_algorithm(algorithm_id: &AlgorithmIdentifierOwned) -> Result<(), CryptoError> {
    if algorithm_id.oid != ID_RSAES_OAEP {
        return Err(CryptoError::UnsupportedAlgorithm(format!(
            "key transport {}",
            algorithm_id.oid
        )));
    }
    let params: RsaOaepParams = match &algorithm_id.parameters {
        Some(parameters) => from_any(parameters).map_err(encoding)?,
        None => RsaOaepParams {
            hash_algorithm: None,
            mask_gen_algorithm: None,
            p_source_algorithm: None,
        },
    };
    match &params.hash_algorithm {
        Some(hash) if hash.oid == ID_SHA256 => Ok(()),
        Some(hash) => Err(CryptoError::UnsupportedAlgorithm(format!(
            "RSA-OAEP hash {}",
            hash.oid
        ))),
        None => Err(CryptoError::UnsupportedAlgorithm(
            "RSA-OAEP with SHA-1".to_string(),
        )),
    }
}
