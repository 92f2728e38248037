//! Authenticity envelope: CMS SignedData with attached certificates.
//!
//! ```text
//! ContentInfo (id-signedData)
//! +-- SignedData v1
//!     +-- digestAlgorithms       { sha-256 | sha-384 | sha-512 }
//!     +-- encapContentInfo       id-data, plaintext
//!     +-- certificates           signer + supporting certificates
//!     +-- signerInfos            exactly one SignerInfo v1
//!         +-- sid                IssuerAndSerialNumber of the signer
//!         +-- signedAttrs        contentType, messageDigest
//!         +-- signature          over DER(SET OF signedAttrs)
//! ```
//!
//! Verification proves that the plaintext was signed by the key of one of
//! the attached certificates. It does not build or validate a certification
//! path; callers get every attached certificate to do that themselves.

use der::asn1::{OctetString, SetOfVec};
use der::{Any, Decode, Encode};
use relaynet_crypto::signature::{parse_signature_algorithm, signature_algorithm_oid};
use relaynet_crypto::{HashingAlgorithm, KeyFamily, PrivateKey};
use relaynet_pki::Certificate;
use spki::AlgorithmIdentifierOwned;
use subtle::ConstantTimeEq;
use tracing::{debug, trace};

use crate::cms::{
    algorithm, from_any, to_any, Attribute, ContentInfo, EncapsulatedContentInfo,
    IssuerAndSerialNumber, SignedDataValue, SignerIdentifier, SignerInfo, ID_CONTENT_TYPE,
    ID_DATA, ID_MESSAGE_DIGEST, ID_SIGNED_DATA, SIGNED_DATA_VERSION, SIGNER_INFO_VERSION,
};
use crate::error::SignedDataError;
use crate::options::SignatureOptions;

/// The verified content of a SignedData value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedData {
    plaintext: Vec<u8>,
    signer_certificate: Certificate,
    certificates: Vec<Certificate>,
}

impl SignedData {
    /// The signed plaintext.
    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    /// The certificate whose key produced the signature.
    pub fn signer_certificate(&self) -> &Certificate {
        &self.signer_certificate
    }

    /// Every attached certificate, including the signer's.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Split into plaintext, signer certificate and attached certificates.
    pub fn into_parts(self) -> (Vec<u8>, Certificate, Vec<Certificate>) {
        (self.plaintext, self.signer_certificate, self.certificates)
    }
}

/// Sign `plaintext` and attach the signer and supporting certificates.
///
/// The attached certificate set is the union of `certificates` and
/// `signer_certificate`, without duplicates.
///
/// # Errors
///
/// Returns an error if signing or encoding fails.
pub fn sign<'a>(
    plaintext: &[u8],
    signer_key: &PrivateKey,
    signer_certificate: &Certificate,
    certificates: impl IntoIterator<Item = &'a Certificate>,
    options: &SignatureOptions,
) -> Result<Vec<u8>, SignedDataError> {
    let hashing = options.hashing_algorithm;
    let digest = hashing.digest(plaintext);

    let signed_attrs = SetOfVec::try_from(vec![
        to_any(&attribute(ID_CONTENT_TYPE, to_any(&ID_DATA)?)?)?,
        to_any(&attribute(ID_MESSAGE_DIGEST, to_any(&OctetString::new(digest)?)?)?)?,
    ])?;
    let signature = relaynet_crypto::signature::sign(signer_key, &signed_attrs.to_der()?, hashing)?;

    let signer_info = SignerInfo {
        version: SIGNER_INFO_VERSION,
        sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: signer_certificate.issuer().clone(),
            serial_number: signer_certificate.serial_number().clone(),
        }),
        digest_algorithm: algorithm(hashing.oid()),
        signed_attrs: Some(signed_attrs),
        signature_algorithm: signature_algorithm_identifier(signer_key.family(), hashing),
        signature: OctetString::new(signature)?,
        unsigned_attrs: None,
    };

    let mut attached: Vec<&Certificate> = vec![signer_certificate];
    for certificate in certificates {
        if !attached.contains(&certificate) {
            attached.push(certificate);
        }
    }
    let attached = attached
        .into_iter()
        .map(|certificate| Any::from_der(certificate.as_der()))
        .collect::<der::Result<Vec<_>>>()?;

    let signed_data = SignedDataValue {
        version: SIGNED_DATA_VERSION,
        digest_algorithms: SetOfVec::try_from(vec![algorithm(hashing.oid())])?,
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: ID_DATA,
            econtent: Some(OctetString::new(plaintext)?),
        },
        certificates: Some(SetOfVec::try_from(attached)?),
        crls: None,
        signer_infos: SetOfVec::try_from(vec![to_any(&signer_info)?])?,
    };
    let content_info = ContentInfo {
        content_type: ID_SIGNED_DATA,
        content: to_any(&signed_data)?,
    };
    Ok(content_info.to_der()?)
}

/// Verify a SignedData serialization produced by [`sign`].
///
/// # Errors
///
/// Returns a [`SignedDataError`] if the value is malformed, the signer
/// certificate is not attached, or the signature does not verify.
pub fn verify_signature(serialization: &[u8]) -> Result<SignedData, SignedDataError> {
    verify(serialization).map_err(|e| {
        debug!(error = %e, "Rejected SignedData value");
        e
    })
}

fn verify(serialization: &[u8]) -> Result<SignedData, SignedDataError> {
    let content_info = ContentInfo::from_der(serialization)
        .map_err(|e| SignedDataError::NotDer(e.to_string()))?;
    if content_info.content_type != ID_SIGNED_DATA {
        return Err(SignedDataError::NotSignedData(
            content_info.content_type.to_string(),
        ));
    }
    let signed_data: SignedDataValue = from_any(&content_info.content).map_err(malformed)?;

    let signer_infos = signed_data.signer_infos.as_slice();
    if signer_infos.len() != 1 {
        return Err(SignedDataError::InvalidSignerInfoCount {
            actual: signer_infos.len(),
        });
    }
    let signer_info: SignerInfo = from_any(&signer_infos[0]).map_err(malformed)?;

    let plaintext = signed_data
        .encap_content_info
        .econtent
        .as_ref()
        .map(|content| content.as_bytes().to_vec())
        .ok_or(SignedDataError::MissingContent)?;

    let certificates: Vec<Certificate> = match &signed_data.certificates {
        Some(set) => set
            .iter()
            .map(decode_certificate)
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    };
    let signer_certificate = find_signer(&signer_info.sid, &certificates)?.clone();

    let digest_hashing = HashingAlgorithm::from_oid(&signer_info.digest_algorithm.oid)
        .ok_or_else(|| unsupported(&signer_info.digest_algorithm))?;
    let (family, signature_hashing) = parse_signature_algorithm(&signer_info.signature_algorithm.oid)
        .ok_or_else(|| unsupported(&signer_info.signature_algorithm))?;
    let signer_key = signer_certificate.subject_public_key()?;
    if signer_key.family() != family {
        return Err(unsupported(&signer_info.signature_algorithm));
    }

    let signed_content = match &signer_info.signed_attrs {
        Some(attributes) => {
            check_signed_attributes(
                attributes,
                &signed_data.encap_content_info,
                &digest_hashing.digest(&plaintext),
            )?;
            attributes.to_der()?
        }
        None => plaintext.clone(),
    };
    relaynet_crypto::signature::verify(
        &signer_key,
        &signed_content,
        signer_info.signature.as_bytes(),
        signature_hashing,
    )
    .map_err(|_| SignedDataError::InvalidSignature)?;

    trace!(
        plaintext_length = plaintext.len(),
        certificates = certificates.len(),
        "Verified SignedData value"
    );
    Ok(SignedData {
        plaintext,
        signer_certificate,
        certificates,
    })
}

fn check_signed_attributes(
    attributes: &SetOfVec<Any>,
    encap_content_info: &EncapsulatedContentInfo,
    expected_digest: &[u8],
) -> Result<(), SignedDataError> {
    let attributes = attributes
        .iter()
        .map(from_any::<Attribute>)
        .collect::<der::Result<Vec<_>>>()
        .map_err(malformed)?;

    let content_type = single_attribute_value(&attributes, &ID_CONTENT_TYPE)?;
    let content_type: const_oid::ObjectIdentifier = from_any(content_type).map_err(malformed)?;
    if content_type != encap_content_info.econtent_type {
        return Err(SignedDataError::Malformed(
            "contentType attribute does not match the encapsulated content".to_string(),
        ));
    }

    let digest = single_attribute_value(&attributes, &ID_MESSAGE_DIGEST)?;
    let digest: OctetString = from_any(digest).map_err(malformed)?;
    if !bool::from(digest.as_bytes().ct_eq(expected_digest)) {
        return Err(SignedDataError::DigestMismatch);
    }
    Ok(())
}

fn single_attribute_value<'a>(
    attributes: &'a [Attribute],
    attr_type: &const_oid::ObjectIdentifier,
) -> Result<&'a Any, SignedDataError> {
    let mut matching = attributes.iter().filter(|a| a.attr_type == *attr_type);
    let values = match (matching.next(), matching.next()) {
        (Some(attribute), None) => attribute.attr_values.as_slice(),
        _ => {
            return Err(SignedDataError::Malformed(format!(
                "expected exactly one {attr_type} attribute"
            )))
        }
    };
    match values {
        [value] => Ok(value),
        _ => Err(SignedDataError::Malformed(format!(
            "attribute {attr_type} should have exactly one value"
        ))),
    }
}

fn find_signer<'a>(
    sid: &SignerIdentifier,
    certificates: &'a [Certificate],
) -> Result<&'a Certificate, SignedDataError> {
    certificates
        .iter()
        .find(|certificate| match sid {
            SignerIdentifier::IssuerAndSerialNumber(id) => {
                certificate.issuer() == &id.issuer && certificate.serial_number() == &id.serial_number
            }
            SignerIdentifier::SubjectKeyIdentifier(ski) => certificate
                .subject_key_identifier()
                .map(|identifier| identifier == ski.as_bytes())
                .unwrap_or(false),
        })
        .ok_or(SignedDataError::SignerCertificateNotFound)
}

fn decode_certificate(any: &Any) -> Result<Certificate, SignedDataError> {
    Ok(Certificate::deserialize(&any.to_der()?)?)
}

fn attribute(attr_type: const_oid::ObjectIdentifier, value: Any) -> der::Result<Attribute> {
    Ok(Attribute {
        attr_type,
        attr_values: SetOfVec::try_from(vec![value])?,
    })
}

fn signature_algorithm_identifier(
    family: KeyFamily,
    hashing: HashingAlgorithm,
) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: signature_algorithm_oid(family, hashing),
        parameters: match family {
            KeyFamily::Rsa => Some(Any::null()),
            KeyFamily::Ec => None,
        },
    }
}

fn malformed(error: der::Error) -> SignedDataError {
    SignedDataError::Malformed(error.to_string())
}

fn unsupported(algorithm: &AlgorithmIdentifierOwned) -> SignedDataError {
    SignedDataError::UnsupportedAlgorithm(algorithm.oid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{issue_ca, issue_leaf, rsa_key};
    use relaynet_crypto::EcCurve;

    fn ec_signer() -> (PrivateKey, Certificate) {
        let key = PrivateKey::generate_ec(EcCurve::P256);
        let certificate = issue_ca(&key, "signer");
        (key, certificate)
    }

    #[test]
    fn test_sign_and_verify() {
        let (key, certificate) = ec_signer();
        let serialization = sign(
            b"Hello",
            &key,
            &certificate,
            [],
            &SignatureOptions::default(),
        )
        .unwrap();

        let signed = verify_signature(&serialization).unwrap();
        assert_eq!(signed.plaintext(), b"Hello");
        assert_eq!(signed.signer_certificate(), &certificate);
        assert_eq!(signed.certificates(), std::slice::from_ref(&certificate));
    }

    #[test]
    fn test_all_hashing_algorithms() {
        let (key, certificate) = ec_signer();
        for hashing in HashingAlgorithm::ALL {
            let options = SignatureOptions::new().with_hashing_algorithm(hashing);
            let serialization = sign(b"data", &key, &certificate, [], &options).unwrap();
            assert_eq!(verify_signature(&serialization).unwrap().plaintext(), b"data");
        }
    }

    #[test]
    fn test_rsa_signer() {
        let key = rsa_key();
        let certificate = issue_ca(key, "rsa signer");
        let serialization = sign(b"data", key, &certificate, [], &SignatureOptions::default()).unwrap();
        let signed = verify_signature(&serialization).unwrap();
        assert_eq!(signed.signer_certificate(), &certificate);
    }

    #[test]
    fn test_attached_certificates_are_deduplicated() {
        let (ca_key, ca) = ec_signer();
        let leaf_key = PrivateKey::generate_ec(EcCurve::P256);
        let leaf = issue_leaf(&leaf_key, "leaf", &ca, &ca_key);

        let serialization = sign(
            b"data",
            &leaf_key,
            &leaf,
            [&ca, &leaf, &ca],
            &SignatureOptions::default(),
        )
        .unwrap();

        let signed = verify_signature(&serialization).unwrap();
        assert_eq!(signed.signer_certificate(), &leaf);
        assert_eq!(signed.certificates().len(), 2);
        assert!(signed.certificates().contains(&ca));
        assert!(signed.certificates().contains(&leaf));
    }

    #[test]
    fn test_signed_with_other_key_fails() {
        let (_, certificate) = ec_signer();
        let other_key = PrivateKey::generate_ec(EcCurve::P256);
        let serialization = sign(
            b"data",
            &other_key,
            &certificate,
            [],
            &SignatureOptions::default(),
        )
        .unwrap();

        assert!(matches!(
            verify_signature(&serialization),
            Err(SignedDataError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_plaintext_fails() {
        let (key, certificate) = ec_signer();
        let mut serialization =
            sign(b"original", &key, &certificate, [], &SignatureOptions::default()).unwrap();
        let position = serialization
            .windows(8)
            .position(|window| window == b"original")
            .unwrap();
        serialization[position] = b'O';

        assert!(matches!(
            verify_signature(&serialization),
            Err(SignedDataError::DigestMismatch)
        ));
    }

    #[test]
    fn test_not_der() {
        assert!(matches!(
            verify_signature(b"not DER"),
            Err(SignedDataError::NotDer(_))
        ));
    }

    #[test]
    fn test_wrong_content_type() {
        let content_info = ContentInfo {
            content_type: ID_DATA,
            content: to_any(&OctetString::new(b"x".to_vec()).unwrap()).unwrap(),
        };
        let result = verify_signature(&content_info.to_der().unwrap());
        assert!(matches!(result, Err(SignedDataError::NotSignedData(_))));
    }

    #[test]
    fn test_malformed_signed_data() {
        let content_info = ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: to_any(&OctetString::new(b"x".to_vec()).unwrap()).unwrap(),
        };
        let result = verify_signature(&content_info.to_der().unwrap());
        assert!(matches!(result, Err(SignedDataError::Malformed(_))));
    }

    fn resign_without_certificates(serialization: &[u8]) -> Vec<u8> {
        let content_info = ContentInfo::from_der(serialization).unwrap();
        let mut signed_data: SignedDataValue = from_any(&content_info.content).unwrap();
        signed_data.certificates = None;
        ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: to_any(&signed_data).unwrap(),
        }
        .to_der()
        .unwrap()
    }

    #[test]
    fn test_missing_signer_certificate() {
        let (key, certificate) = ec_signer();
        let serialization = sign(b"data", &key, &certificate, [], &SignatureOptions::default()).unwrap();
        let stripped = resign_without_certificates(&serialization);
        assert!(matches!(
            verify_signature(&stripped),
            Err(SignedDataError::SignerCertificateNotFound)
        ));
    }

    #[test]
    fn test_signer_info_count() {
        let (key, certificate) = ec_signer();
        let serialization = sign(b"data", &key, &certificate, [], &SignatureOptions::default()).unwrap();
        let content_info = ContentInfo::from_der(&serialization).unwrap();
        let mut signed_data: SignedDataValue = from_any(&content_info.content).unwrap();
        signed_data.signer_infos = SetOfVec::new();
        let serialization = ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: to_any(&signed_data).unwrap(),
        }
        .to_der()
        .unwrap();

        assert!(matches!(
            verify_signature(&serialization),
            Err(SignedDataError::InvalidSignerInfoCount { actual: 0 })
        ));
    }

    #[test]
    fn test_detached_content_rejected() {
        let (key, certificate) = ec_signer();
        let serialization = sign(b"data", &key, &certificate, [], &SignatureOptions::default()).unwrap();
        let content_info = ContentInfo::from_der(&serialization).unwrap();
        let mut signed_data: SignedDataValue = from_any(&content_info.content).unwrap();
        signed_data.encap_content_info.econtent = None;
        let serialization = ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: to_any(&signed_data).unwrap(),
        }
        .to_der()
        .unwrap();

        assert!(matches!(
            verify_signature(&serialization),
            Err(SignedDataError::MissingContent)
        ));
    }
}
