//! X.509 v3 certificate issuance and inspection.
//!
//! Every certificate issued here carries three extensions:
//!
//! ```text
//! +------------------------------+----------+--------------------------------+
//! | extension                    | critical | value                          |
//! +------------------------------+----------+--------------------------------+
//! | basicConstraints             | yes      | cA flag (+ pathLen when CA)    |
//! | subjectKeyIdentifier         | no       | SHA-256 of the subject SPKI    |
//! | authorityKeyIdentifier       | no       | issuer SKI (own SKI if self-   |
//! |                              |          | issued)                        |
//! +------------------------------+----------+--------------------------------+
//! ```
//!
//! Certificates compare and hash by their DER encoding, so two values are
//! equal exactly when their serializations are byte-identical.

use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use const_oid::ObjectIdentifier;
use der::asn1::{BitString, GeneralizedTime, OctetString, SetOfVec, UtcTime};
use der::{Any, Decode, Encode, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use relaynet_crypto::signature::{parse_signature_algorithm, signature_algorithm_oid};
use relaynet_crypto::{HashingAlgorithm, KeyFamily, PrivateKey, PublicKey};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use tracing::debug;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, BasicConstraints, SubjectKeyIdentifier};
use x509_cert::ext::Extension;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};

use crate::{CertificateError, Result};

/// Largest path length constraint accepted for CA certificates.
pub const MAX_PATH_LEN_CONSTRAINT: u8 = 2;

/// Length of randomly generated serial numbers, in bytes.
const SERIAL_NUMBER_LENGTH: usize = 8;

/// First year that must be encoded as GeneralizedTime (RFC 5280 4.1.2.5).
const GENERALIZED_TIME_CUTOFF_YEAR: i32 = 2050;

/// id-at-commonName (2.5.4.3).
pub const ID_AT_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
/// id-ce-subjectKeyIdentifier (2.5.29.14).
pub const ID_CE_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");
/// id-ce-basicConstraints (2.5.29.19).
pub const ID_CE_BASIC_CONSTRAINTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.19");
/// id-ce-authorityKeyIdentifier (2.5.29.35).
pub const ID_CE_AUTHORITY_KEY_IDENTIFIER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.5.29.35");

/// An X.509 certificate together with its DER encoding.
#[derive(Clone)]
pub struct Certificate {
    inner: x509_cert::Certificate,
    der: Vec<u8>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::Malformed`] if the bytes are not a single
    /// DER-encoded X.509 certificate.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(bytes).map_err(|e| {
            debug!(error = %e, "Rejected malformed certificate");
            CertificateError::Malformed(e.to_string())
        })?;
        Ok(Self {
            inner,
            der: bytes.to_vec(),
        })
    }

    /// The DER encoding of the certificate.
    pub fn serialize(&self) -> Vec<u8> {
        self.der.clone()
    }

    /// Borrow the DER encoding of the certificate.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// The parsed X.509 structure.
    pub fn x509(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    /// The subject common name, if present.
    pub fn common_name(&self) -> Option<String> {
        self.inner
            .tbs_certificate
            .subject
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|attribute| attribute.oid == ID_AT_COMMON_NAME)
            .and_then(|attribute| String::from_utf8(attribute.value.value().to_vec()).ok())
    }

    /// The subject distinguished name.
    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    /// The issuer distinguished name.
    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// The serial number.
    pub fn serial_number(&self) -> &SerialNumber {
        &self.inner.tbs_certificate.serial_number
    }

    /// The subject public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key algorithm is unsupported.
    pub fn subject_public_key(&self) -> Result<PublicKey> {
        let spki = self.inner.tbs_certificate.subject_public_key_info.to_der()?;
        Ok(PublicKey::from_spki_der(&spki)?)
    }

    /// The subject key identifier.
    ///
    /// Taken from the extension when present, otherwise computed as the
    /// SHA-256 digest of the subject public key info.
    pub fn subject_key_identifier(&self) -> Result<Vec<u8>> {
        if let Some(extension) = self.extension(&ID_CE_SUBJECT_KEY_IDENTIFIER) {
            let identifier = SubjectKeyIdentifier::from_der(extension.extn_value.as_bytes())?;
            return Ok(identifier.0.as_bytes().to_vec());
        }
        let spki = self.inner.tbs_certificate.subject_public_key_info.to_der()?;
        Ok(HashingAlgorithm::Sha256.digest(&spki))
    }

    /// Whether the certificate is marked as a CA.
    pub fn is_ca(&self) -> bool {
        self.basic_constraints().map(|bc| bc.ca).unwrap_or(false)
    }

    /// The path length constraint of a CA certificate.
    pub fn path_len_constraint(&self) -> Option<u8> {
        self.basic_constraints().and_then(|bc| bc.path_len_constraint)
    }

    /// Start of the validity period.
    pub fn start_date(&self) -> DateTime<Utc> {
        to_chrono(&self.inner.tbs_certificate.validity.not_before)
    }

    /// End of the validity period.
    pub fn expiry_date(&self) -> DateTime<Utc> {
        to_chrono(&self.inner.tbs_certificate.validity.not_after)
    }

    /// Check that `now` falls within the validity period.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::OutsideValidityPeriod`] otherwise.
    pub fn validate_validity_period(&self, now: DateTime<Utc>) -> Result<()> {
        if now < self.start_date() || self.expiry_date() < now {
            return Err(CertificateError::OutsideValidityPeriod);
        }
        Ok(())
    }

    /// Check that this certificate was signed by `issuer`.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::IssuerMismatch`] if the issuer name does
    /// not match, or a crypto error if the signature does not verify.
    pub fn verify_issuer(&self, issuer: &Certificate) -> Result<()> {
        if self.issuer() != issuer.subject() {
            return Err(CertificateError::IssuerMismatch);
        }
        let algorithm = &self.inner.signature_algorithm.oid;
        let (_, hashing) = parse_signature_algorithm(algorithm)
            .ok_or_else(|| CertificateError::UnsupportedSignatureAlgorithm(algorithm.to_string()))?;
        let tbs = self.inner.tbs_certificate.to_der()?;
        relaynet_crypto::signature::verify(
            &issuer.subject_public_key()?,
            &tbs,
            self.inner.signature.raw_bytes(),
            hashing,
        )?;
        Ok(())
    }

    fn extension(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .and_then(|extensions| extensions.iter().find(|ext| ext.extn_id == *oid))
    }

    fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.extension(&ID_CE_BASIC_CONSTRAINTS)
            .and_then(|ext| BasicConstraints::from_der(ext.extn_value.as_bytes()).ok())
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("common_name", &self.common_name())
            .field("serial_number", self.serial_number())
            .field("is_ca", &self.is_ca())
            .finish()
    }
}

/// Builder for issuing certificates.
///
/// Without an issuer certificate the result is self-issued: its issuer name
/// is its own subject and its authority key identifier is its own subject key
/// identifier.
#[derive(Debug)]
pub struct CertificateBuilder {
    common_name: String,
    subject_public_key: PublicKey,
    validity_end: DateTime<Utc>,
    validity_start: Option<DateTime<Utc>>,
    issuer_certificate: Option<Certificate>,
    is_ca: bool,
    path_len_constraint: u8,
}

impl CertificateBuilder {
    /// Start building a certificate for `subject_public_key`.
    pub fn new(
        common_name: impl Into<String>,
        subject_public_key: &PublicKey,
        validity_end: DateTime<Utc>,
    ) -> Self {
        Self {
            common_name: common_name.into(),
            subject_public_key: subject_public_key.clone(),
            validity_end,
            validity_start: None,
            issuer_certificate: None,
            is_ca: false,
            path_len_constraint: 0,
        }
    }

    /// Set the start of the validity period (defaults to now).
    pub fn validity_start(mut self, start: DateTime<Utc>) -> Self {
        self.validity_start = Some(start);
        self
    }

    /// Set the issuer certificate, which must be a CA.
    pub fn issuer_certificate(mut self, issuer: &Certificate) -> Self {
        self.issuer_certificate = Some(issuer.clone());
        self
    }

    /// Mark the certificate as a CA.
    pub fn ca(mut self, is_ca: bool) -> Self {
        self.is_ca = is_ca;
        self
    }

    /// Set the path length constraint (only encoded for CA certificates).
    pub fn path_len_constraint(mut self, constraint: u8) -> Self {
        self.path_len_constraint = constraint;
        self
    }

    /// Issue the certificate, signing it with `issuer_private_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the validity period is empty, the issuer is not a
    /// CA, the path length constraint is too large, or signing fails.
    pub fn issue(self, issuer_private_key: &PrivateKey) -> Result<Certificate> {
        let start = truncate_to_seconds(self.validity_start.unwrap_or_else(Utc::now));
        let end = truncate_to_seconds(self.validity_end);
        if end <= start {
            return Err(CertificateError::InvalidValidityPeriod);
        }
        if self.path_len_constraint > MAX_PATH_LEN_CONSTRAINT {
            return Err(CertificateError::InvalidPathLenConstraint {
                max: MAX_PATH_LEN_CONSTRAINT,
                actual: self.path_len_constraint,
            });
        }
        if let Some(issuer) = &self.issuer_certificate {
            if !issuer.is_ca() {
                return Err(CertificateError::IssuerNotCa);
            }
        }

        let spki_der = self.subject_public_key.to_spki_der()?;
        let subject_public_key_info = SubjectPublicKeyInfoOwned::from_der(&spki_der)?;
        let subject_key_id = HashingAlgorithm::Sha256.digest(&spki_der);
        let subject = common_name_to_name(&self.common_name)?;
        let (issuer, authority_key_id) = match &self.issuer_certificate {
            Some(issuer) => (issuer.subject().clone(), issuer.subject_key_identifier()?),
            None => (subject.clone(), subject_key_id.clone()),
        };

        let basic_constraints = BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.is_ca.then_some(self.path_len_constraint),
        };
        let authority_key_identifier = AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(authority_key_id)?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };
        let subject_key_identifier = SubjectKeyIdentifier(OctetString::new(subject_key_id)?);
        let extensions = vec![
            extension(ID_CE_BASIC_CONSTRAINTS, true, &basic_constraints)?,
            extension(ID_CE_AUTHORITY_KEY_IDENTIFIER, false, &authority_key_identifier)?,
            extension(ID_CE_SUBJECT_KEY_IDENTIFIER, false, &subject_key_identifier)?,
        ];

        let signature_algorithm = signature_algorithm_identifier(issuer_private_key.family());
        let tbs_certificate = TbsCertificate {
            version: Version::V3,
            serial_number: generate_serial_number()?,
            signature: signature_algorithm.clone(),
            issuer,
            validity: Validity {
                not_before: to_x509_time(start)?,
                not_after: to_x509_time(end)?,
            },
            subject,
            subject_public_key_info,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        };

        let tbs_der = tbs_certificate.to_der()?;
        let signature = relaynet_crypto::signature::sign(
            issuer_private_key,
            &tbs_der,
            HashingAlgorithm::Sha256,
        )?;
        let inner = x509_cert::Certificate {
            tbs_certificate,
            signature_algorithm,
            signature: BitString::from_bytes(&signature)?,
        };
        let der = inner.to_der()?;
        Ok(Certificate { inner, der })
    }
}

fn common_name_to_name(common_name: &str) -> Result<Name> {
    let attribute = AttributeTypeAndValue {
        oid: ID_AT_COMMON_NAME,
        value: Any::new(Tag::Utf8String, common_name.as_bytes())?,
    };
    let rdn = RelativeDistinguishedName(SetOfVec::try_from(vec![attribute])?);
    Ok(RdnSequence(vec![rdn]))
}

fn extension<T: Encode>(extn_id: ObjectIdentifier, critical: bool, value: &T) -> Result<Extension> {
    Ok(Extension {
        extn_id,
        critical,
        extn_value: OctetString::new(value.to_der()?)?,
    })
}

fn signature_algorithm_identifier(family: KeyFamily) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: signature_algorithm_oid(family, HashingAlgorithm::Sha256),
        parameters: match family {
            KeyFamily::Rsa => Some(Any::null()),
            KeyFamily::Ec => None,
        },
    }
}

fn generate_serial_number() -> Result<SerialNumber> {
    let mut bytes = [0u8; SERIAL_NUMBER_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    // Positive and without a leading zero octet.
    bytes[0] = (bytes[0] & 0x7F) | 0x01;
    Ok(SerialNumber::new(&bytes)?)
}

fn truncate_to_seconds(date: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(date.timestamp(), 0).unwrap_or(date)
}

fn to_x509_time(date: DateTime<Utc>) -> Result<Time> {
    let seconds = u64::try_from(date.timestamp())
        .map_err(|_| CertificateError::DateOutOfRange(date.to_rfc3339()))?;
    let duration = Duration::from_secs(seconds);
    let time = if date.year() < GENERALIZED_TIME_CUTOFF_YEAR {
        UtcTime::from_unix_duration(duration).map(Time::UtcTime)
    } else {
        GeneralizedTime::from_unix_duration(duration).map(Time::GeneralTime)
    };
    time.map_err(|_| CertificateError::DateOutOfRange(date.to_rfc3339()))
}

fn to_chrono(time: &Time) -> DateTime<Utc> {
    i64::try_from(time.to_unix_duration().as_secs())
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .unwrap_or_default()
}
