//! ASN.1 structures from the Cryptographic Message Syntax (RFC 5652) and its
//! ECC profile (RFC 5753).
//!
//! Only the subset needed by the signing and encryption envelopes is
//! modelled. SET OF collections whose items are CHOICEs or whose order
//! must follow DER rules are kept as [`Any`] values and converted with
//! [`to_any`] / [`from_any`].

use const_oid::ObjectIdentifier;
use der::asn1::{BitString, GeneralizedTime, OctetString, SetOfVec};
use der::{Any, Choice, Decode, DecodeOwned, Encode, Sequence, Tag, TagNumber, Tagged};
use spki::AlgorithmIdentifierOwned;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

// ==================== Object identifiers ====================

/// id-data (1.2.840.113549.1.7.1).
pub const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
/// id-signedData (1.2.840.113549.1.7.2).
pub const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
/// id-envelopedData (1.2.840.113549.1.7.3).
pub const ID_ENVELOPED_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.3");
/// id-contentType (1.2.840.113549.1.9.3).
pub const ID_CONTENT_TYPE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");
/// id-messageDigest (1.2.840.113549.1.9.4).
pub const ID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");

// ==================== Versions ====================

/// SignedData version when only X.509 certificates and id-data are used.
pub const SIGNED_DATA_VERSION: u8 = 1;
/// SignerInfo version when the signer is identified by issuer and serial.
pub const SIGNER_INFO_VERSION: u8 = 1;
/// EnvelopedData version with a single KeyTransRecipientInfo.
pub const ENVELOPED_DATA_KEY_TRANSPORT_VERSION: u8 = 0;
/// EnvelopedData version with a KeyAgreeRecipientInfo.
pub const ENVELOPED_DATA_KEY_AGREEMENT_VERSION: u8 = 2;
/// KeyTransRecipientInfo version with an IssuerAndSerialNumber rid.
pub const KEY_TRANSPORT_RECIPIENT_VERSION: u8 = 0;
/// KeyAgreeRecipientInfo version.
pub const KEY_AGREEMENT_RECIPIENT_VERSION: u8 = 3;

// ==================== Content ====================

/// `ContentInfo ::= SEQUENCE { contentType, content [0] EXPLICIT ANY }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ContentInfo {
    /// Type of the wrapped content.
    pub content_type: ObjectIdentifier,
    /// The wrapped content.
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    pub content: Any,
}

/// `EncapsulatedContentInfo ::= SEQUENCE { eContentType, eContent [0] EXPLICIT OCTET STRING OPTIONAL }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EncapsulatedContentInfo {
    /// Type of the encapsulated content.
    pub econtent_type: ObjectIdentifier,
    /// The content itself, absent for detached signatures.
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", optional = "true")]
    pub econtent: Option<OctetString>,
}

/// `Attribute ::= SEQUENCE { attrType, attrValues SET OF AttributeValue }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Attribute {
    /// Attribute type.
    pub attr_type: ObjectIdentifier,
    /// Attribute values.
    pub attr_values: SetOfVec<Any>,
}

/// `IssuerAndSerialNumber ::= SEQUENCE { issuer Name, serialNumber CertificateSerialNumber }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct IssuerAndSerialNumber {
    /// Issuer distinguished name.
    pub issuer: Name,
    /// Certificate serial number.
    pub serial_number: SerialNumber,
}

/// `SignerIdentifier ::= CHOICE { issuerAndSerialNumber, subjectKeyIdentifier [0] }`
///
/// The key transport `RecipientIdentifier` has the same shape and uses this
/// type too.
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum SignerIdentifier {
    /// Issuer name and serial number of the certificate.
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    /// Subject key identifier of the certificate.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    SubjectKeyIdentifier(OctetString),
}

// ==================== SignedData ====================

/// `SignedData` (RFC 5652 5.1).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SignedDataValue {
    /// Syntax version.
    pub version: u8,
    /// Digest algorithms used by the signers.
    pub digest_algorithms: SetOfVec<AlgorithmIdentifierOwned>,
    /// The signed content.
    pub encap_content_info: EncapsulatedContentInfo,
    /// Attached certificates.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub certificates: Option<SetOfVec<Any>>,
    /// Attached revocation lists.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub crls: Option<SetOfVec<Any>>,
    /// One entry per signer.
    pub signer_infos: SetOfVec<Any>,
}

/// `SignerInfo` (RFC 5652 5.3).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SignerInfo {
    /// Syntax version.
    pub version: u8,
    /// Signer certificate identifier.
    pub sid: SignerIdentifier,
    /// Digest algorithm.
    pub digest_algorithm: AlgorithmIdentifierOwned,
    /// Signed attributes.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub signed_attrs: Option<SetOfVec<Any>>,
    /// Signature algorithm.
    pub signature_algorithm: AlgorithmIdentifierOwned,
    /// Signature value.
    pub signature: OctetString,
    /// Unsigned attributes.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub unsigned_attrs: Option<SetOfVec<Any>>,
}

// ==================== EnvelopedData ====================

/// `OriginatorInfo ::= SEQUENCE { certs [0] IMPLICIT OPTIONAL, crls [1] IMPLICIT OPTIONAL }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct OriginatorInfo {
    /// Originator certificates.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub certs: Option<SetOfVec<Any>>,
    /// Originator revocation lists.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub crls: Option<SetOfVec<Any>>,
}

/// `EnvelopedData` (RFC 5652 6.1).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EnvelopedDataValue {
    /// Syntax version.
    pub version: u8,
    /// Originator certificates and revocation lists.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub originator_info: Option<OriginatorInfo>,
    /// One entry per recipient. Each item is a `RecipientInfo` CHOICE.
    pub recipient_infos: SetOfVec<Any>,
    /// The encrypted content.
    pub encrypted_content_info: EncryptedContentInfo,
    /// Unprotected attributes.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true", optional = "true")]
    pub unprotected_attrs: Option<SetOfVec<Any>>,
}

/// `EncryptedContentInfo` (RFC 5652 6.1).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EncryptedContentInfo {
    /// Type of the plaintext.
    pub content_type: ObjectIdentifier,
    /// Content-encryption algorithm and its IV.
    pub content_encryption_algorithm: AlgorithmIdentifierOwned,
    /// The ciphertext.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub encrypted_content: Option<OctetString>,
}

/// `KeyTransRecipientInfo` (RFC 5652 6.2.1).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct KeyTransRecipientInfo {
    /// Syntax version.
    pub version: u8,
    /// Recipient certificate identifier.
    pub rid: SignerIdentifier,
    /// Key-encryption algorithm.
    pub key_encryption_algorithm: AlgorithmIdentifierOwned,
    /// The encrypted content-encryption key.
    pub encrypted_key: OctetString,
}

/// `KeyAgreeRecipientInfo` (RFC 5652 6.2.2).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct KeyAgreeRecipientInfo {
    /// Syntax version.
    pub version: u8,
    /// Originator key or certificate.
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    pub originator: OriginatorIdentifierOrKey,
    /// User keying material.
    #[asn1(context_specific = "1", tag_mode = "EXPLICIT", optional = "true")]
    pub ukm: Option<OctetString>,
    /// Key agreement scheme, parameterized by the key-wrap algorithm.
    pub key_encryption_algorithm: AlgorithmIdentifierOwned,
    /// Wrapped keys, one per recipient key.
    pub recipient_encrypted_keys: Vec<RecipientEncryptedKey>,
}

/// `OriginatorIdentifierOrKey` (RFC 5652 6.2.2).
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum OriginatorIdentifierOrKey {
    /// Originator certificate by issuer and serial number.
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    /// Originator certificate by subject key identifier.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    SubjectKeyIdentifier(OctetString),
    /// Inline originator public key.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true")]
    OriginatorKey(OriginatorPublicKey),
}

/// `OriginatorPublicKey ::= SEQUENCE { algorithm, publicKey BIT STRING }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct OriginatorPublicKey {
    /// Key algorithm (id-ecPublicKey with the named curve).
    pub algorithm: AlgorithmIdentifierOwned,
    /// SEC1 point.
    pub public_key: BitString,
}

/// `RecipientEncryptedKey ::= SEQUENCE { rid, encryptedKey }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct RecipientEncryptedKey {
    /// Recipient identifier.
    pub rid: KeyAgreeRecipientIdentifier,
    /// The wrapped content-encryption key.
    pub encrypted_key: OctetString,
}

/// `KeyAgreeRecipientIdentifier ::= CHOICE { issuerAndSerialNumber, rKeyId [0] IMPLICIT }`
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum KeyAgreeRecipientIdentifier {
    /// Recipient certificate by issuer and serial number.
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    /// Recipient key by key identifier.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true")]
    RecipientKeyIdentifier(RecipientKeyIdentifier),
}

/// `RecipientKeyIdentifier ::= SEQUENCE { subjectKeyIdentifier, date OPTIONAL, other OPTIONAL }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct RecipientKeyIdentifier {
    /// Key identifier.
    pub subject_key_identifier: OctetString,
    /// Key generation date.
    pub date: Option<GeneralizedTime>,
    /// Other key attribute.
    pub other: Option<Any>,
}

/// `RSAES-OAEP-params` (RFC 4055 4.1).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct RsaOaepParams {
    /// Digest algorithm, SHA-1 when absent.
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", optional = "true")]
    pub hash_algorithm: Option<AlgorithmIdentifierOwned>,
    /// Mask generation function, MGF1 with SHA-1 when absent.
    #[asn1(context_specific = "1", tag_mode = "EXPLICIT", optional = "true")]
    pub mask_gen_algorithm: Option<AlgorithmIdentifierOwned>,
    /// Label source, empty when absent.
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT", optional = "true")]
    pub p_source_algorithm: Option<AlgorithmIdentifierOwned>,
}

/// `ECC-CMS-SharedInfo` (RFC 5753 7.2), the KDF input.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EccCmsSharedInfo {
    /// Key-wrap algorithm.
    pub key_info: AlgorithmIdentifierOwned,
    /// User keying material.
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", optional = "true")]
    pub entity_u_info: Option<OctetString>,
    /// Length of the KEK in bits, as a 32-bit big-endian integer.
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT")]
    pub supp_pub_info: OctetString,
}

// ==================== Helpers ====================

/// Re-encode a value as [`Any`].
pub fn to_any<T: Encode>(value: &T) -> der::Result<Any> {
    Any::from_der(&value.to_der()?)
}

/// Decode a value previously captured as [`Any`].
pub fn from_any<T: DecodeOwned>(any: &Any) -> der::Result<T> {
    T::from_der(&any.to_der()?)
}

/// Replace the tag of `any` with an IMPLICIT context-specific tag.
pub fn implicit(number: TagNumber, any: &Any) -> der::Result<Any> {
    let tag = Tag::ContextSpecific {
        constructed: any.tag().is_constructed(),
        number,
    };
    Any::new(tag, any.value())
}

/// Replace the tag of `any` with `tag`, undoing [`implicit`].
pub fn retag(any: &Any, tag: Tag) -> der::Result<Any> {
    Any::new(tag, any.value())
}

/// Build an algorithm identifier without parameters.
pub fn algorithm(oid: ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_info_roundtrip() {
        let content = to_any(&OctetString::new(b"hello".to_vec()).unwrap()).unwrap();
        let info = ContentInfo {
            content_type: ID_DATA,
            content,
        };
        let der = info.to_der().unwrap();
        // SEQUENCE { OID, [0] { OCTET STRING } }
        assert_eq!(der[0], 0x30);
        assert_eq!(ContentInfo::from_der(&der).unwrap(), info);
    }

    #[test]
    fn test_implicit_retag_roundtrip() {
        let original = to_any(&OctetString::new(vec![1, 2, 3]).unwrap()).unwrap();
        let tagged = implicit(TagNumber::N1, &original).unwrap();
        assert_eq!(
            tagged.tag(),
            Tag::ContextSpecific {
                constructed: false,
                number: TagNumber::N1
            }
        );
        assert_eq!(retag(&tagged, Tag::OctetString).unwrap(), original);
    }

    #[test]
    fn test_signer_identifier_choice() {
        let sid = SignerIdentifier::SubjectKeyIdentifier(OctetString::new(vec![9; 4]).unwrap());
        let der = sid.to_der().unwrap();
        assert_eq!(der[0], 0x80);
        assert_eq!(SignerIdentifier::from_der(&der).unwrap(), sid);
    }

    #[test]
    fn test_shared_info_encoding() {
        let info = EccCmsSharedInfo {
            key_info: algorithm(relaynet_crypto::symmetric::ID_AES128_WRAP),
            entity_u_info: None,
            supp_pub_info: OctetString::new(128u32.to_be_bytes().to_vec()).unwrap(),
        };
        let der = info.to_der().unwrap();
        // ... [2] { OCTET STRING 00 00 00 80 }
        assert_eq!(&der[der.len() - 8..], &[0xA2, 0x06, 0x04, 0x04, 0x00, 0x00, 0x00, 0x80]);
    }
}
