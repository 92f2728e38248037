//! Property-based tests for the RAMF codec and its envelopes.
//!
//! - Serialize/deserialize roundtrip for arbitrary field values
//! - Format signature gating (magic, type, version, size)
//! - Parsers reject arbitrary input without panicking

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::enveloped_data::EnvelopedData;
use crate::error::{MessageError, RamfError};
use crate::formats::{Cargo, Parcel};
use crate::ramf::{fields, FormatSignature, Message, RamfFormat};
use crate::signed_data::verify_signature;
use crate::test_support::ec_signer;

fn visible_string() -> impl Strategy<Value = String> {
    "[ -~]{0,64}"
}

// ==================== Codec Property Tests ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every representable message survives a roundtrip.
    #[test]
    fn parcel_roundtrip(
        recipient in visible_string(),
        id in visible_string(),
        timestamp in 0i64..253_402_300_799,
        ttl: u32,
        payload in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let (key, certificate) = ec_signer();
        let creation_date = Utc.timestamp_opt(timestamp, 0).unwrap();
        let parcel = Parcel::new(
            Message::new(recipient, certificate.clone(), payload)
                .with_id(id)
                .with_creation_date(creation_date)
                .with_ttl(ttl),
        );

        let serialization = parcel.serialize(key).unwrap();
        let parsed = Parcel::deserialize(&serialization).unwrap();
        prop_assert_eq!(parsed, parcel);
    }

    /// A serialization of one format is never accepted as another.
    #[test]
    fn concrete_type_is_enforced(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let (key, certificate) = ec_signer();
        let parcel = Parcel::new(Message::new("0deadbeef", certificate.clone(), payload));
        let serialization = parcel.serialize(key).unwrap();
        let is_type_mismatch = matches!(
            Cargo::deserialize(&serialization),
            Err(MessageError::Ramf(RamfError::ConcreteTypeMismatch { .. }))
        );
        prop_assert!(is_type_mismatch);
    }
}

// ==================== Format Signature Property Tests ====================

proptest! {
    /// Anything not starting with the magic constant is rejected as such.
    #[test]
    fn wrong_magic_rejected(prefix in prop::array::uniform8(any::<u8>()), rest: Vec<u8>) {
        prop_assume!(&prefix != b"Relaynet");
        let mut serialization = prefix.to_vec();
        serialization.extend_from_slice(&[0x50, 0x00]);
        serialization.extend_from_slice(&rest);
        let is_invalid_magic = matches!(
            Parcel::deserialize(&serialization),
            Err(MessageError::Ramf(RamfError::InvalidMagic))
        );
        prop_assert!(is_invalid_magic);
    }

    /// Serializations shorter than the format signature are rejected.
    #[test]
    fn short_input_rejected(serialization in prop::collection::vec(any::<u8>(), 0..10)) {
        let is_too_short = matches!(
            Parcel::deserialize(&serialization),
            Err(MessageError::Ramf(RamfError::TooShortForFormatSignature))
        );
        prop_assert!(is_too_short);
    }

    /// The format signature is parsed back to its type and version.
    #[test]
    fn format_signature_roundtrip(concrete_type: u8, concrete_version: u8, rest: Vec<u8>) {
        let signature = FormatSignature::new(concrete_type, concrete_version);
        let mut serialization = signature.to_bytes().to_vec();
        serialization.extend_from_slice(&rest);
        prop_assert_eq!(FormatSignature::parse(&serialization).unwrap(), signature);
    }
}

// ==================== Parser Robustness Property Tests ====================

proptest! {
    /// Arbitrary bytes after a valid format signature fail verification.
    #[test]
    fn garbage_signed_data_rejected(rest in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut serialization = b"Relaynet\x50\x00".to_vec();
        serialization.extend_from_slice(&rest);
        let is_signed_data_error = matches!(
            Parcel::deserialize(&serialization),
            Err(MessageError::SignedData(_))
        );
        prop_assert!(is_signed_data_error);
    }

    /// Parsers never panic on arbitrary input.
    #[test]
    fn parsers_do_not_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = fields::decode(&data);
        let _ = verify_signature(&data);
        let _ = EnvelopedData::deserialize(&data);
    }
}
