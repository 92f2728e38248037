//! Property-based tests for certificate issuance.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use relaynet_crypto::{EcCurve, PrivateKey};

use crate::{Certificate, CertificateBuilder, CertificateError};

// ==================== Issuance Property Tests ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any common name survives issuance and a DER roundtrip.
    #[test]
    fn common_name_roundtrip(common_name in "[a-zA-Z0-9 .@-]{1,64}") {
        let key = PrivateKey::generate_ec(EcCurve::P256);
        let certificate = CertificateBuilder::new(
            common_name.clone(),
            &key.public_key(),
            Utc::now() + Duration::hours(1),
        )
        .issue(&key)
        .unwrap();

        let parsed = Certificate::deserialize(&certificate.serialize()).unwrap();
        prop_assert_eq!(parsed.common_name(), Some(common_name));
        prop_assert_eq!(parsed, certificate);
    }

    /// Validity periods are preserved to the second on either side of 2050.
    #[test]
    fn validity_period_roundtrip(start_offset in 0i64..1_000_000_000, length in 1i64..1_000_000_000) {
        let key = PrivateKey::generate_ec(EcCurve::P256);
        let start = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(start_offset);
        let end = start + Duration::seconds(length);
        let certificate = CertificateBuilder::new("node", &key.public_key(), end)
            .validity_start(start)
            .issue(&key)
            .unwrap();

        prop_assert_eq!(certificate.start_date(), start);
        prop_assert_eq!(certificate.expiry_date(), end);
    }

    /// An end date at or before the start date is always rejected.
    #[test]
    fn empty_validity_period_rejected(backwards in 0i64..1_000_000) {
        let key = PrivateKey::generate_ec(EcCurve::P256);
        let start = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let result = CertificateBuilder::new("node", &key.public_key(), start - Duration::seconds(backwards))
            .validity_start(start)
            .issue(&key);
        prop_assert!(matches!(result, Err(CertificateError::InvalidValidityPeriod)));
    }
}
