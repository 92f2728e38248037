//! Fuzz target for Certificate::deserialize.
//!
//! Tests that parsing arbitrary bytes as a certificate is handled safely.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaynet_pki::Certificate;

fuzz_target!(|data: &[u8]| {
    if let Ok(certificate) = Certificate::deserialize(data) {
        // Accessors must not panic on parsed certificates
        let _ = certificate.common_name();
        let _ = certificate.subject_public_key();
        let _ = certificate.subject_key_identifier();
        let _ = certificate.is_ca();
        let _ = certificate.path_len_constraint();
        let _ = certificate.start_date();
        let _ = certificate.expiry_date();

        // Roundtrip through serialize
        let roundtrip = Certificate::deserialize(&certificate.serialize()).unwrap();
        assert_eq!(certificate, roundtrip);
    }
});
