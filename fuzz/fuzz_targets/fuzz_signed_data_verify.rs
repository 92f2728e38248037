//! Fuzz target for SignedData verification.
//!
//! Tests that verifying arbitrary bytes is handled safely.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaynet_messages::signed_data::verify_signature;

fuzz_target!(|data: &[u8]| {
    if let Ok(signed_data) = verify_signature(data) {
        // The signer is always among the attached certificates
        assert!(signed_data
            .certificates()
            .contains(signed_data.signer_certificate()));
    }
});
