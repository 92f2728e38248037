//! Fuzz target for EnvelopedData::deserialize.
//!
//! Tests that parsing arbitrary bytes as EnvelopedData is handled safely.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaynet_messages::EnvelopedData;

fuzz_target!(|data: &[u8]| {
    if let Ok(enveloped_data) = EnvelopedData::deserialize(data) {
        // A parsed value keeps the exact input bytes as its serialization
        assert_eq!(enveloped_data.serialize(), data);
        let _ = enveloped_data.recipient_key_id();
    }
});
