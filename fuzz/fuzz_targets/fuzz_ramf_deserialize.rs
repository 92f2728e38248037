//! Fuzz target for RAMF deserialization.
//!
//! Tests that arbitrary serializations are rejected safely by every format.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaynet_messages::{Cargo, CargoCollectionAuthorization, Parcel, RamfFormat};

fuzz_target!(|data: &[u8]| {
    // Should fail gracefully - never panic
    let parcel = Parcel::deserialize(data);
    let cargo = Cargo::deserialize(data);
    let cca = CargoCollectionAuthorization::deserialize(data);

    // The concrete type octet admits at most one format
    let accepted = [parcel.is_ok(), cargo.is_ok(), cca.is_ok()];
    assert!(accepted.iter().filter(|ok| **ok).count() <= 1);
});
