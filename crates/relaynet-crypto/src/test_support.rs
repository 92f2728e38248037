//! Shared fixtures for unit tests.

use std::sync::OnceLock;

use crate::PrivateKey;

/// A 2048-bit RSA key generated once per test binary.
pub(crate) fn rsa_key() -> &'static PrivateKey {
    static KEY: OnceLock<PrivateKey> = OnceLock::new();
    KEY.get_or_init(|| PrivateKey::generate_rsa(2048).unwrap())
}
