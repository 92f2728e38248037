//! Shared fixtures for unit tests.

use std::sync::OnceLock;

use chrono::{Duration, Utc};
use relaynet_crypto::PrivateKey;
use relaynet_pki::{Certificate, CertificateBuilder};

/// A 2048-bit RSA key generated once per test binary.
pub(crate) fn rsa_key() -> &'static PrivateKey {
    static KEY: OnceLock<PrivateKey> = OnceLock::new();
    KEY.get_or_init(|| PrivateKey::generate_rsa(2048).unwrap())
}

/// Self-issued CA certificate valid for one day.
pub(crate) fn issue_ca(key: &PrivateKey, common_name: &str) -> Certificate {
    CertificateBuilder::new(common_name, &key.public_key(), Utc::now() + Duration::days(1))
        .ca(true)
        .path_len_constraint(2)
        .issue(key)
        .unwrap()
}

/// End-entity certificate issued by `issuer`.
pub(crate) fn issue_leaf(
    key: &PrivateKey,
    common_name: &str,
    issuer: &Certificate,
    issuer_key: &PrivateKey,
) -> Certificate {
    CertificateBuilder::new(common_name, &key.public_key(), Utc::now() + Duration::hours(12))
        .issuer_certificate(issuer)
        .issue(issuer_key)
        .unwrap()
}

/// A P-256 key with a self-issued certificate, generated once per test binary.
pub(crate) fn ec_signer() -> &'static (PrivateKey, Certificate) {
    static SIGNER: OnceLock<(PrivateKey, Certificate)> = OnceLock::new();
    SIGNER.get_or_init(|| {
        let key = PrivateKey::generate_ec(relaynet_crypto::EcCurve::P256);
        let certificate = issue_ca(&key, "signer");
        (key, certificate)
    })
}
