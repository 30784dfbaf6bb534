//! Shared fixtures for the HTTP integration tests.

use std::time::Duration;

use azext_core::{ClientConfig, Credentials, ExtensionsClient, PollSettings};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder};
use wiremock::MockServer;

pub const SUBSCRIPTION: &str = "3f2a9c1e-sub";

/// Self-signed management certificate and key as one PEM bundle.
pub fn management_pem() -> Vec<u8> {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "azext-integration")
        .unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(7).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    let mut pem = builder.build().to_pem().unwrap();
    pem.extend_from_slice(&key.private_key_to_pem_pkcs8().unwrap());
    pem
}

pub fn fast_config(endpoint: &str) -> ClientConfig {
    ClientConfig::default()
        .with_endpoint(endpoint)
        .with_request_timeout(Duration::from_secs(5))
        .with_poll_settings(
            PollSettings::default()
                .with_interval(Duration::from_millis(10))
                .with_deadline(Duration::from_secs(5))
                .with_max_query_failures(3),
        )
}

pub fn client_for(server: &MockServer) -> ExtensionsClient {
    let credentials = Credentials::from_pem(SUBSCRIPTION, &management_pem()).unwrap();
    ExtensionsClient::new(&credentials, fast_config(&server.uri())).unwrap()
}
