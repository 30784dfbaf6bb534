use std::fmt;
use std::fmt::Write;

use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::x509::X509;

use crate::error::{ClientError, Result};

/// Subscription id plus the management certificate used for mutual TLS.
///
/// Parsed and checked once at construction; immutable afterwards. The
/// private key is only ever handed to the TLS layer and never formatted.
#[derive(Clone)]
pub struct Credentials {
    subscription_id: String,
    thumbprint: String,
    identity_pem: Vec<u8>,
}

impl Credentials {
    /// Build credentials from a single PEM bundle holding the certificate
    /// (optionally followed by its chain) and the private key.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidArgument`] for an empty subscription id,
    /// [`ClientError::InvalidCertificate`] when no certificate or key can be
    /// parsed or the key does not belong to the certificate.
    pub fn from_pem(subscription_id: impl Into<String>, pem: &[u8]) -> Result<Self> {
        let subscription_id = subscription_id.into();
        if subscription_id.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "subscription id must not be empty".to_string(),
            ));
        }

        let chain = X509::stack_from_pem(pem)
            .map_err(|e| ClientError::InvalidCertificate(format!("cannot parse certificate: {}", e)))?;
        let leaf = chain.first().ok_or_else(|| {
            ClientError::InvalidCertificate("no certificate found in PEM data".to_string())
        })?;

        let key = PKey::private_key_from_pem(pem)
            .map_err(|e| ClientError::InvalidCertificate(format!("cannot parse private key: {}", e)))?;

        let leaf_key = leaf
            .public_key()
            .map_err(|e| ClientError::InvalidCertificate(format!("cannot read public key: {}", e)))?;
        if !leaf_key.public_eq(&key) {
            return Err(ClientError::InvalidCertificate(
                "private key does not match the certificate".to_string(),
            ));
        }

        let thumbprint = thumbprint_of(leaf)?;

        // Re-encode so the TLS layer always sees PEM certificates and a PKCS#8 key.
        let mut identity_pem = Vec::new();
        for cert in &chain {
            let encoded = cert
                .to_pem()
                .map_err(|e| ClientError::InvalidCertificate(format!("cannot encode certificate: {}", e)))?;
            identity_pem.extend_from_slice(&encoded);
        }
        let encoded_key = key
            .private_key_to_pem_pkcs8()
            .map_err(|e| ClientError::InvalidCertificate(format!("cannot encode private key: {}", e)))?;
        identity_pem.extend_from_slice(&encoded_key);

        Ok(Self {
            subscription_id,
            thumbprint,
            identity_pem,
        })
    }

    /// Build credentials from a certificate and a private key kept in two
    /// separate PEM documents.
    pub fn from_pem_pair(
        subscription_id: impl Into<String>,
        cert_pem: &[u8],
        key_pem: &[u8],
    ) -> Result<Self> {
        let mut bundle = Vec::with_capacity(cert_pem.len() + key_pem.len() + 1);
        bundle.extend_from_slice(cert_pem);
        bundle.push(b'\n');
        bundle.extend_from_slice(key_pem);
        Self::from_pem(subscription_id, &bundle)
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Upper-case hex SHA-1 thumbprint of the leaf certificate.
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Client identity presented during the TLS handshake.
    pub(crate) fn identity(&self) -> Result<reqwest::Identity> {
        reqwest::Identity::from_pem(&self.identity_pem)
            .map_err(|e| ClientError::InvalidCertificate(format!("unusable client identity: {}", e)))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("subscription_id", &self.subscription_id)
            .field("thumbprint", &self.thumbprint)
            .finish_non_exhaustive()
    }
}

fn thumbprint_of(cert: &X509) -> Result<String> {
    let digest = cert
        .digest(MessageDigest::sha1())
        .map_err(|e| ClientError::InvalidCertificate(format!("cannot compute thumbprint: {}", e)))?;
    Ok(digest.iter().fold(String::new(), |mut acc, b| {
        let _ = write!(acc, "{:02X}", b);
        acc
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_support::self_signed;

    #[test]
    fn accepts_single_bundle() {
        let (cert, key) = self_signed("bundle");
        let mut pem = cert.clone();
        pem.extend_from_slice(&key);

        let creds = Credentials::from_pem("sub-1", &pem).unwrap();
        assert_eq!(creds.subscription_id(), "sub-1");
        assert_eq!(creds.thumbprint().len(), 40);
        assert!(creds
            .thumbprint()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert!(creds.identity().is_ok());
    }

    #[test]
    fn accepts_key_before_certificate_in_separate_documents() {
        let (cert, key) = self_signed("pair");
        let from_pair = Credentials::from_pem_pair("sub-1", &cert, &key).unwrap();

        let mut reversed = key.clone();
        reversed.extend_from_slice(&cert);
        let from_reversed = Credentials::from_pem("sub-1", &reversed).unwrap();

        assert_eq!(from_pair.thumbprint(), from_reversed.thumbprint());
    }

    #[test]
    fn empty_subscription_is_an_argument_error() {
        let (cert, key) = self_signed("empty-sub");
        let err = Credentials::from_pem_pair("  ", &cert, &key).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn missing_key_is_rejected() {
        let (cert, _) = self_signed("no-key");
        let err = Credentials::from_pem("sub-1", &cert).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCertificate(_)));
    }

    #[test]
    fn missing_certificate_is_rejected() {
        let (_, key) = self_signed("no-cert");
        let err = Credentials::from_pem("sub-1", &key).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCertificate(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = Credentials::from_pem("sub-1", b"definitely not pem").unwrap_err();
        assert!(matches!(err, ClientError::InvalidCertificate(_)));
    }

    #[test]
    fn mismatched_key_is_rejected() {
        let (cert, _) = self_signed("first");
        let (_, other_key) = self_signed("second");
        let err = Credentials::from_pem_pair("sub-1", &cert, &other_key).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCertificate(msg) if msg.contains("does not match")));
    }

    #[test]
    fn debug_output_hides_key_material() {
        let (cert, key) = self_signed("debug");
        let creds = Credentials::from_pem_pair("sub-1", &cert, &key).unwrap();
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("sub-1"));
        assert!(!rendered.contains("PRIVATE KEY"));
    }
}
