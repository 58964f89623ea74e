//! Key certificates.
//!
//! A certificate attests that a public key was produced by a recognised
//! hardware or software origin: it is a signature over the tagged subject
//! key, issued by the origin's certification key. Software keys carry an
//! empty certificate (there is no hardware enclave to attest them).

use crate::{verify, CryptoResult, Keypair, PublicKey};
use std::collections::HashMap;

/// Issue a certificate for `subject` signed by `issuer`.
pub fn issue_key_certificate(issuer: &Keypair, subject: &PublicKey) -> CryptoResult<Vec<u8>> {
    issuer.sign(&subject.to_vec())
}

/// Verify that `certificate` attests `subject` under `issuer`.
///
/// An empty certificate is accepted: software origin keys have none.
pub fn verify_key_certificate(subject: &PublicKey, certificate: &[u8], issuer: &PublicKey) -> bool {
    if certificate.is_empty() {
        return true;
    }
    verify(issuer, &subject.to_vec(), certificate)
}

/// In-memory registry of certificates keyed by the tagged subject key.
///
/// Nodes load hardware certificates at startup (from the enclave or the
/// provisioning bundle); keys without an entry are software keys and
/// resolve to the empty certificate.
#[derive(Debug, Default)]
pub struct CertificateRegistry {
    certificates: HashMap<Vec<u8>, Vec<u8>>,
}

impl CertificateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a certificate for `subject`.
    pub fn insert(&mut self, subject: &PublicKey, certificate: Vec<u8>) {
        self.certificates.insert(subject.to_vec(), certificate);
    }

    /// The certificate for `subject`, empty for unregistered (software) keys.
    pub fn get_key_certificate(&self, subject: &PublicKey) -> Vec<u8> {
        self.certificates
            .get(&subject.to_vec())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derive_keypair, Curve};

    #[test]
    fn test_certificate_roundtrip() {
        let issuer = derive_keypair(b"origin seed", 0, Curve::Ed25519).unwrap();
        let subject = derive_keypair(b"node seed", 0, Curve::Ed25519).unwrap();

        let cert = issue_key_certificate(&issuer, subject.public()).unwrap();
        assert!(verify_key_certificate(subject.public(), &cert, issuer.public()));
    }

    #[test]
    fn test_certificate_wrong_issuer_rejected() {
        let issuer = derive_keypair(b"origin seed", 0, Curve::Ed25519).unwrap();
        let other = derive_keypair(b"other seed", 0, Curve::Ed25519).unwrap();
        let subject = derive_keypair(b"node seed", 0, Curve::Ed25519).unwrap();

        let cert = issue_key_certificate(&issuer, subject.public()).unwrap();
        assert!(!verify_key_certificate(subject.public(), &cert, other.public()));
    }

    #[test]
    fn test_empty_certificate_accepted() {
        let issuer = derive_keypair(b"origin seed", 0, Curve::Ed25519).unwrap();
        let subject = derive_keypair(b"node seed", 0, Curve::Ed25519).unwrap();
        assert!(verify_key_certificate(subject.public(), &[], issuer.public()));
    }

    #[test]
    fn test_registry_defaults_to_empty() {
        let subject = derive_keypair(b"node seed", 0, Curve::Ed25519).unwrap();
        let mut registry = CertificateRegistry::new();
        assert!(registry.get_key_certificate(subject.public()).is_empty());

        registry.insert(subject.public(), vec![1, 2, 3]);
        assert_eq!(registry.get_key_certificate(subject.public()), vec![1, 2, 3]);
    }
}
