//! Keypair derivation and signatures.
//!
//! Keypairs are derived deterministically from a seed and a chain index so
//! that a node can rebuild its whole key history from one secret. Signatures
//! are 64-byte fixed encodings on all three curves (EdDSA for Ed25519,
//! ECDSA/SHA-256 with fixed r‖s encoding for the Weierstrass curves).

use crate::{Curve, CryptoError, CryptoResult, PublicKey};
use ed25519_dalek::{Signer, Verifier};
use sha2::{Digest, Sha512};

/// A derived keypair. The secret stays inside this crate's API surface;
/// callers only pass the keypair around, never the raw scalar.
#[derive(Clone)]
pub struct Keypair {
    public: PublicKey,
    secret: [u8; 32],
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl Keypair {
    /// The public half.
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn secret(&self) -> &[u8; 32] {
        &self.secret
    }

    /// Sign `data` with this keypair.
    pub fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        sign_with(self.public.curve(), &self.secret, data)
    }
}

/// Derive the keypair at `index` of the chain seeded by `seed`.
///
/// The secret scalar is `SHA512(seed ‖ index_be32)` truncated to 32 bytes;
/// the derivation is deterministic so two nodes holding the same seed agree
/// on every key of the chain.
pub fn derive_keypair(seed: &[u8], index: u32, curve: Curve) -> CryptoResult<Keypair> {
    let mut hasher = Sha512::new();
    hasher.update(seed);
    hasher.update(index.to_be_bytes());
    let digest = hasher.finalize();

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&digest[..32]);

    let public = public_from_secret(curve, &secret)?;
    Ok(Keypair { public, secret })
}

fn public_from_secret(curve: Curve, secret: &[u8; 32]) -> CryptoResult<PublicKey> {
    let bytes = match curve {
        Curve::Ed25519 => {
            let signing = ed25519_dalek::SigningKey::from_bytes(secret);
            signing.verifying_key().to_bytes().to_vec()
        }
        Curve::P256 => {
            let signing = p256::ecdsa::SigningKey::from_slice(secret)
                .map_err(|_| CryptoError::InvalidSecret)?;
            signing
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec()
        }
        Curve::Secp256k1 => {
            let signing = k256::ecdsa::SigningKey::from_slice(secret)
                .map_err(|_| CryptoError::InvalidSecret)?;
            signing
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec()
        }
    };
    PublicKey::new(curve, bytes)
}

fn sign_with(curve: Curve, secret: &[u8; 32], data: &[u8]) -> CryptoResult<Vec<u8>> {
    match curve {
        Curve::Ed25519 => {
            let signing = ed25519_dalek::SigningKey::from_bytes(secret);
            Ok(signing.sign(data).to_bytes().to_vec())
        }
        Curve::P256 => {
            let signing = p256::ecdsa::SigningKey::from_slice(secret)
                .map_err(|_| CryptoError::InvalidSecret)?;
            let signature: p256::ecdsa::Signature = signing.sign(data);
            Ok(signature.to_bytes().to_vec())
        }
        Curve::Secp256k1 => {
            let signing = k256::ecdsa::SigningKey::from_slice(secret)
                .map_err(|_| CryptoError::InvalidSecret)?;
            let signature: k256::ecdsa::Signature = signing.sign(data);
            Ok(signature.to_bytes().to_vec())
        }
    }
}

/// Sign `data` with `keypair`.
pub fn sign(keypair: &Keypair, data: &[u8]) -> CryptoResult<Vec<u8>> {
    keypair.sign(data)
}

/// Verify `signature` over `data` under `public_key`.
///
/// Any malformed key or signature verifies as `false`; verification never
/// fails with an error so callers can treat the result as a plain predicate.
pub fn verify(public_key: &PublicKey, data: &[u8], signature: &[u8]) -> bool {
    match public_key.curve() {
        Curve::Ed25519 => {
            let point: [u8; 32] = match public_key.point_bytes().try_into() {
                Ok(point) => point,
                Err(_) => return false,
            };
            let Ok(verifying) = ed25519_dalek::VerifyingKey::from_bytes(&point) else {
                return false;
            };
            let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                return false;
            };
            verifying.verify(data, &sig).is_ok()
        }
        Curve::P256 => {
            let Ok(verifying) =
                p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key.point_bytes())
            else {
                return false;
            };
            let Ok(sig) = p256::ecdsa::Signature::from_slice(signature) else {
                return false;
            };
            verifying.verify(data, &sig).is_ok()
        }
        Curve::Secp256k1 => {
            let Ok(verifying) =
                k256::ecdsa::VerifyingKey::from_sec1_bytes(public_key.point_bytes())
            else {
                return false;
            };
            let Ok(sig) = k256::ecdsa::Signature::from_slice(signature) else {
                return false;
            };
            verifying.verify(data, &sig).is_ok()
        }
    }
}
