//! ECIES encryption against a tagged public key.
//!
//! Used to hand the storage nonce to a newly authorized node: the sender
//! performs an ephemeral Diffie-Hellman against the recipient key, derives
//! an AES-256-GCM key through HKDF-SHA256, and seals the payload.
//!
//! Wire format: `ephemeral_public ‖ nonce(12) ‖ ciphertext+tag`. The
//! ephemeral key is curve-native: 32 bytes (X25519) for Ed25519 recipients,
//! 65 bytes (uncompressed SEC1) for the Weierstrass curves.

use crate::{Curve, CryptoError, CryptoResult, Keypair, PublicKey};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hkdf::Hkdf;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

const GCM_NONCE_SIZE: usize = 12;
const X25519_KEY_SIZE: usize = 32;
const SEC1_KEY_SIZE: usize = 65;
const HKDF_INFO: &[u8] = b"axon ecies v1";

/// Encrypt `plaintext` so only the holder of `recipient`'s secret can read it.
pub fn ec_encrypt(recipient: &PublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let (ephemeral_public, shared) = match recipient.curve() {
        Curve::Ed25519 => {
            let point: [u8; 32] = recipient
                .point_bytes()
                .try_into()
                .map_err(|_| CryptoError::InvalidKey)?;
            let verifying = ed25519_dalek::VerifyingKey::from_bytes(&point)
                .map_err(|_| CryptoError::InvalidKey)?;
            let recipient_x = x25519_dalek::PublicKey::from(verifying.to_montgomery().to_bytes());

            let ephemeral = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
            let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);
            let shared = ephemeral.diffie_hellman(&recipient_x);
            (ephemeral_public.as_bytes().to_vec(), shared.as_bytes().to_vec())
        }
        Curve::P256 => {
            let recipient_key = p256::PublicKey::from_sec1_bytes(recipient.point_bytes())
                .map_err(|_| CryptoError::InvalidKey)?;
            let ephemeral = p256::ecdh::EphemeralSecret::random(&mut OsRng);
            let ephemeral_public = ephemeral.public_key().to_encoded_point(false);
            let shared = ephemeral.diffie_hellman(&recipient_key);
            (
                ephemeral_public.as_bytes().to_vec(),
                shared.raw_secret_bytes().to_vec(),
            )
        }
        Curve::Secp256k1 => {
            let recipient_key = k256::PublicKey::from_sec1_bytes(recipient.point_bytes())
                .map_err(|_| CryptoError::InvalidKey)?;
            let ephemeral = k256::ecdh::EphemeralSecret::random(&mut OsRng);
            let ephemeral_public = ephemeral.public_key().to_encoded_point(false);
            let shared = ephemeral.diffie_hellman(&recipient_key);
            (
                ephemeral_public.as_bytes().to_vec(),
                shared.raw_secret_bytes().to_vec(),
            )
        }
    };

    let sealed = seal(&shared, plaintext)?;
    let mut out = Vec::with_capacity(ephemeral_public.len() + sealed.len());
    out.extend_from_slice(&ephemeral_public);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt a payload produced by [`ec_encrypt`] with the recipient keypair.
pub fn ec_decrypt(recipient: &Keypair, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let ephemeral_size = match recipient.public().curve() {
        Curve::Ed25519 => X25519_KEY_SIZE,
        Curve::P256 | Curve::Secp256k1 => SEC1_KEY_SIZE,
    };
    if ciphertext.len() < ephemeral_size + GCM_NONCE_SIZE {
        return Err(CryptoError::Decryption);
    }
    let (ephemeral_bytes, sealed) = ciphertext.split_at(ephemeral_size);

    let shared = match recipient.public().curve() {
        Curve::Ed25519 => {
            let ephemeral: [u8; 32] = ephemeral_bytes
                .try_into()
                .map_err(|_| CryptoError::Decryption)?;
            let signing = ed25519_dalek::SigningKey::from_bytes(recipient.secret());
            let secret = x25519_dalek::StaticSecret::from(signing.to_scalar_bytes());
            let shared = secret.diffie_hellman(&x25519_dalek::PublicKey::from(ephemeral));
            shared.as_bytes().to_vec()
        }
        Curve::P256 => {
            let ephemeral = p256::PublicKey::from_sec1_bytes(ephemeral_bytes)
                .map_err(|_| CryptoError::Decryption)?;
            let secret = p256::SecretKey::from_slice(recipient.secret())
                .map_err(|_| CryptoError::InvalidSecret)?;
            let shared =
                p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), ephemeral.as_affine());
            shared.raw_secret_bytes().to_vec()
        }
        Curve::Secp256k1 => {
            let ephemeral = k256::PublicKey::from_sec1_bytes(ephemeral_bytes)
                .map_err(|_| CryptoError::Decryption)?;
            let secret = k256::SecretKey::from_slice(recipient.secret())
                .map_err(|_| CryptoError::InvalidSecret)?;
            let shared =
                k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), ephemeral.as_affine());
            shared.raw_secret_bytes().to_vec()
        }
    };

    open(&shared, sealed)
}

/// Encrypt the storage nonce for a node public key.
pub fn encrypt_storage_nonce(recipient: &PublicKey, nonce: &[u8]) -> CryptoResult<Vec<u8>> {
    ec_encrypt(recipient, nonce)
}

fn derive_aead_key(shared: &[u8]) -> CryptoResult<[u8; 32]> {
    let hkdf = Hkdf::<Sha256>::new(None, shared);
    let mut key = [0u8; 32];
    hkdf.expand(HKDF_INFO, &mut key)
        .map_err(|_| CryptoError::Encryption)?;
    Ok(key)
}

fn seal(shared: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let key = derive_aead_key(shared)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::Encryption)?;

    let mut nonce_bytes = [0u8; GCM_NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut out = Vec::with_capacity(GCM_NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn open(shared: &[u8], sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < GCM_NONCE_SIZE {
        return Err(CryptoError::Decryption);
    }
    let key = derive_aead_key(shared)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::Decryption)?;

    let (nonce_bytes, ciphertext) = sealed.split_at(GCM_NONCE_SIZE);
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive_keypair;

    #[test]
    fn test_roundtrip_ed25519() {
        let recipient = derive_keypair(b"seed", 0, Curve::Ed25519).unwrap();
        let sealed = ec_encrypt(recipient.public(), b"storage nonce").unwrap();
        let opened = ec_decrypt(&recipient, &sealed).unwrap();
        assert_eq!(opened, b"storage nonce");
    }

    #[test]
    fn test_roundtrip_p256() {
        let recipient = derive_keypair(b"seed", 1, Curve::P256).unwrap();
        let sealed = ec_encrypt(recipient.public(), b"storage nonce").unwrap();
        let opened = ec_decrypt(&recipient, &sealed).unwrap();
        assert_eq!(opened, b"storage nonce");
    }

    #[test]
    fn test_roundtrip_secp256k1() {
        let recipient = derive_keypair(b"seed", 2, Curve::Secp256k1).unwrap();
        let sealed = ec_encrypt(recipient.public(), b"storage nonce").unwrap();
        let opened = ec_decrypt(&recipient, &sealed).unwrap();
        assert_eq!(opened, b"storage nonce");
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let recipient = derive_keypair(b"seed", 0, Curve::Ed25519).unwrap();
        let other = derive_keypair(b"other", 0, Curve::Ed25519).unwrap();
        let sealed = ec_encrypt(recipient.public(), b"storage nonce").unwrap();
        assert!(ec_decrypt(&other, &sealed).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let recipient = derive_keypair(b"seed", 0, Curve::Ed25519).unwrap();
        let mut sealed = ec_encrypt(recipient.public(), b"storage nonce").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(ec_decrypt(&recipient, &sealed).is_err());
    }

    #[test]
    fn test_truncated_payload_fails() {
        let recipient = derive_keypair(b"seed", 0, Curve::Ed25519).unwrap();
        assert!(ec_decrypt(&recipient, &[0u8; 8]).is_err());
    }
}
