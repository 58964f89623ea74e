//! # axon-crypto
//!
//! Cryptographic primitives for the Axon network.
//!
//! This crate provides:
//! - Tagged hashes and public keys (1-byte algorithm tag + fixed payload)
//! - Address derivation from public keys
//! - Deterministic keypair derivation and signing on three curves
//! - Key certificates (hardware origin attestation)
//! - ECIES encryption for the storage nonce
//!
//! Every hash and key carried on the wire starts with its algorithm tag;
//! the tag alone determines the payload length, which is what makes the
//! wire format self-delimiting for variable-size crypto material.

mod certificate;
mod ecies;
mod error;
mod keys;

pub use certificate::{issue_key_certificate, verify_key_certificate, CertificateRegistry};
pub use ecies::{ec_decrypt, ec_encrypt, encrypt_storage_nonce};
pub use error::{CryptoError, CryptoResult};
pub use keys::{derive_keypair, sign, verify, Keypair};

use blake2::Blake2b512;
use sha2::{Digest, Sha256, Sha512};
use sha3::{Sha3_256, Sha3_512};

/// Hash algorithms addressable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256 = 0,
    /// SHA-512.
    Sha512 = 1,
    /// SHA3-256.
    Sha3_256 = 2,
    /// SHA3-512.
    Sha3_512 = 3,
    /// BLAKE2b-512.
    Blake2b = 4,
}

impl HashAlgorithm {
    /// Digest size in bytes.
    pub const fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 | HashAlgorithm::Blake2b => 64,
        }
    }
}

impl TryFrom<u8> for HashAlgorithm {
    type Error = CryptoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HashAlgorithm::Sha256),
            1 => Ok(HashAlgorithm::Sha512),
            2 => Ok(HashAlgorithm::Sha3_256),
            3 => Ok(HashAlgorithm::Sha3_512),
            4 => Ok(HashAlgorithm::Blake2b),
            other => Err(CryptoError::UnknownAlgorithm(other)),
        }
    }
}

/// Elliptic curves addressable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Curve {
    /// Ed25519 (EdDSA).
    Ed25519 = 0,
    /// NIST P-256 (ECDSA/SHA-256).
    P256 = 1,
    /// secp256k1 (ECDSA/SHA-256).
    Secp256k1 = 2,
}

impl Curve {
    /// Public key payload size in bytes (uncompressed SEC1 for the
    /// Weierstrass curves).
    pub const fn key_size(&self) -> usize {
        match self {
            Curve::Ed25519 => 32,
            Curve::P256 | Curve::Secp256k1 => 65,
        }
    }
}

impl TryFrom<u8> for Curve {
    type Error = CryptoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Curve::Ed25519),
            1 => Ok(Curve::P256),
            2 => Ok(Curve::Secp256k1),
            other => Err(CryptoError::UnknownAlgorithm(other)),
        }
    }
}

/// Payload size for a hash algorithm tag.
pub fn hash_size(tag: u8) -> CryptoResult<usize> {
    Ok(HashAlgorithm::try_from(tag)?.digest_size())
}

/// Payload size for a key curve tag.
pub fn key_size(tag: u8) -> CryptoResult<usize> {
    Ok(Curve::try_from(tag)?.key_size())
}

/// A tagged hash: algorithm byte + digest of the algorithm's size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaggedHash {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl TaggedHash {
    /// Build from an algorithm and a raw digest, checking the length.
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> CryptoResult<Self> {
        if digest.len() != algorithm.digest_size() {
            return Err(CryptoError::InvalidLength {
                expected: algorithm.digest_size(),
                got: digest.len(),
            });
        }
        Ok(Self { algorithm, digest })
    }

    /// Hash `data` with the given algorithm.
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        let digest = match algorithm {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
            HashAlgorithm::Sha3_256 => Sha3_256::digest(data).to_vec(),
            HashAlgorithm::Sha3_512 => Sha3_512::digest(data).to_vec(),
            HashAlgorithm::Blake2b => Blake2b512::digest(data).to_vec(),
        };
        Self { algorithm, digest }
    }

    /// The algorithm tag.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest, without the tag byte.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Total encoded size (tag + digest).
    pub fn encoded_size(&self) -> usize {
        1 + self.digest.len()
    }

    /// Append the tagged encoding to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.algorithm as u8);
        out.extend_from_slice(&self.digest);
    }

    /// The tagged encoding as a fresh vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_size());
        self.write(&mut out);
        out
    }

    /// Consume a tagged hash from the front of `input`, advancing it.
    pub fn decode(input: &mut &[u8]) -> CryptoResult<Self> {
        if input.is_empty() {
            return Err(CryptoError::ShortInput { needed: 1 });
        }
        let algorithm = HashAlgorithm::try_from(input[0])?;
        let size = algorithm.digest_size();
        if input.len() < 1 + size {
            return Err(CryptoError::ShortInput {
                needed: 1 + size - input.len(),
            });
        }
        let digest = input[1..1 + size].to_vec();
        *input = &input[1 + size..];
        Ok(Self { algorithm, digest })
    }
}

impl std::fmt::Display for TaggedHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}{}", self.algorithm as u8, hex::encode(&self.digest))
    }
}

/// A tagged public key: curve byte + point encoding of the curve's size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey {
    curve: Curve,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Build from a curve and raw point bytes, checking the length.
    pub fn new(curve: Curve, bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() != curve.key_size() {
            return Err(CryptoError::InvalidLength {
                expected: curve.key_size(),
                got: bytes.len(),
            });
        }
        Ok(Self { curve, bytes })
    }

    /// The curve tag.
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The raw point bytes, without the tag byte.
    pub fn point_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total encoded size (tag + point).
    pub fn encoded_size(&self) -> usize {
        1 + self.bytes.len()
    }

    /// Append the tagged encoding to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.curve as u8);
        out.extend_from_slice(&self.bytes);
    }

    /// The tagged encoding as a fresh vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_size());
        self.write(&mut out);
        out
    }

    /// Consume a tagged key from the front of `input`, advancing it.
    pub fn decode(input: &mut &[u8]) -> CryptoResult<Self> {
        if input.is_empty() {
            return Err(CryptoError::ShortInput { needed: 1 });
        }
        let curve = Curve::try_from(input[0])?;
        let size = curve.key_size();
        if input.len() < 1 + size {
            return Err(CryptoError::ShortInput {
                needed: 1 + size - input.len(),
            });
        }
        let bytes = input[1..1 + size].to_vec();
        *input = &input[1 + size..];
        Ok(Self { curve, bytes })
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}{}", self.curve as u8, hex::encode(&self.bytes))
    }
}

/// Default hash algorithm for address derivation.
pub const DEFAULT_HASH: HashAlgorithm = HashAlgorithm::Sha256;

/// Derive the chain address identified by a public key.
///
/// The address is the hash of the tagged key bytes; the tag byte of the
/// key participates in the digest, so the same point on two curves yields
/// two distinct addresses.
pub fn derive_address(public_key: &PublicKey) -> TaggedHash {
    TaggedHash::compute(DEFAULT_HASH, &public_key.to_vec())
}
