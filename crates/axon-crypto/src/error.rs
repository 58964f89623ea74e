//! Crypto error types.

use thiserror::Error;

/// Errors raised by the crypto primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// An algorithm tag outside the compile-time tables.
    #[error("Unknown algorithm tag: {0}")]
    UnknownAlgorithm(u8),

    /// Input ended before a tagged value was complete.
    #[error("Short input: {needed} more bytes needed")]
    ShortInput { needed: usize },

    /// A payload had the wrong length for its tag.
    #[error("Invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// Key bytes do not describe a valid point/scalar on the curve.
    #[error("Invalid key material")]
    InvalidKey,

    /// Secret bytes rejected by the curve (zero or out of range scalar).
    #[error("Invalid secret scalar")]
    InvalidSecret,

    /// Authenticated encryption failed.
    #[error("Encryption failed")]
    Encryption,

    /// Authenticated decryption failed.
    #[error("Decryption failed")]
    Decryption,
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
