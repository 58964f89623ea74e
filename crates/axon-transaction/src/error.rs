//! Encoding error types.

use axon_crypto::CryptoError;
use thiserror::Error;

/// Errors raised while encoding or decoding canonical byte sequences.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Input ended early; `needed` more bytes would let decoding continue.
    #[error("Short input: {needed} more bytes needed")]
    ShortInput { needed: usize },

    /// Structurally invalid input.
    #[error("Malformed input: {0}")]
    Malformed(&'static str),

    /// An algorithm tag outside the compile-time tables.
    #[error("Unknown algorithm tag: {0}")]
    UnknownAlgorithm(u8),

    /// A transaction type byte outside the known set.
    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(u8),

    /// A wire amount that is not an exact sub-unit count.
    #[error("Amount not representable as sub-units")]
    AmountNotRepresentable,
}

impl From<CryptoError> for EncodingError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::ShortInput { needed } => EncodingError::ShortInput { needed },
            CryptoError::UnknownAlgorithm(tag) => EncodingError::UnknownAlgorithm(tag),
            _ => EncodingError::Malformed("invalid crypto material"),
        }
    }
}

/// Result type for encoding operations.
pub type EncodingResult<T> = Result<T, EncodingError>;
