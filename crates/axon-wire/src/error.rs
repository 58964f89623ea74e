//! Wire error types.

use axon_crypto::CryptoError;
use axon_transaction::EncodingError;
use thiserror::Error;

/// Errors raised by the frame codec, the stream layer and the dispatcher.
#[derive(Error, Debug)]
pub enum WireError {
    /// A frame tag in the reserved range.
    #[error("Unknown frame tag: {0}")]
    UnknownFrame(u8),

    /// A crypto algorithm tag outside the compile-time tables.
    #[error("Unknown algorithm tag: {0}")]
    UnknownAlgorithm(u8),

    /// Input ended early; `needed` more bytes would let decoding continue.
    #[error("Incomplete frame: {needed} more bytes needed")]
    Incomplete { needed: usize },

    /// Structurally invalid frame.
    #[error("Malformed frame: {0}")]
    Malformed(&'static str),

    /// A stream datagram above the configured cap.
    #[error("Message too large: {size} bytes, max {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    /// I/O failure on the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal inconsistency inside a handler. Always fatal for the
    /// connection, never converted into a false acceptance.
    #[error("Handler failure: {0}")]
    Handler(String),
}

impl From<EncodingError> for WireError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::ShortInput { needed } => WireError::Incomplete { needed },
            EncodingError::Malformed(msg) => WireError::Malformed(msg),
            EncodingError::UnknownAlgorithm(tag) => WireError::UnknownAlgorithm(tag),
            EncodingError::UnknownTransactionType(_) => {
                WireError::Malformed("unknown transaction type")
            }
            EncodingError::AmountNotRepresentable => {
                WireError::Malformed("amount not representable")
            }
        }
    }
}

impl From<CryptoError> for WireError {
    fn from(err: CryptoError) -> Self {
        WireError::from(EncodingError::from(err))
    }
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;
