//! Store error types.

use thiserror::Error;

/// Errors raised by the membership table and registers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No node registered under the given public key.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A patch string that is not 3 hexadecimal characters.
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
