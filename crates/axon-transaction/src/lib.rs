//! # axon-transaction
//!
//! Transaction model for the Axon network.
//!
//! This crate provides:
//! - The typed transaction record and its nested data block
//! - Canonical, byte-stable serialisation (used for signing and on the wire)
//! - Chain address derivation from the previous public key
//! - The auxiliary wire records shared with the P2P layer
//!   (validation stamps, summaries, inputs, unspent outputs)
//!
//! Two logically equal transactions serialise to byte-equal output; the
//! field order is consensus-relevant and changing it is a breaking network
//! change.

mod encoding;
mod error;
mod records;
mod transaction;
mod types;

pub use encoding::{
    amount_from_wire, amount_to_wire, read_bytes_u32, read_bytes_u8, read_f64, read_u16, read_u32,
    read_u64, read_u8, take, write_bytes_u32, write_bytes_u8, write_f64, write_u16, write_u32,
    write_u64, MAX_WIRE_AMOUNT,
};
pub use error::{EncodingError, EncodingResult};
pub use records::{
    AssetClass, TransactionInput, TransactionSummary, UnspentOutput, ValidationStamp,
};
pub use transaction::{Ledger, Ownership, TokenTransfer, Transaction, TransactionData, UcoTransfer};
pub use types::TransactionType;

/// Default cap on `data.content`, in bytes (3.5 MiB).
pub const DEFAULT_CONTENT_MAX_SIZE: usize = 3_670_016;

/// Number of sub-units per whole coin (10⁻⁸ precision).
pub const SUB_UNITS: u64 = 100_000_000;
