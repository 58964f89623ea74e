//! # axon-validation
//!
//! Pending-transaction admission for the Axon network.
//!
//! Every transaction, whether it arrives over the wire or through a local
//! submission path, passes through [`PendingValidator::validate`] before it
//! is handed to mining. The validator is stateless apart from read-only
//! lookups into the chain store, the membership table, the election pools,
//! the scheduler registry and the network registers; it never mutates
//! persistent state, so concurrent validations of distinct transactions
//! are safe.

mod error;
mod token;
mod validator;

pub use error::{AdmissionError, AdmissionResult};
pub use token::{TokenDefinition, TokenKind};
pub use validator::{NodeDeclaration, PendingValidator};
