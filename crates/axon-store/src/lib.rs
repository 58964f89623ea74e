//! # axon-store
//!
//! Chain store and process-wide state for the Axon network.
//!
//! This crate provides:
//! - The `ChainStore` read surface consumed by the dispatcher and the
//!   pending-transaction validator, with an in-memory implementation
//! - The node membership table (availability/authorisation transitions)
//! - The election pools mem-table
//! - The scheduler registry (last-trigger lookups)
//! - The process-wide network registers (genesis addresses, origin keys,
//!   admission configuration)
//! - The transaction-accepted pub-sub hub
//!
//! Everything here is initialised during bootstrap and read under a
//! read-mostly discipline afterwards: a single writer, many readers, and
//! no reader ever observes a partially updated set.

mod chain;
mod error;
mod membership;
mod pools;
mod pubsub;
mod registers;
mod schedulers;

pub use chain::{Balance, ChainStore, ChainTip, MemoryChainStore};
pub use error::{StoreError, StoreResult};
pub use membership::{Node, NodeTable, Transport};
pub use pools::{Pool, PoolsMemTable};
pub use pubsub::{AcceptanceSubscription, PubSub};
pub use registers::{KeyOrigin, NetworkRegisters, RegisterState};
pub use schedulers::{IntervalSchedulers, ScheduledKind, SchedulerRegistry};
