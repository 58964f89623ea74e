//! Election pools mem-table.

use axon_crypto::PublicKey;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Named membership pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Keys allowed to approve code proposals.
    TechnicalCouncil,
}

/// In-memory pool membership, seeded during bootstrap.
#[derive(Default)]
pub struct PoolsMemTable {
    members: RwLock<HashMap<Pool, HashSet<Vec<u8>>>>,
}

impl PoolsMemTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key` to `pool`.
    pub fn add_member(&self, pool: Pool, key: &PublicKey) {
        self.members
            .write()
            .entry(pool)
            .or_default()
            .insert(key.to_vec());
    }

    /// Whether `key` belongs to `pool`.
    pub fn is_member(&self, pool: Pool, key: &PublicKey) -> bool {
        self.members
            .read()
            .get(&pool)
            .is_some_and(|members| members.contains(&key.to_vec()))
    }

    /// The member keys of `pool`, as tagged key bytes.
    pub fn members(&self, pool: Pool) -> HashSet<Vec<u8>> {
        self.members.read().get(&pool).cloned().unwrap_or_default()
    }
}
