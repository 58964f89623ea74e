//! Process-wide network registers.
//!
//! One snapshot object holds everything admission needs from bootstrap:
//! genesis addresses, the origin key set, and the admission configuration.
//! Readers take an `Arc` snapshot; the single writer swaps the whole
//! snapshot, so a reader never observes a partially updated set.

use axon_crypto::{PublicKey, TaggedHash};
use axon_transaction::DEFAULT_CONTENT_MAX_SIZE;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Provenance of a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrigin {
    /// Derived in software.
    Software,
    /// Generated inside a TPM.
    Tpm,
    /// Generated on a USB token.
    Usb,
}

/// The register values, swapped as one unit.
#[derive(Debug, Clone, Default)]
pub struct RegisterState {
    /// Genesis address of the node-shared-secrets chain.
    pub node_shared_secrets_genesis_address: Option<TaggedHash>,
    /// Genesis addresses of the origin chains (one per device family).
    pub origin_genesis_addresses: Vec<TaggedHash>,
    /// Genesis address of the rewards chain.
    pub reward_genesis_address: Option<TaggedHash>,
    /// Registered origin keys with their provenance.
    pub origin_keys: Vec<(PublicKey, KeyOrigin)>,
    /// Root key certifying origin registrations.
    pub root_certificate_key: Option<PublicKey>,
    /// When non-empty, only these key origins may submit transactions.
    pub allowed_node_key_origins: HashSet<KeyOrigin>,
    /// Cap on `data.content`, in bytes.
    pub content_max_size: usize,
}

impl RegisterState {
    /// Default state with the standard content cap.
    pub fn new() -> Self {
        Self {
            content_max_size: DEFAULT_CONTENT_MAX_SIZE,
            ..Self::default()
        }
    }

    /// The registered origin public keys.
    pub fn origin_public_keys(&self) -> Vec<PublicKey> {
        self.origin_keys.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Provenance of `key`; unregistered keys resolve to software.
    pub fn key_origin(&self, key: &PublicKey) -> KeyOrigin {
        self.origin_keys
            .iter()
            .find(|(registered, _)| registered == key)
            .map(|(_, origin)| *origin)
            .unwrap_or(KeyOrigin::Software)
    }
}

/// Shared handle over the register snapshot.
#[derive(Clone, Default)]
pub struct NetworkRegisters {
    inner: Arc<RwLock<Arc<RegisterState>>>,
}

impl NetworkRegisters {
    /// Create registers from an initial state.
    pub fn new(state: RegisterState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(state))),
        }
    }

    /// Take an atomic snapshot of the current state.
    pub fn snapshot(&self) -> Arc<RegisterState> {
        self.inner.read().clone()
    }

    /// Apply a mutation and publish the new snapshot atomically.
    pub fn update(&self, f: impl FnOnce(&mut RegisterState)) {
        let mut guard = self.inner.write();
        let mut state = (**guard).clone();
        f(&mut state);
        *guard = Arc::new(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_crypto::{derive_keypair, Curve};

    #[test]
    fn test_snapshot_is_atomic() {
        let registers = NetworkRegisters::new(RegisterState::new());
        let before = registers.snapshot();

        registers.update(|state| {
            state.content_max_size = 1024;
            state.allowed_node_key_origins.insert(KeyOrigin::Tpm);
        });

        // The old snapshot is untouched; the new one carries both changes.
        assert_eq!(before.content_max_size, DEFAULT_CONTENT_MAX_SIZE);
        let after = registers.snapshot();
        assert_eq!(after.content_max_size, 1024);
        assert!(after.allowed_node_key_origins.contains(&KeyOrigin::Tpm));
    }

    #[test]
    fn test_key_origin_defaults_to_software() {
        let tpm_key = derive_keypair(b"tpm", 0, Curve::Ed25519).unwrap();
        let other = derive_keypair(b"other", 0, Curve::Ed25519).unwrap();

        let mut state = RegisterState::new();
        state.origin_keys.push((tpm_key.public().clone(), KeyOrigin::Tpm));

        assert_eq!(state.key_origin(tpm_key.public()), KeyOrigin::Tpm);
        assert_eq!(state.key_origin(other.public()), KeyOrigin::Software);
        assert_eq!(state.origin_public_keys().len(), 1);
    }
}
