//! Test harness: collaborator bundles with injectable behaviour.

use crate::generators::origin_keypair;
use axon_crypto::{PublicKey, TaggedHash};
use axon_store::{
    ChainStore, IntervalSchedulers, MemoryChainStore, NetworkRegisters, NodeTable, PoolsMemTable,
    PubSub, RegisterState, SchedulerRegistry,
};
use axon_transaction::{Transaction, ValidationStamp};
use axon_validation::PendingValidator;
use axon_wire::{
    Clock, HandlerContext, MiningCoordinator, ReplicationPipeline, ReplicationRoles,
    ReplicationTree, WireResult,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Shared collaborator bundle for validator and dispatcher tests.
pub struct TestContext {
    pub store: Arc<MemoryChainStore>,
    pub nodes: Arc<NodeTable>,
    pub pools: Arc<PoolsMemTable>,
    pub schedulers: Arc<IntervalSchedulers>,
    pub registers: NetworkRegisters,
    pub pubsub: PubSub,
}

impl TestContext {
    /// Fresh context with the test origin key registered.
    pub fn new() -> Self {
        let mut state = RegisterState::new();
        let origin = origin_keypair();
        state
            .origin_keys
            .push((origin.public().clone(), axon_store::KeyOrigin::Software));
        state.root_certificate_key = Some(origin.public().clone());

        Self {
            store: Arc::new(MemoryChainStore::new()),
            nodes: Arc::new(NodeTable::new()),
            pools: Arc::new(PoolsMemTable::new()),
            schedulers: Arc::new(IntervalSchedulers::new()),
            registers: NetworkRegisters::new(state),
            pubsub: PubSub::new(),
        }
    }

    /// A validator over this context.
    pub fn validator(&self) -> PendingValidator {
        PendingValidator::new(
            self.store.clone() as Arc<dyn ChainStore>,
            self.nodes.clone(),
            self.pools.clone(),
            self.schedulers.clone() as Arc<dyn SchedulerRegistry>,
            self.registers.clone(),
        )
    }

    /// A dispatcher context over this context.
    ///
    /// `ack_on_submit` makes the mining double acknowledge storage
    /// immediately, so `NewTransaction` completes without a peer.
    pub fn dispatch(&self, now: DateTime<Utc>, ack_on_submit: bool) -> HandlerContext {
        let mining = Arc::new(RecordingMining {
            pubsub: self.pubsub.clone(),
            ack_on_submit,
            submitted: Mutex::new(Vec::new()),
        });
        let clock: Clock = Arc::new(move || now);
        HandlerContext {
            store: self.store.clone() as Arc<dyn ChainStore>,
            nodes: self.nodes.clone(),
            registers: self.registers.clone(),
            pubsub: self.pubsub.clone(),
            validator: Arc::new(self.validator()),
            mining,
            replication: Arc::new(NullReplication),
            storage_nonce: vec![0x90; 32],
            mining_timeout: Duration::from_millis(100),
            clock,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Mining double that records submissions.
pub struct RecordingMining {
    pubsub: PubSub,
    ack_on_submit: bool,
    pub submitted: Mutex<Vec<TaggedHash>>,
}

impl MiningCoordinator for RecordingMining {
    fn submit(&self, transaction: Transaction) -> WireResult<()> {
        self.submitted.lock().push(transaction.address.clone());
        if self.ack_on_submit {
            self.pubsub.notify_transaction_accepted(&transaction.address);
        }
        Ok(())
    }

    fn start_mining(
        &self,
        transaction: Transaction,
        _welcome_node_public_key: PublicKey,
        _validation_node_public_keys: Vec<PublicKey>,
    ) -> WireResult<()> {
        self.submitted.lock().push(transaction.address.clone());
        Ok(())
    }

    fn add_mining_context(
        &self,
        _address: TaggedHash,
        _validation_node_public_key: PublicKey,
        _previous_storage_node_public_keys: Vec<PublicKey>,
        _chain_storage_nodes_view: Vec<bool>,
        _beacon_storage_nodes_view: Vec<bool>,
        _io_storage_nodes_view: Vec<bool>,
    ) -> WireResult<()> {
        Ok(())
    }

    fn cross_validate(
        &self,
        _address: TaggedHash,
        _stamp: ValidationStamp,
        _replication_tree: ReplicationTree,
    ) -> WireResult<()> {
        Ok(())
    }

    fn cross_validation_done(
        &self,
        _address: TaggedHash,
        _stamp: ValidationStamp,
    ) -> WireResult<()> {
        Ok(())
    }
}

/// Replication double that accepts everything.
pub struct NullReplication;

impl ReplicationPipeline for NullReplication {
    fn replicate(
        &self,
        _transaction: Transaction,
        _roles: ReplicationRoles,
        _ack_storage: bool,
    ) -> WireResult<()> {
        Ok(())
    }

    fn notify_last_address(
        &self,
        _address: TaggedHash,
        _previous_address: TaggedHash,
        _timestamp: u32,
    ) -> WireResult<()> {
        Ok(())
    }
}
