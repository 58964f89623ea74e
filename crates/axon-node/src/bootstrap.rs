//! Bootstrap: seed the process-wide state and assemble the dispatcher
//! context.

use crate::config::NodeConfig;
use anyhow::Result;
use axon_crypto::{derive_address, derive_keypair, Curve, PublicKey, TaggedHash};
use axon_store::{
    ChainStore, IntervalSchedulers, KeyOrigin, MemoryChainStore, NetworkRegisters, NodeTable,
    PoolsMemTable, PubSub, RegisterState, SchedulerRegistry,
};
use axon_transaction::{Transaction, ValidationStamp};
use axon_validation::PendingValidator;
use axon_wire::{
    Clock, HandlerContext, MiningCoordinator, ReplicationPipeline, ReplicationRoles,
    ReplicationTree, WireResult,
};
use chrono::Utc;
use rand::RngCore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Genesis address of the chain seeded by `seed`.
fn chain_genesis_address(seed: &str) -> Result<TaggedHash> {
    let keypair = derive_keypair(seed.as_bytes(), 0, Curve::Ed25519)?;
    Ok(derive_address(keypair.public()))
}

/// Standalone mining loop-back: with no remote validators configured, a
/// submitted transaction is acknowledged immediately so local submissions
/// complete.
struct LoopbackMining {
    pubsub: PubSub,
}

impl MiningCoordinator for LoopbackMining {
    fn submit(&self, transaction: Transaction) -> WireResult<()> {
        info!(address = %transaction.address, tx_type = %transaction.tx_type, "Mining submission");
        self.pubsub.notify_transaction_accepted(&transaction.address);
        Ok(())
    }

    fn start_mining(
        &self,
        transaction: Transaction,
        welcome_node_public_key: PublicKey,
        validation_node_public_keys: Vec<PublicKey>,
    ) -> WireResult<()> {
        debug!(
            address = %transaction.address,
            welcome = %welcome_node_public_key,
            validators = validation_node_public_keys.len(),
            "Start mining"
        );
        Ok(())
    }

    fn add_mining_context(
        &self,
        address: TaggedHash,
        validation_node_public_key: PublicKey,
        _previous_storage_node_public_keys: Vec<PublicKey>,
        _chain_storage_nodes_view: Vec<bool>,
        _beacon_storage_nodes_view: Vec<bool>,
        _io_storage_nodes_view: Vec<bool>,
    ) -> WireResult<()> {
        debug!(%address, validator = %validation_node_public_key, "Mining context");
        Ok(())
    }

    fn cross_validate(
        &self,
        address: TaggedHash,
        _stamp: ValidationStamp,
        _replication_tree: ReplicationTree,
    ) -> WireResult<()> {
        debug!(%address, "Cross validation");
        Ok(())
    }

    fn cross_validation_done(&self, address: TaggedHash, _stamp: ValidationStamp) -> WireResult<()> {
        debug!(%address, "Cross validation done");
        Ok(())
    }
}

/// Standalone replication loop-back.
struct LoopbackReplication;

impl ReplicationPipeline for LoopbackReplication {
    fn replicate(
        &self,
        transaction: Transaction,
        roles: ReplicationRoles,
        ack_storage: bool,
    ) -> WireResult<()> {
        debug!(address = %transaction.address, ?roles, ack_storage, "Replication");
        Ok(())
    }

    fn notify_last_address(
        &self,
        address: TaggedHash,
        previous_address: TaggedHash,
        timestamp: u32,
    ) -> WireResult<()> {
        debug!(%address, %previous_address, timestamp, "Last address notification");
        Ok(())
    }
}

/// Seed the registers and assemble the collaborator bundle.
pub fn build_context(config: &NodeConfig) -> Result<HandlerContext> {
    let store = Arc::new(MemoryChainStore::new());
    let nodes = Arc::new(NodeTable::new());
    let pools = Arc::new(PoolsMemTable::new());
    let schedulers: Arc<dyn SchedulerRegistry> = Arc::new(IntervalSchedulers::new());
    let pubsub = PubSub::new();

    let mut state = RegisterState::new();
    state.content_max_size = config.admission.content_max_size;
    state.allowed_node_key_origins = config
        .admission
        .allowed_node_key_origins
        .iter()
        .copied()
        .collect::<HashSet<KeyOrigin>>();
    state.node_shared_secrets_genesis_address =
        Some(chain_genesis_address(&config.bootstrap.node_shared_secrets_seed)?);
    state.reward_genesis_address = Some(chain_genesis_address(&config.bootstrap.reward_seed)?);

    for origin_seed in &config.bootstrap.origin_seeds {
        state
            .origin_genesis_addresses
            .push(chain_genesis_address(origin_seed)?);
        let origin_keypair = derive_keypair(origin_seed.as_bytes(), 0, Curve::Ed25519)?;
        state
            .origin_keys
            .push((origin_keypair.public().clone(), KeyOrigin::Software));
    }
    state.root_certificate_key = state.origin_keys.first().map(|(key, _)| key.clone());

    let registers = NetworkRegisters::new(state);
    info!(
        origins = config.bootstrap.origin_seeds.len(),
        content_max_size = config.admission.content_max_size,
        "Registers seeded"
    );

    let validator = Arc::new(PendingValidator::new(
        store.clone() as Arc<dyn ChainStore>,
        nodes.clone(),
        pools.clone(),
        schedulers,
        registers.clone(),
    ));

    let mut storage_nonce = vec![0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut storage_nonce);

    let clock: Clock = Arc::new(Utc::now);

    Ok(HandlerContext {
        store,
        nodes,
        registers,
        pubsub: pubsub.clone(),
        validator,
        mining: Arc::new(LoopbackMining { pubsub }),
        replication: Arc::new(LoopbackReplication),
        storage_nonce,
        mining_timeout: Duration::from_secs(config.admission.mining_timeout_secs),
        clock,
    })
}
