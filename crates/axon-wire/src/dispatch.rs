//! Request dispatcher.
//!
//! Maps every decoded request to its fixed response kind, against the
//! external collaborators. Pure over the request apart from the declared
//! side effects: pub-sub publication, mining submission and the node
//! availability transitions. Time is injected; nothing here reads the
//! wall clock directly.

use crate::frame::{ErrorReason, ReplicationRoles, ReplicationTree, Request, Response};
use crate::{WireError, WireResult};
use axon_crypto::{encrypt_storage_nonce, PublicKey, TaggedHash};
use axon_store::{ChainStore, NetworkRegisters, NodeTable, PubSub};
use axon_transaction::{Transaction, ValidationStamp};
use axon_validation::PendingValidator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Injected time source.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Maximum nodes returned to a bootstrapping peer.
const MAX_BOOTSTRAPPING_NODES: usize = 10;

/// Handle into the mining coordination pipeline. Submissions are
/// fire-and-forget; failures are programming errors and surface as
/// connection-level failures, never as false acceptance.
pub trait MiningCoordinator: Send + Sync {
    /// Hand a freshly admitted transaction to the coordinator.
    fn submit(&self, transaction: Transaction) -> WireResult<()>;

    /// Start mining with an explicit validation election.
    fn start_mining(
        &self,
        transaction: Transaction,
        welcome_node_public_key: PublicKey,
        validation_node_public_keys: Vec<PublicKey>,
    ) -> WireResult<()>;

    /// Deliver the mining context to a cross-validation worker.
    fn add_mining_context(
        &self,
        address: TaggedHash,
        validation_node_public_key: PublicKey,
        previous_storage_node_public_keys: Vec<PublicKey>,
        chain_storage_nodes_view: Vec<bool>,
        beacon_storage_nodes_view: Vec<bool>,
        io_storage_nodes_view: Vec<bool>,
    ) -> WireResult<()>;

    /// Cross-validate a stamp.
    fn cross_validate(
        &self,
        address: TaggedHash,
        stamp: ValidationStamp,
        replication_tree: ReplicationTree,
    ) -> WireResult<()>;

    /// A cross-validation stamp came back.
    fn cross_validation_done(&self, address: TaggedHash, stamp: ValidationStamp) -> WireResult<()>;
}

/// Handle into the replication pipeline.
pub trait ReplicationPipeline: Send + Sync {
    /// Store a validated transaction under the given roles.
    fn replicate(
        &self,
        transaction: Transaction,
        roles: ReplicationRoles,
        ack_storage: bool,
    ) -> WireResult<()>;

    /// A chain got a newer tip elsewhere.
    fn notify_last_address(
        &self,
        address: TaggedHash,
        previous_address: TaggedHash,
        timestamp: u32,
    ) -> WireResult<()>;
}

/// Collaborator bundle the dispatcher runs against.
#[derive(Clone)]
pub struct HandlerContext {
    pub store: Arc<dyn ChainStore>,
    pub nodes: Arc<NodeTable>,
    pub registers: NetworkRegisters,
    pub pubsub: PubSub,
    pub validator: Arc<PendingValidator>,
    pub mining: Arc<dyn MiningCoordinator>,
    pub replication: Arc<dyn ReplicationPipeline>,
    /// Storage nonce handed to authorized nodes, ECIES-encrypted.
    pub storage_nonce: Vec<u8>,
    /// Upper bound on the mining acknowledgement wait.
    pub mining_timeout: Duration,
    pub clock: Clock,
}

/// Process one request into its response.
pub async fn process(request: Request, ctx: &HandlerContext) -> WireResult<Response> {
    match request {
        Request::GetBootstrappingNodes { patch } => {
            let mut nodes = ctx.nodes.nearest_nodes(&patch);
            nodes.truncate(MAX_BOOTSTRAPPING_NODES);
            Ok(Response::BootstrappingNodes { nodes })
        }
        Request::GetStorageNonce { public_key } => {
            let digest = encrypt_storage_nonce(&public_key, &ctx.storage_nonce)
                .map_err(|err| WireError::Handler(err.to_string()))?;
            Ok(Response::EncryptedStorageNonce { digest })
        }
        Request::ListNodes => Ok(Response::NodeList {
            nodes: ctx.nodes.list_nodes(),
        }),
        Request::GetTransaction { address } => Ok(match ctx.store.get_transaction(&address) {
            Some(transaction) => Response::Transaction { transaction },
            None => Response::NotFound,
        }),
        Request::GetTransactionChain { address, after } => Ok(Response::TransactionList {
            transactions: ctx.store.get_transaction_chain(&address, after),
        }),
        Request::GetUnspentOutputs { address } => Ok(Response::UnspentOutputList {
            outputs: ctx.store.get_unspent_outputs(&address),
        }),
        Request::NewTransaction { transaction } => new_transaction(transaction, ctx).await,
        Request::StartMining {
            transaction,
            welcome_node_public_key,
            validation_node_public_keys,
        } => {
            ctx.mining.start_mining(
                transaction,
                welcome_node_public_key,
                validation_node_public_keys,
            )?;
            Ok(Response::Ok)
        }
        Request::AddMiningContext {
            address,
            validation_node_public_key,
            previous_storage_node_public_keys,
            chain_storage_nodes_view,
            beacon_storage_nodes_view,
            io_storage_nodes_view,
        } => {
            ctx.mining.add_mining_context(
                address,
                validation_node_public_key,
                previous_storage_node_public_keys,
                chain_storage_nodes_view,
                beacon_storage_nodes_view,
                io_storage_nodes_view,
            )?;
            Ok(Response::Ok)
        }
        Request::CrossValidate {
            address,
            stamp,
            replication_tree,
        } => {
            ctx.mining.cross_validate(address, stamp, replication_tree)?;
            Ok(Response::Ok)
        }
        Request::CrossValidationDone { address, stamp } => {
            ctx.mining.cross_validation_done(address, stamp)?;
            Ok(Response::Ok)
        }
        Request::ReplicateTransaction {
            transaction,
            roles,
            ack_storage,
        } => {
            ctx.replication.replicate(transaction, roles, ack_storage)?;
            Ok(Response::Ok)
        }
        Request::AcknowledgeStorage { address } => {
            ctx.pubsub.notify_transaction_accepted(&address);
            Ok(Response::Ok)
        }
        Request::NotifyEndOfNodeSync {
            node_public_key,
            timestamp: _,
        } => {
            if let Err(err) = ctx.nodes.set_globally_available(&node_public_key) {
                warn!(%err, "End-of-sync for unknown node");
            }
            Ok(Response::Ok)
        }
        Request::GetLastTransaction { address } => {
            let transaction = ctx
                .store
                .get_last_chain_address(&address)
                .and_then(|tip| ctx.store.get_transaction(&tip.address));
            Ok(match transaction {
                Some(transaction) => Response::Transaction { transaction },
                None => Response::NotFound,
            })
        }
        Request::GetBalance { address } => {
            let balance = ctx.store.get_balance(&address);
            Ok(Response::Balance {
                uco: balance.uco,
                tokens: balance.tokens,
            })
        }
        Request::GetTransactionInputs { address } => Ok(Response::TransactionInputList {
            inputs: ctx.store.get_transaction_inputs(&address),
        }),
        Request::GetTransactionChainLength { address } => Ok(Response::TransactionChainLength {
            length: ctx.store.get_transaction_chain_length(&address),
        }),
        Request::GetP2PView { node_public_keys } => Ok(Response::P2PView {
            availabilities: ctx.nodes.availability_bits(&node_public_keys),
        }),
        Request::GetFirstPublicKey { address } => {
            Ok(match ctx.store.get_first_public_key(&address) {
                Some(public_key) => Response::FirstPublicKey { public_key },
                None => Response::NotFound,
            })
        }
        Request::GetLastTransactionAddress { address, timestamp } => {
            let before = DateTime::from_timestamp(i64::from(timestamp), 0).unwrap_or_default();
            let last = ctx
                .store
                .get_last_chain_address_before(&address, before)
                .unwrap_or(address);
            Ok(Response::LastTransactionAddress { address: last })
        }
        Request::NotifyLastTransactionAddress {
            address,
            previous_address,
            timestamp,
        } => {
            ctx.replication
                .notify_last_address(address, previous_address, timestamp)?;
            Ok(Response::Ok)
        }
        Request::GetTransactionSummary { address } => {
            Ok(match ctx.store.get_transaction_summary(&address) {
                Some(summary) => Response::TransactionSummary { summary },
                None => Response::NotFound,
            })
        }
        Request::NodeAvailability { public_key } => {
            if let Err(err) = ctx.nodes.set_globally_available(&public_key) {
                warn!(%err, "Availability for unknown node");
            }
            Ok(Response::Ok)
        }
        Request::Ping => Ok(Response::Ok),
    }
}

/// Admission + mining hand-off for a submitted transaction.
///
/// The acceptance subscription is registered before the submission so the
/// acknowledgement cannot race past us; it is scoped, so every exit path
/// (including cancellation of this task) deregisters it.
async fn new_transaction(transaction: Transaction, ctx: &HandlerContext) -> WireResult<Response> {
    let now = (ctx.clock)();
    if let Err(reason) = ctx.validator.validate(&transaction, now) {
        debug!(address = %transaction.address, %reason, "Rejected pending transaction");
        return Ok(Response::Error {
            reason: ErrorReason::InvalidTransaction,
        });
    }

    let mut subscription = ctx.pubsub.subscribe_transaction_accepted(&transaction.address);
    let address = transaction.address.clone();
    ctx.mining.submit(transaction)?;

    match tokio::time::timeout(ctx.mining_timeout, subscription.wait()).await {
        Ok(true) => Ok(Response::Ok),
        _ => {
            warn!(%address, "No storage acknowledgement before timeout");
            Ok(Response::Error {
                reason: ErrorReason::NetworkIssue,
            })
        }
    }
}
