//! P2P protocol frames.
//!
//! Every frame is a 1-byte tag followed by its payload. Tags 0–24 are
//! requests, 239–254 are responses; everything else is reserved and fails
//! decoding.

use crate::WireError;
use axon_crypto::{PublicKey, TaggedHash};
use axon_store::Node;
use axon_transaction::{
    Transaction, TransactionInput, TransactionSummary, UnspentOutput, ValidationStamp,
};

/// Replication duties requested from a storage node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplicationRoles {
    /// Store the full chain.
    pub chain: bool,
    /// Store the I/O movements.
    pub io: bool,
    /// Store the beacon summary.
    pub beacon: bool,
}

/// Three equally-shaped bit matrices describing the replication fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplicationTree {
    /// Chain storage assignment, row-major.
    pub chain: Vec<Vec<bool>>,
    /// Beacon storage assignment, row-major.
    pub beacon: Vec<Vec<bool>>,
    /// I/O storage assignment, row-major.
    pub io: Vec<Vec<bool>>,
}

impl ReplicationTree {
    /// Shape of the matrices as `(rows, width)`.
    ///
    /// Fails when the three matrices do not share one rectangular shape.
    pub fn shape(&self) -> Result<(u8, u8), WireError> {
        let rows = self.chain.len();
        if self.beacon.len() != rows || self.io.len() != rows || rows > u8::MAX as usize {
            return Err(WireError::Malformed("replication tree shape mismatch"));
        }
        let width = self.chain.first().map(|row| row.len()).unwrap_or(0);
        if width > u8::MAX as usize {
            return Err(WireError::Malformed("replication tree shape mismatch"));
        }
        for matrix in [&self.chain, &self.beacon, &self.io] {
            if matrix.iter().any(|row| row.len() != width) {
                return Err(WireError::Malformed("replication tree shape mismatch"));
            }
        }
        Ok((rows as u8, width as u8))
    }
}

/// Reasons carried by an [`Response::Error`] frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorReason {
    /// The transaction failed admission.
    InvalidTransaction = 0,
    /// A network-side failure (timeout, coordination loss).
    NetworkIssue = 1,
}

impl TryFrom<u8> for ErrorReason {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, WireError> {
        match value {
            0 => Ok(ErrorReason::InvalidTransaction),
            1 => Ok(ErrorReason::NetworkIssue),
            _ => Err(WireError::Malformed("unknown error reason")),
        }
    }
}

/// Request frames (tags 0–24).
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Closest bootstrapping nodes for a locality patch.
    GetBootstrappingNodes { patch: String },
    /// The storage nonce, encrypted for the requesting node.
    GetStorageNonce { public_key: PublicKey },
    /// All registered nodes.
    ListNodes,
    /// A transaction by address.
    GetTransaction { address: TaggedHash },
    /// A transaction chain, optionally only entries after a timestamp.
    GetTransactionChain {
        address: TaggedHash,
        after: Option<u32>,
    },
    /// Unspent outputs of a chain.
    GetUnspentOutputs { address: TaggedHash },
    /// Submission of a pending transaction.
    NewTransaction { transaction: Transaction },
    /// Order a coordinator to start mining a transaction.
    StartMining {
        transaction: Transaction,
        welcome_node_public_key: PublicKey,
        validation_node_public_keys: Vec<PublicKey>,
    },
    /// Deliver the mining context to a cross-validation node.
    AddMiningContext {
        address: TaggedHash,
        validation_node_public_key: PublicKey,
        previous_storage_node_public_keys: Vec<PublicKey>,
        chain_storage_nodes_view: Vec<bool>,
        beacon_storage_nodes_view: Vec<bool>,
        io_storage_nodes_view: Vec<bool>,
    },
    /// Ask for cross-validation of a stamp.
    CrossValidate {
        address: TaggedHash,
        stamp: ValidationStamp,
        replication_tree: ReplicationTree,
    },
    /// A cross-validation stamp came back.
    CrossValidationDone {
        address: TaggedHash,
        stamp: ValidationStamp,
    },
    /// Order replication of a validated transaction.
    ReplicateTransaction {
        transaction: Transaction,
        roles: ReplicationRoles,
        ack_storage: bool,
    },
    /// A replica acknowledges storage of an address.
    AcknowledgeStorage { address: TaggedHash },
    /// A node finished its bootstrap synchronisation.
    NotifyEndOfNodeSync {
        node_public_key: PublicKey,
        timestamp: u32,
    },
    /// Last transaction of a chain.
    GetLastTransaction { address: TaggedHash },
    /// Funds of a chain.
    GetBalance { address: TaggedHash },
    /// Funding inputs of a chain.
    GetTransactionInputs { address: TaggedHash },
    /// Length of a chain.
    GetTransactionChainLength { address: TaggedHash },
    /// Availability view over the given nodes.
    GetP2PView { node_public_keys: Vec<PublicKey> },
    /// First public key of a chain.
    GetFirstPublicKey { address: TaggedHash },
    /// Last chain address as of a timestamp.
    GetLastTransactionAddress {
        address: TaggedHash,
        timestamp: u32,
    },
    /// Tell storage nodes about a newer chain tip.
    NotifyLastTransactionAddress {
        address: TaggedHash,
        previous_address: TaggedHash,
        timestamp: u32,
    },
    /// Condensed view of a transaction.
    GetTransactionSummary { address: TaggedHash },
    /// A node declares itself reachable.
    NodeAvailability { public_key: PublicKey },
    /// Liveness probe.
    Ping,
}

/// Response frames (tags 239–254).
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Typed failure.
    Error { reason: ErrorReason },
    /// A full transaction.
    Transaction { transaction: Transaction },
    /// An ordered list of transactions.
    TransactionList { transactions: Vec<Transaction> },
    /// Nothing stored under the requested address.
    NotFound,
    /// Acknowledgement.
    Ok,
    /// Funds of a chain.
    Balance {
        uco: u64,
        tokens: Vec<(TaggedHash, u64)>,
    },
    /// Unspent outputs of a chain.
    UnspentOutputList { outputs: Vec<UnspentOutput> },
    /// Closest bootstrapping nodes.
    BootstrappingNodes { nodes: Vec<Node> },
    /// The storage nonce, ECIES-encrypted for the requester.
    EncryptedStorageNonce { digest: Vec<u8> },
    /// Tip address of a chain.
    LastTransactionAddress { address: TaggedHash },
    /// First public key of a chain.
    FirstPublicKey { public_key: PublicKey },
    /// Condensed view of a transaction.
    TransactionSummary { summary: TransactionSummary },
    /// Availability bits over the requested nodes.
    P2PView { availabilities: Vec<bool> },
    /// Funding inputs of a chain.
    TransactionInputList { inputs: Vec<TransactionInput> },
    /// All registered nodes.
    NodeList { nodes: Vec<Node> },
    /// Length of a chain.
    TransactionChainLength { length: u32 },
}

/// A decoded frame: request or response, discriminated by the tag range.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Tags 0–24.
    Request(Request),
    /// Tags 239–254.
    Response(Response),
}
