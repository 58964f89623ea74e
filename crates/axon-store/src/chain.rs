//! Chain store read surface.

use axon_crypto::{PublicKey, TaggedHash};
use axon_transaction::{Transaction, TransactionInput, TransactionSummary, UnspentOutput};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// The last transaction of a chain, with its validation timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    /// Address of the last transaction.
    pub address: TaggedHash,
    /// When it was validated.
    pub timestamp: DateTime<Utc>,
}

/// Funds attached to a chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Balance {
    /// Native coin balance in sub-units.
    pub uco: u64,
    /// Token balances: creation address → sub-units.
    pub tokens: Vec<(TaggedHash, u64)>,
}

/// Read surface over the replicated chains.
///
/// The storage engine itself lives elsewhere; the dispatcher and the
/// pending-transaction validator only consume these lookups. Tests inject
/// doubles through this trait.
pub trait ChainStore: Send + Sync {
    /// The tip of the chain containing `address`.
    fn get_last_chain_address(&self, address: &TaggedHash) -> Option<ChainTip>;

    /// The last address of the chain containing `address` validated strictly
    /// before `before`.
    fn get_last_chain_address_before(
        &self,
        address: &TaggedHash,
        before: DateTime<Utc>,
    ) -> Option<TaggedHash>;

    /// The transaction stored at `address`.
    fn get_transaction(&self, address: &TaggedHash) -> Option<Transaction>;

    /// The first transaction of the chain containing `address`.
    fn get_first_transaction(&self, address: &TaggedHash) -> Option<Transaction>;

    /// Whether a transaction exists at `address`.
    fn transaction_exists(&self, address: &TaggedHash) -> bool;

    /// Fees burned since the last reward summary, in sub-units.
    fn get_latest_burned_fees(&self) -> u64;

    /// First public keys that already approved the code proposal at `address`.
    fn get_code_proposal_approvals(&self, address: &TaggedHash) -> Vec<PublicKey>;

    /// The transactions of the chain containing `address`, oldest first,
    /// optionally restricted to those validated after the Unix timestamp.
    fn get_transaction_chain(&self, address: &TaggedHash, after: Option<u32>) -> Vec<Transaction>;

    /// Number of transactions in the chain containing `address`.
    fn get_transaction_chain_length(&self, address: &TaggedHash) -> u32;

    /// The funds attached to the chain containing `address`.
    fn get_balance(&self, address: &TaggedHash) -> Balance;

    /// Unspent outputs of the chain containing `address`.
    fn get_unspent_outputs(&self, address: &TaggedHash) -> Vec<UnspentOutput>;

    /// Funding inputs of the chain containing `address`.
    fn get_transaction_inputs(&self, address: &TaggedHash) -> Vec<TransactionInput>;

    /// Condensed view of the transaction at `address`.
    fn get_transaction_summary(&self, address: &TaggedHash) -> Option<TransactionSummary>;

    /// First public key of the chain containing `address`.
    fn get_first_public_key(&self, address: &TaggedHash) -> Option<PublicKey> {
        self.get_first_transaction(address)
            .map(|tx| tx.previous_public_key)
    }
}

#[derive(Default)]
struct Inner {
    /// address bytes → stored transaction.
    transactions: HashMap<Vec<u8>, Transaction>,
    /// address bytes → validation timestamp.
    timestamps: HashMap<Vec<u8>, DateTime<Utc>>,
    /// any member address (or the genesis previous address) → chain index.
    chain_index: HashMap<Vec<u8>, usize>,
    /// chain index → ordered member addresses.
    chains: Vec<Vec<TaggedHash>>,
    /// chain index → balance.
    balances: HashMap<usize, Balance>,
    /// chain index → unspent outputs.
    unspent_outputs: HashMap<usize, Vec<UnspentOutput>>,
    /// chain index → inputs.
    inputs: HashMap<usize, Vec<TransactionInput>>,
    /// proposal address bytes → approver first public keys.
    approvals: HashMap<Vec<u8>, Vec<PublicKey>>,
    burned_fees: u64,
}

/// In-memory [`ChainStore`], used by the bootstrap path and the tests.
#[derive(Default)]
pub struct MemoryChainStore {
    inner: RwLock<Inner>,
}

impl MemoryChainStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validated transaction, appending it to the chain its
    /// previous address belongs to (or starting a new chain).
    pub fn insert_transaction(&self, tx: Transaction, timestamp: DateTime<Utc>) {
        let mut inner = self.inner.write();
        let address_bytes = tx.address.to_vec();
        let previous_bytes = tx.previous_address().to_vec();

        let chain = match inner.chain_index.get(&previous_bytes).copied() {
            Some(chain) => chain,
            None => {
                let chain = inner.chains.len();
                inner.chains.push(Vec::new());
                inner.chain_index.insert(previous_bytes, chain);
                chain
            }
        };
        inner.chains[chain].push(tx.address.clone());
        inner.chain_index.insert(address_bytes.clone(), chain);
        inner.timestamps.insert(address_bytes.clone(), timestamp);
        inner.transactions.insert(address_bytes, tx);
    }

    /// Set the burned-fees counter.
    pub fn set_latest_burned_fees(&self, fees: u64) {
        self.inner.write().burned_fees = fees;
    }

    /// Record an approval for the code proposal at `address`.
    pub fn add_code_proposal_approval(&self, address: &TaggedHash, approver: PublicKey) {
        self.inner
            .write()
            .approvals
            .entry(address.to_vec())
            .or_default()
            .push(approver);
    }

    /// Attach a balance to the chain containing `address`.
    pub fn set_balance(&self, address: &TaggedHash, balance: Balance) {
        let mut inner = self.inner.write();
        let chain = inner.chain_index.get(&address.to_vec()).copied();
        if let Some(chain) = chain {
            inner.balances.insert(chain, balance);
        }
    }

    /// Attach unspent outputs to the chain containing `address`.
    pub fn set_unspent_outputs(&self, address: &TaggedHash, outputs: Vec<UnspentOutput>) {
        let mut inner = self.inner.write();
        let chain = inner.chain_index.get(&address.to_vec()).copied();
        if let Some(chain) = chain {
            inner.unspent_outputs.insert(chain, outputs);
        }
    }

    /// Attach funding inputs to the chain containing `address`.
    pub fn set_transaction_inputs(&self, address: &TaggedHash, inputs: Vec<TransactionInput>) {
        let mut inner = self.inner.write();
        let chain = inner.chain_index.get(&address.to_vec()).copied();
        if let Some(chain) = chain {
            inner.inputs.insert(chain, inputs);
        }
    }
}

impl Inner {
    fn chain_of(&self, address: &TaggedHash) -> Option<usize> {
        self.chain_index.get(&address.to_vec()).copied()
    }

    fn chain_members(&self, address: &TaggedHash) -> Option<&[TaggedHash]> {
        self.chain_of(address).map(|chain| &self.chains[chain][..])
    }
}

impl ChainStore for MemoryChainStore {
    fn get_last_chain_address(&self, address: &TaggedHash) -> Option<ChainTip> {
        let inner = self.inner.read();
        let last = inner.chain_members(address)?.last()?.clone();
        let timestamp = *inner.timestamps.get(&last.to_vec())?;
        Some(ChainTip {
            address: last,
            timestamp,
        })
    }

    fn get_last_chain_address_before(
        &self,
        address: &TaggedHash,
        before: DateTime<Utc>,
    ) -> Option<TaggedHash> {
        let inner = self.inner.read();
        inner
            .chain_members(address)?
            .iter()
            .rev()
            .find(|member| {
                inner
                    .timestamps
                    .get(&member.to_vec())
                    .is_some_and(|ts| *ts < before)
            })
            .cloned()
    }

    fn get_transaction(&self, address: &TaggedHash) -> Option<Transaction> {
        self.inner.read().transactions.get(&address.to_vec()).cloned()
    }

    fn get_first_transaction(&self, address: &TaggedHash) -> Option<Transaction> {
        let inner = self.inner.read();
        let first = inner.chain_members(address)?.first()?;
        inner.transactions.get(&first.to_vec()).cloned()
    }

    fn transaction_exists(&self, address: &TaggedHash) -> bool {
        self.inner.read().transactions.contains_key(&address.to_vec())
    }

    fn get_latest_burned_fees(&self) -> u64 {
        self.inner.read().burned_fees
    }

    fn get_code_proposal_approvals(&self, address: &TaggedHash) -> Vec<PublicKey> {
        self.inner
            .read()
            .approvals
            .get(&address.to_vec())
            .cloned()
            .unwrap_or_default()
    }

    fn get_transaction_chain(&self, address: &TaggedHash, after: Option<u32>) -> Vec<Transaction> {
        let inner = self.inner.read();
        let Some(members) = inner.chain_members(address) else {
            return Vec::new();
        };
        members
            .iter()
            .filter(|member| match after {
                None => true,
                Some(after) => inner
                    .timestamps
                    .get(&member.to_vec())
                    .is_some_and(|ts| ts.timestamp() > i64::from(after)),
            })
            .filter_map(|member| inner.transactions.get(&member.to_vec()).cloned())
            .collect()
    }

    fn get_transaction_chain_length(&self, address: &TaggedHash) -> u32 {
        self.inner
            .read()
            .chain_members(address)
            .map(|members| members.len() as u32)
            .unwrap_or(0)
    }

    fn get_balance(&self, address: &TaggedHash) -> Balance {
        let inner = self.inner.read();
        inner
            .chain_of(address)
            .and_then(|chain| inner.balances.get(&chain).cloned())
            .unwrap_or_default()
    }

    fn get_unspent_outputs(&self, address: &TaggedHash) -> Vec<UnspentOutput> {
        let inner = self.inner.read();
        inner
            .chain_of(address)
            .and_then(|chain| inner.unspent_outputs.get(&chain).cloned())
            .unwrap_or_default()
    }

    fn get_transaction_inputs(&self, address: &TaggedHash) -> Vec<TransactionInput> {
        let inner = self.inner.read();
        inner
            .chain_of(address)
            .and_then(|chain| inner.inputs.get(&chain).cloned())
            .unwrap_or_default()
    }

    fn get_transaction_summary(&self, address: &TaggedHash) -> Option<TransactionSummary> {
        let inner = self.inner.read();
        let tx = inner.transactions.get(&address.to_vec())?;
        let timestamp = inner.timestamps.get(&address.to_vec())?;
        let mut movement_addresses: Vec<TaggedHash> = tx
            .data
            .ledger
            .uco
            .iter()
            .map(|transfer| transfer.to.clone())
            .collect();
        movement_addresses.extend(tx.data.ledger.token.iter().map(|transfer| transfer.to.clone()));
        Some(TransactionSummary {
            address: tx.address.clone(),
            timestamp: timestamp.timestamp() as u32,
            tx_type: tx.tx_type,
            movement_addresses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_crypto::{derive_keypair, Curve};
    use axon_transaction::{TransactionData, TransactionType};
    use chrono::TimeZone;

    fn build_chain(seed: &[u8], count: u32) -> Vec<Transaction> {
        let origin = derive_keypair(b"origin", 0, Curve::Ed25519).unwrap();
        (0..count)
            .map(|index| {
                Transaction::build(
                    TransactionType::Transfer,
                    TransactionData::default(),
                    seed,
                    index,
                    Curve::Ed25519,
                    &origin,
                )
                .unwrap()
            })
            .collect()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_chain_assembly_and_tip() {
        let store = MemoryChainStore::new();
        let chain = build_chain(b"seed", 3);
        for (i, tx) in chain.iter().enumerate() {
            store.insert_transaction(tx.clone(), at(1_000 + i as i64));
        }

        // The tip is visible from any member of the chain.
        let tip = store.get_last_chain_address(&chain[0].address).unwrap();
        assert_eq!(tip.address, chain[2].address);
        assert_eq!(tip.timestamp, at(1_002));

        // And from the genesis previous address.
        let tip = store
            .get_last_chain_address(&chain[0].previous_address())
            .unwrap();
        assert_eq!(tip.address, chain[2].address);

        assert_eq!(store.get_transaction_chain_length(&chain[1].address), 3);
    }

    #[test]
    fn test_first_transaction_and_key() {
        let store = MemoryChainStore::new();
        let chain = build_chain(b"seed", 2);
        for tx in &chain {
            store.insert_transaction(tx.clone(), at(1_000));
        }

        let first = store.get_first_transaction(&chain[1].address).unwrap();
        assert_eq!(first.address, chain[0].address);
        assert_eq!(
            store.get_first_public_key(&chain[1].address).unwrap(),
            chain[0].previous_public_key
        );
    }

    #[test]
    fn test_chain_paging_by_timestamp() {
        let store = MemoryChainStore::new();
        let chain = build_chain(b"seed", 3);
        for (i, tx) in chain.iter().enumerate() {
            store.insert_transaction(tx.clone(), at(1_000 + 100 * i as i64));
        }

        let all = store.get_transaction_chain(&chain[0].address, None);
        assert_eq!(all.len(), 3);

        let after = store.get_transaction_chain(&chain[0].address, Some(1_100));
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].address, chain[2].address);
    }

    #[test]
    fn test_last_address_before() {
        let store = MemoryChainStore::new();
        let chain = build_chain(b"seed", 3);
        for (i, tx) in chain.iter().enumerate() {
            store.insert_transaction(tx.clone(), at(1_000 + 100 * i as i64));
        }

        let before = store
            .get_last_chain_address_before(&chain[0].address, at(1_150))
            .unwrap();
        assert_eq!(before, chain[1].address);
    }

    #[test]
    fn test_unknown_address_is_none() {
        let store = MemoryChainStore::new();
        let chain = build_chain(b"seed", 1);
        assert!(store.get_last_chain_address(&chain[0].address).is_none());
        assert!(!store.transaction_exists(&chain[0].address));
        assert_eq!(store.get_transaction_chain_length(&chain[0].address), 0);
    }
}
