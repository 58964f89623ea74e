//! The transaction record.

use crate::TransactionType;
use axon_crypto::{derive_address, derive_keypair, verify, Curve, CryptoResult, Keypair, PublicKey, TaggedHash};

/// A UCO movement inside the ledger block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UcoTransfer {
    /// Recipient chain address.
    pub to: TaggedHash,
    /// Amount in sub-units.
    pub amount: u64,
}

/// A token movement inside the ledger block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    /// Address of the token creation transaction.
    pub token_address: TaggedHash,
    /// Recipient chain address.
    pub to: TaggedHash,
    /// Amount in sub-units.
    pub amount: u64,
}

/// Ledger movements of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ledger {
    /// UCO transfers.
    pub uco: Vec<UcoTransfer>,
    /// Token transfers.
    pub token: Vec<TokenTransfer>,
}

/// An encrypted secret with its delivery map.
///
/// `authorized_keys` maps each reader's public key to the secret's
/// encryption key wrapped for that reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    /// The encrypted secret payload.
    pub secret: Vec<u8>,
    /// Reader public key → wrapped encryption key.
    pub authorized_keys: Vec<(PublicKey, Vec<u8>)>,
}

/// The signed data block of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionData {
    /// Opaque content bytes.
    pub content: Vec<u8>,
    /// Smart-contract source text.
    pub code: String,
    /// Encrypted secrets and their readers.
    pub ownerships: Vec<Ownership>,
    /// Contract recipients.
    pub recipients: Vec<TaggedHash>,
    /// Ledger movements.
    pub ledger: Ledger,
}

/// A transaction of the network.
///
/// Immutable once constructed; all mutation happens by appending a new
/// transaction to the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Identifier of this transaction.
    pub address: TaggedHash,
    /// Transaction type.
    pub tx_type: TransactionType,
    /// Signed data block.
    pub data: TransactionData,
    /// Public key whose hash is the previous chain address.
    pub previous_public_key: PublicKey,
    /// Signature of `data` under `previous_public_key`.
    pub previous_signature: Vec<u8>,
    /// Signature of the body under an origin key.
    pub origin_signature: Vec<u8>,
}

impl Transaction {
    /// Build and sign a transaction on the chain seeded by `seed`.
    ///
    /// The transaction at `index` is signed by the keypair at `index`; its
    /// address is the hash of the public key at `index + 1`, which is what
    /// links the next transaction back to this one.
    pub fn build(
        tx_type: TransactionType,
        data: TransactionData,
        seed: &[u8],
        index: u32,
        curve: Curve,
        origin: &Keypair,
    ) -> CryptoResult<Self> {
        let previous = derive_keypair(seed, index, curve)?;
        let next = derive_keypair(seed, index + 1, curve)?;

        let mut tx = Self {
            address: derive_address(next.public()),
            tx_type,
            data,
            previous_public_key: previous.public().clone(),
            previous_signature: Vec::new(),
            origin_signature: Vec::new(),
        };
        tx.previous_signature = previous.sign(&tx.signing_payload())?;
        tx.origin_signature = origin.sign(&tx.origin_payload())?;
        Ok(tx)
    }

    /// The address of the previous transaction in this chain.
    pub fn previous_address(&self) -> TaggedHash {
        derive_address(&self.previous_public_key)
    }

    /// Check the previous signature against the data block.
    pub fn verify_previous_signature(&self) -> bool {
        verify(
            &self.previous_public_key,
            &self.signing_payload(),
            &self.previous_signature,
        )
    }

    /// Check the origin signature against any of the given origin keys.
    pub fn verify_origin_signature(&self, origin_keys: &[PublicKey]) -> bool {
        let payload = self.origin_payload();
        origin_keys
            .iter()
            .any(|key| verify(key, &payload, &self.origin_signature))
    }
}
