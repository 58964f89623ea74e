//! Deterministic fixtures for the integration tests.

use axon_crypto::{
    derive_keypair, issue_key_certificate, Curve, HashAlgorithm, Keypair, PublicKey, TaggedHash,
};
use axon_store::{Node, Transport};
use axon_transaction::{Ownership, Transaction, TransactionData, TransactionType};
use axon_validation::NodeDeclaration;
use std::net::Ipv4Addr;

/// Seed of the test origin (device family) chain.
pub const ORIGIN_SEED: &[u8] = b"test origin seed";

/// The test origin keypair; registered in the harness registers.
pub fn origin_keypair() -> Keypair {
    derive_keypair(ORIGIN_SEED, 0, Curve::Ed25519).expect("origin keypair")
}

/// Ed25519 keypair at `index` of the chain seeded by `seed`.
pub fn keypair(seed: &[u8], index: u32) -> Keypair {
    derive_keypair(seed, index, Curve::Ed25519).expect("test keypair")
}

/// A deterministic tagged hash.
pub fn sample_hash(byte: u8) -> TaggedHash {
    TaggedHash::compute(HashAlgorithm::Sha256, &[byte])
}

/// Build and sign a transaction on `seed` at `index`, origin-signed by the
/// test origin key.
pub fn build_tx(
    tx_type: TransactionType,
    data: TransactionData,
    seed: &[u8],
    index: u32,
) -> Transaction {
    Transaction::build(tx_type, data, seed, index, Curve::Ed25519, &origin_keypair())
        .expect("build transaction")
}

/// A well-formed `node` declaration whose certificate attests
/// `node_public_key` under the test origin key.
pub fn node_declaration(node_public_key: &PublicKey) -> NodeDeclaration {
    let origin = origin_keypair();
    let certificate =
        issue_key_certificate(&origin, node_public_key).expect("issue certificate");
    NodeDeclaration {
        ip: Ipv4Addr::new(80, 20, 10, 200),
        port: 3000,
        http_port: 4000,
        transport: Transport::Tcp,
        reward_address: sample_hash(0xAA),
        origin_public_key: origin.public().clone(),
        certificate,
    }
}

/// An ownership delivering one secret to the given readers.
pub fn ownership_for(readers: &[&PublicKey]) -> Ownership {
    Ownership {
        secret: vec![0x5E; 32],
        authorized_keys: readers
            .iter()
            .map(|reader| ((*reader).clone(), vec![0xE0; 44]))
            .collect(),
    }
}

/// A registered node record whose chain is seeded by `seed`.
pub fn registered_node(seed: &[u8], patch: &str) -> Node {
    let first = keypair(seed, 0);
    let last = keypair(seed, 3);
    Node {
        first_public_key: first.public().clone(),
        last_public_key: last.public().clone(),
        ip: Ipv4Addr::new(127, 0, 0, 1),
        port: 3002,
        http_port: 4000,
        transport: Transport::Tcp,
        reward_address: sample_hash(0xBB),
        origin_public_key: origin_keypair().public().clone(),
        certificate: Vec::new(),
        network_patch: patch.to_string(),
        geo_patch: patch.to_string(),
        available: true,
        authorized: true,
        authorization_date: 1_640_000_000,
    }
}
