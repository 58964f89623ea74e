//! Node membership table.

use crate::{StoreError, StoreResult};
use axon_crypto::{PublicKey, TaggedHash};
use axon_transaction::{
    read_u16, read_u32, read_u8, take, write_u16, write_u32, EncodingError, EncodingResult,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::info;

/// Supported transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Transport {
    /// Plain TCP.
    Tcp = 0,
}

impl TryFrom<u8> for Transport {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Transport::Tcp),
            _ => Err(EncodingError::Malformed("unknown transport")),
        }
    }
}

/// A registered node of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// First public key of the node chain (stable identifier).
    pub first_public_key: PublicKey,
    /// Current public key of the node chain.
    pub last_public_key: PublicKey,
    /// Reachable IPv4 address.
    pub ip: Ipv4Addr,
    /// P2P port.
    pub port: u16,
    /// HTTP port.
    pub http_port: u16,
    /// Transport protocol.
    pub transport: Transport,
    /// Address collecting the node's rewards.
    pub reward_address: TaggedHash,
    /// Origin device key that attested the node key.
    pub origin_public_key: PublicKey,
    /// Hardware certificate of the node key (empty for software keys).
    pub certificate: Vec<u8>,
    /// Network locality patch (3 hex characters).
    pub network_patch: String,
    /// Geographic locality patch (3 hex characters).
    pub geo_patch: String,
    /// Whether the node currently answers on the network.
    pub available: bool,
    /// Whether the node is authorized to validate.
    pub authorized: bool,
    /// Unix timestamp of the authorisation (0 when never authorized).
    pub authorization_date: u32,
}

impl Node {
    /// Append the wire encoding to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.first_public_key.write(out);
        self.last_public_key.write(out);
        out.extend_from_slice(&self.ip.octets());
        write_u16(out, self.port);
        write_u16(out, self.http_port);
        out.push(self.transport as u8);
        self.reward_address.write(out);
        self.origin_public_key.write(out);
        write_u16(out, self.certificate.len() as u16);
        out.extend_from_slice(&self.certificate);
        out.extend_from_slice(self.network_patch.as_bytes());
        out.extend_from_slice(self.geo_patch.as_bytes());
        out.push(self.available as u8);
        out.push(self.authorized as u8);
        write_u32(out, self.authorization_date);
    }

    /// Decode a node record from the front of `input`.
    pub fn read(input: &mut &[u8]) -> EncodingResult<Self> {
        let first_public_key = PublicKey::decode(input)?;
        let last_public_key = PublicKey::decode(input)?;
        let ip_bytes = take(input, 4)?;
        let ip = Ipv4Addr::new(ip_bytes[0], ip_bytes[1], ip_bytes[2], ip_bytes[3]);
        let port = read_u16(input)?;
        let http_port = read_u16(input)?;
        let transport = Transport::try_from(read_u8(input)?)?;
        let reward_address = TaggedHash::decode(input)?;
        let origin_public_key = PublicKey::decode(input)?;
        let cert_len = read_u16(input)? as usize;
        let certificate = take(input, cert_len)?.to_vec();
        let network_patch = read_patch(input)?;
        let geo_patch = read_patch(input)?;
        let available = read_u8(input)? != 0;
        let authorized = read_u8(input)? != 0;
        let authorization_date = read_u32(input)?;
        Ok(Self {
            first_public_key,
            last_public_key,
            ip,
            port,
            http_port,
            transport,
            reward_address,
            origin_public_key,
            certificate,
            network_patch,
            geo_patch,
            available,
            authorized,
            authorization_date,
        })
    }
}

fn read_patch(input: &mut &[u8]) -> EncodingResult<String> {
    let bytes = take(input, 3)?;
    let patch =
        std::str::from_utf8(bytes).map_err(|_| EncodingError::Malformed("patch is not ASCII"))?;
    if !patch.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EncodingError::Malformed("patch is not hexadecimal"));
    }
    Ok(patch.to_string())
}

/// Numeric value of a 3-hex-character patch, for locality distance.
fn patch_value(patch: &str) -> u32 {
    u32::from_str_radix(patch, 16).unwrap_or(0)
}

/// In-memory membership table.
///
/// Seeded during bootstrap; afterwards mutated only through the explicit
/// availability/authorisation transitions.
#[derive(Default)]
pub struct NodeTable {
    /// first public key bytes → node record.
    nodes: DashMap<Vec<u8>, Node>,
    /// last public key bytes → first public key bytes.
    last_key_index: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, replacing any previous record for the same chain.
    pub fn add_node(&self, node: Node) {
        info!(node = %node.first_public_key, ip = %node.ip, "Registering node");
        self.last_key_index
            .write()
            .insert(node.last_public_key.to_vec(), node.first_public_key.to_vec());
        self.nodes.insert(node.first_public_key.to_vec(), node);
    }

    /// All registered nodes.
    pub fn list_nodes(&self) -> Vec<Node> {
        self.nodes.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Nodes currently authorized to validate.
    pub fn authorized_nodes(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .filter(|entry| entry.value().authorized)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Look a node up by its first or last public key.
    pub fn get_node(&self, key: &PublicKey) -> Option<Node> {
        let key_bytes = key.to_vec();
        if let Some(node) = self.nodes.get(&key_bytes) {
            return Some(node.value().clone());
        }
        let first = self.last_key_index.read().get(&key_bytes).cloned()?;
        self.nodes.get(&first).map(|node| node.value().clone())
    }

    /// Whether `key` is the first public key of a registered node.
    pub fn is_node_first_key(&self, key: &PublicKey) -> bool {
        self.nodes.contains_key(&key.to_vec())
    }

    /// Registered nodes sorted by locality to `patch`, closest first.
    pub fn nearest_nodes(&self, patch: &str) -> Vec<Node> {
        let target = patch_value(patch);
        let mut nodes = self.list_nodes();
        nodes.sort_by_key(|node| patch_value(&node.network_patch).abs_diff(target));
        nodes
    }

    /// Mark the node owning `key` as globally available.
    pub fn set_globally_available(&self, key: &PublicKey) -> StoreResult<()> {
        self.update(key, |node| node.available = true)
    }

    /// Mark the node owning `key` as unavailable.
    pub fn set_unavailable(&self, key: &PublicKey) -> StoreResult<()> {
        self.update(key, |node| node.available = false)
    }

    /// Authorize the node owning `key` at the given Unix timestamp.
    pub fn set_authorized(&self, key: &PublicKey, date: u32) -> StoreResult<()> {
        self.update(key, |node| {
            node.authorized = true;
            node.authorization_date = date;
        })
    }

    /// Availability flags for the given first public keys, in order.
    pub fn availability_bits(&self, keys: &[PublicKey]) -> Vec<bool> {
        keys.iter()
            .map(|key| self.get_node(key).map(|node| node.available).unwrap_or(false))
            .collect()
    }

    fn update(&self, key: &PublicKey, f: impl FnOnce(&mut Node)) -> StoreResult<()> {
        let first = if self.nodes.contains_key(&key.to_vec()) {
            key.to_vec()
        } else {
            self.last_key_index
                .read()
                .get(&key.to_vec())
                .cloned()
                .ok_or_else(|| StoreError::UnknownNode(key.to_string()))?
        };
        match self.nodes.get_mut(&first) {
            Some(mut node) => {
                f(node.value_mut());
                Ok(())
            }
            None => Err(StoreError::UnknownNode(key.to_string())),
        }
    }
}
