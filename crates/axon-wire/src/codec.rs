//! Bijective frame codec.
//!
//! `decode(encode(frame))` returns the frame and an empty remainder for
//! every frame a builder can construct. The reverse direction is only
//! canonical: wire bytes may carry padding bits in packed views, which
//! re-encode as zero, so `encode ∘ decode ∘ encode = encode`.
//!
//! Frames are self-delimited by their structure; the stream layer hands
//! the decoder one frame's bytes at a time. The one structurally open
//! tail — the optional paging timestamp of `GetTransactionChain` — is
//! resolved by the bytes remaining inside the frame.

use crate::frame::{ErrorReason, Frame, ReplicationRoles, ReplicationTree, Request, Response};
use crate::{WireError, WireResult};
use axon_crypto::{PublicKey, TaggedHash};
use axon_store::Node;
use axon_transaction::{
    amount_from_wire, amount_to_wire, read_f64, read_u16, read_u32, read_u8, take,
    write_f64, write_u16, write_u32, Transaction, TransactionInput, TransactionSummary,
    UnspentOutput, ValidationStamp,
};

mod tag {
    pub const GET_BOOTSTRAPPING_NODES: u8 = 0;
    pub const GET_STORAGE_NONCE: u8 = 1;
    pub const LIST_NODES: u8 = 2;
    pub const GET_TRANSACTION: u8 = 3;
    pub const GET_TRANSACTION_CHAIN: u8 = 4;
    pub const GET_UNSPENT_OUTPUTS: u8 = 5;
    pub const NEW_TRANSACTION: u8 = 6;
    pub const START_MINING: u8 = 7;
    pub const ADD_MINING_CONTEXT: u8 = 8;
    pub const CROSS_VALIDATE: u8 = 9;
    pub const CROSS_VALIDATION_DONE: u8 = 10;
    pub const REPLICATE_TRANSACTION: u8 = 11;
    pub const ACKNOWLEDGE_STORAGE: u8 = 12;
    pub const NOTIFY_END_OF_NODE_SYNC: u8 = 13;
    pub const GET_LAST_TRANSACTION: u8 = 14;
    pub const GET_BALANCE: u8 = 15;
    pub const GET_TRANSACTION_INPUTS: u8 = 16;
    pub const GET_TRANSACTION_CHAIN_LENGTH: u8 = 17;
    pub const GET_P2P_VIEW: u8 = 18;
    pub const GET_FIRST_PUBLIC_KEY: u8 = 19;
    pub const GET_LAST_TRANSACTION_ADDRESS: u8 = 20;
    pub const NOTIFY_LAST_TRANSACTION_ADDRESS: u8 = 21;
    pub const GET_TRANSACTION_SUMMARY: u8 = 22;
    pub const NODE_AVAILABILITY: u8 = 23;
    pub const PING: u8 = 24;

    pub const ERROR: u8 = 239;
    pub const TRANSACTION: u8 = 240;
    pub const TRANSACTION_LIST: u8 = 241;
    pub const NOT_FOUND: u8 = 242;
    pub const OK: u8 = 243;
    pub const BALANCE: u8 = 244;
    pub const UNSPENT_OUTPUT_LIST: u8 = 245;
    pub const BOOTSTRAPPING_NODES: u8 = 246;
    pub const ENCRYPTED_STORAGE_NONCE: u8 = 247;
    pub const LAST_TRANSACTION_ADDRESS: u8 = 248;
    pub const FIRST_PUBLIC_KEY: u8 = 249;
    pub const TRANSACTION_SUMMARY: u8 = 250;
    pub const P2P_VIEW: u8 = 251;
    pub const TRANSACTION_INPUT_LIST: u8 = 252;
    pub const NODE_LIST: u8 = 253;
    pub const TRANSACTION_CHAIN_LENGTH: u8 = 254;
}

/// Pack bits MSB-first, padding the final byte with zeroes.
fn write_packed_bits(out: &mut Vec<u8>, bits: &[bool]) {
    let mut byte = 0u8;
    let mut used = 0;
    for &bit in bits {
        if bit {
            byte |= 1 << (7 - used);
        }
        used += 1;
        if used == 8 {
            out.push(byte);
            byte = 0;
            used = 0;
        }
    }
    if used > 0 {
        out.push(byte);
    }
}

/// Read exactly `count` bits, consuming whole bytes. Padding bits in the
/// final byte are ignored (and therefore canonicalised on re-encode).
fn read_packed_bits(input: &mut &[u8], count: usize) -> WireResult<Vec<bool>> {
    let byte_len = count.div_ceil(8);
    let bytes = take(input, byte_len)?;
    let mut bits = Vec::with_capacity(count);
    for i in 0..count {
        bits.push(bytes[i / 8] & (1 << (7 - (i % 8))) != 0);
    }
    Ok(bits)
}

/// A length-prefixed bit view: `bit_len:u8` + packed bits.
fn write_bit_view(out: &mut Vec<u8>, bits: &[bool]) {
    out.push(bits.len() as u8);
    write_packed_bits(out, bits);
}

fn read_bit_view(input: &mut &[u8]) -> WireResult<Vec<bool>> {
    let len = read_u8(input)? as usize;
    read_packed_bits(input, len)
}

fn write_key_list_u8(out: &mut Vec<u8>, keys: &[PublicKey]) {
    out.push(keys.len() as u8);
    for key in keys {
        key.write(out);
    }
}

fn read_key_list_u8(input: &mut &[u8]) -> WireResult<Vec<PublicKey>> {
    let count = read_u8(input)? as usize;
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        keys.push(PublicKey::decode(input)?);
    }
    Ok(keys)
}

fn read_patch(input: &mut &[u8]) -> WireResult<String> {
    let bytes = take(input, 3)?;
    let patch = std::str::from_utf8(bytes)
        .map_err(|_| WireError::Malformed("patch is not ASCII"))?;
    if !patch.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WireError::Malformed("patch is not hexadecimal"));
    }
    Ok(patch.to_string())
}

impl Request {
    /// The frame tag of this request.
    pub fn tag(&self) -> u8 {
        match self {
            Request::GetBootstrappingNodes { .. } => tag::GET_BOOTSTRAPPING_NODES,
            Request::GetStorageNonce { .. } => tag::GET_STORAGE_NONCE,
            Request::ListNodes => tag::LIST_NODES,
            Request::GetTransaction { .. } => tag::GET_TRANSACTION,
            Request::GetTransactionChain { .. } => tag::GET_TRANSACTION_CHAIN,
            Request::GetUnspentOutputs { .. } => tag::GET_UNSPENT_OUTPUTS,
            Request::NewTransaction { .. } => tag::NEW_TRANSACTION,
            Request::StartMining { .. } => tag::START_MINING,
            Request::AddMiningContext { .. } => tag::ADD_MINING_CONTEXT,
            Request::CrossValidate { .. } => tag::CROSS_VALIDATE,
            Request::CrossValidationDone { .. } => tag::CROSS_VALIDATION_DONE,
            Request::ReplicateTransaction { .. } => tag::REPLICATE_TRANSACTION,
            Request::AcknowledgeStorage { .. } => tag::ACKNOWLEDGE_STORAGE,
            Request::NotifyEndOfNodeSync { .. } => tag::NOTIFY_END_OF_NODE_SYNC,
            Request::GetLastTransaction { .. } => tag::GET_LAST_TRANSACTION,
            Request::GetBalance { .. } => tag::GET_BALANCE,
            Request::GetTransactionInputs { .. } => tag::GET_TRANSACTION_INPUTS,
            Request::GetTransactionChainLength { .. } => tag::GET_TRANSACTION_CHAIN_LENGTH,
            Request::GetP2PView { .. } => tag::GET_P2P_VIEW,
            Request::GetFirstPublicKey { .. } => tag::GET_FIRST_PUBLIC_KEY,
            Request::GetLastTransactionAddress { .. } => tag::GET_LAST_TRANSACTION_ADDRESS,
            Request::NotifyLastTransactionAddress { .. } => tag::NOTIFY_LAST_TRANSACTION_ADDRESS,
            Request::GetTransactionSummary { .. } => tag::GET_TRANSACTION_SUMMARY,
            Request::NodeAvailability { .. } => tag::NODE_AVAILABILITY,
            Request::Ping => tag::PING,
        }
    }

    fn write_payload(&self, out: &mut Vec<u8>) -> WireResult<()> {
        match self {
            Request::GetBootstrappingNodes { patch } => {
                out.extend_from_slice(patch.as_bytes());
            }
            Request::GetStorageNonce { public_key } => public_key.write(out),
            Request::ListNodes | Request::Ping => {}
            Request::GetTransaction { address }
            | Request::GetUnspentOutputs { address }
            | Request::AcknowledgeStorage { address }
            | Request::GetLastTransaction { address }
            | Request::GetBalance { address }
            | Request::GetTransactionInputs { address }
            | Request::GetTransactionChainLength { address }
            | Request::GetFirstPublicKey { address }
            | Request::GetTransactionSummary { address } => address.write(out),
            Request::GetTransactionChain { address, after } => {
                address.write(out);
                if let Some(after) = after {
                    write_u32(out, *after);
                }
            }
            Request::NewTransaction { transaction } => {
                out.extend_from_slice(&transaction.serialize());
            }
            Request::StartMining {
                transaction,
                welcome_node_public_key,
                validation_node_public_keys,
            } => {
                out.extend_from_slice(&transaction.serialize());
                welcome_node_public_key.write(out);
                write_key_list_u8(out, validation_node_public_keys);
            }
            Request::AddMiningContext {
                address,
                validation_node_public_key,
                previous_storage_node_public_keys,
                chain_storage_nodes_view,
                beacon_storage_nodes_view,
                io_storage_nodes_view,
            } => {
                address.write(out);
                validation_node_public_key.write(out);
                write_key_list_u8(out, previous_storage_node_public_keys);
                write_bit_view(out, chain_storage_nodes_view);
                write_bit_view(out, beacon_storage_nodes_view);
                write_bit_view(out, io_storage_nodes_view);
            }
            Request::CrossValidate {
                address,
                stamp,
                replication_tree,
            } => {
                address.write(out);
                stamp.write(out);
                let (rows, width) = replication_tree.shape()?;
                out.push(rows);
                out.push(width);
                for matrix in [
                    &replication_tree.chain,
                    &replication_tree.beacon,
                    &replication_tree.io,
                ] {
                    let bits: Vec<bool> = matrix.iter().flatten().copied().collect();
                    write_packed_bits(out, &bits);
                }
            }
            Request::CrossValidationDone { address, stamp } => {
                address.write(out);
                stamp.write(out);
            }
            Request::ReplicateTransaction {
                transaction,
                roles,
                ack_storage,
            } => {
                out.extend_from_slice(&transaction.serialize());
                let mut packed = 0u8;
                if roles.chain {
                    packed |= 0b1000_0000;
                }
                if roles.io {
                    packed |= 0b0100_0000;
                }
                if roles.beacon {
                    packed |= 0b0010_0000;
                }
                if *ack_storage {
                    packed |= 0b0001_0000;
                }
                out.push(packed);
            }
            Request::NotifyEndOfNodeSync {
                node_public_key,
                timestamp,
            } => {
                node_public_key.write(out);
                write_u32(out, *timestamp);
            }
            Request::GetP2PView { node_public_keys } => {
                write_u16(out, node_public_keys.len() as u16);
                for key in node_public_keys {
                    key.write(out);
                }
            }
            Request::GetLastTransactionAddress { address, timestamp } => {
                address.write(out);
                write_u32(out, *timestamp);
            }
            Request::NotifyLastTransactionAddress {
                address,
                previous_address,
                timestamp,
            } => {
                address.write(out);
                previous_address.write(out);
                write_u32(out, *timestamp);
            }
            Request::NodeAvailability { public_key } => public_key.write(out),
        }
        Ok(())
    }
}

fn decode_request(tag_byte: u8, input: &mut &[u8]) -> WireResult<Request> {
    let request = match tag_byte {
        tag::GET_BOOTSTRAPPING_NODES => Request::GetBootstrappingNodes {
            patch: read_patch(input)?,
        },
        tag::GET_STORAGE_NONCE => Request::GetStorageNonce {
            public_key: PublicKey::decode(input)?,
        },
        tag::LIST_NODES => Request::ListNodes,
        tag::GET_TRANSACTION => Request::GetTransaction {
            address: TaggedHash::decode(input)?,
        },
        tag::GET_TRANSACTION_CHAIN => {
            let address = TaggedHash::decode(input)?;
            // Presence of the paging timestamp is inferred from the bytes
            // left inside the frame; both framings are accepted.
            let after = match input.len() {
                0 => None,
                1..=3 => return Err(WireError::Malformed("truncated paging timestamp")),
                _ => Some(read_u32(input)?),
            };
            Request::GetTransactionChain { address, after }
        }
        tag::GET_UNSPENT_OUTPUTS => Request::GetUnspentOutputs {
            address: TaggedHash::decode(input)?,
        },
        tag::NEW_TRANSACTION => Request::NewTransaction {
            transaction: Transaction::deserialize(input)?,
        },
        tag::START_MINING => {
            let transaction = Transaction::deserialize(input)?;
            let welcome_node_public_key = PublicKey::decode(input)?;
            let validation_node_public_keys = read_key_list_u8(input)?;
            Request::StartMining {
                transaction,
                welcome_node_public_key,
                validation_node_public_keys,
            }
        }
        tag::ADD_MINING_CONTEXT => {
            let address = TaggedHash::decode(input)?;
            let validation_node_public_key = PublicKey::decode(input)?;
            let previous_storage_node_public_keys = read_key_list_u8(input)?;
            let chain_storage_nodes_view = read_bit_view(input)?;
            let beacon_storage_nodes_view = read_bit_view(input)?;
            let io_storage_nodes_view = read_bit_view(input)?;
            Request::AddMiningContext {
                address,
                validation_node_public_key,
                previous_storage_node_public_keys,
                chain_storage_nodes_view,
                beacon_storage_nodes_view,
                io_storage_nodes_view,
            }
        }
        tag::CROSS_VALIDATE => {
            let address = TaggedHash::decode(input)?;
            let stamp = ValidationStamp::read(input)?;
            let rows = read_u8(input)? as usize;
            let width = read_u8(input)? as usize;
            let mut matrices = Vec::with_capacity(3);
            for _ in 0..3 {
                let bits = read_packed_bits(input, rows * width)?;
                let matrix: Vec<Vec<bool>> =
                    bits.chunks(width.max(1)).map(|row| row.to_vec()).collect();
                // A zero-width tree decodes to `rows` empty rows.
                let matrix = if width == 0 {
                    vec![Vec::new(); rows]
                } else {
                    matrix
                };
                matrices.push(matrix);
            }
            let io = matrices.pop().unwrap_or_default();
            let beacon = matrices.pop().unwrap_or_default();
            let chain = matrices.pop().unwrap_or_default();
            Request::CrossValidate {
                address,
                stamp,
                replication_tree: ReplicationTree { chain, beacon, io },
            }
        }
        tag::CROSS_VALIDATION_DONE => Request::CrossValidationDone {
            address: TaggedHash::decode(input)?,
            stamp: ValidationStamp::read(input)?,
        },
        tag::REPLICATE_TRANSACTION => {
            let transaction = Transaction::deserialize(input)?;
            let packed = read_u8(input)?;
            Request::ReplicateTransaction {
                transaction,
                roles: ReplicationRoles {
                    chain: packed & 0b1000_0000 != 0,
                    io: packed & 0b0100_0000 != 0,
                    beacon: packed & 0b0010_0000 != 0,
                },
                ack_storage: packed & 0b0001_0000 != 0,
            }
        }
        tag::ACKNOWLEDGE_STORAGE => Request::AcknowledgeStorage {
            address: TaggedHash::decode(input)?,
        },
        tag::NOTIFY_END_OF_NODE_SYNC => Request::NotifyEndOfNodeSync {
            node_public_key: PublicKey::decode(input)?,
            timestamp: read_u32(input)?,
        },
        tag::GET_LAST_TRANSACTION => Request::GetLastTransaction {
            address: TaggedHash::decode(input)?,
        },
        tag::GET_BALANCE => Request::GetBalance {
            address: TaggedHash::decode(input)?,
        },
        tag::GET_TRANSACTION_INPUTS => Request::GetTransactionInputs {
            address: TaggedHash::decode(input)?,
        },
        tag::GET_TRANSACTION_CHAIN_LENGTH => Request::GetTransactionChainLength {
            address: TaggedHash::decode(input)?,
        },
        tag::GET_P2P_VIEW => {
            let count = read_u16(input)? as usize;
            let mut node_public_keys = Vec::with_capacity(count);
            for _ in 0..count {
                node_public_keys.push(PublicKey::decode(input)?);
            }
            Request::GetP2PView { node_public_keys }
        }
        tag::GET_FIRST_PUBLIC_KEY => Request::GetFirstPublicKey {
            address: TaggedHash::decode(input)?,
        },
        tag::GET_LAST_TRANSACTION_ADDRESS => Request::GetLastTransactionAddress {
            address: TaggedHash::decode(input)?,
            timestamp: read_u32(input)?,
        },
        tag::NOTIFY_LAST_TRANSACTION_ADDRESS => Request::NotifyLastTransactionAddress {
            address: TaggedHash::decode(input)?,
            previous_address: TaggedHash::decode(input)?,
            timestamp: read_u32(input)?,
        },
        tag::GET_TRANSACTION_SUMMARY => Request::GetTransactionSummary {
            address: TaggedHash::decode(input)?,
        },
        tag::NODE_AVAILABILITY => Request::NodeAvailability {
            public_key: PublicKey::decode(input)?,
        },
        tag::PING => Request::Ping,
        other => return Err(WireError::UnknownFrame(other)),
    };
    Ok(request)
}

impl Response {
    /// The frame tag of this response.
    pub fn tag(&self) -> u8 {
        match self {
            Response::Error { .. } => tag::ERROR,
            Response::Transaction { .. } => tag::TRANSACTION,
            Response::TransactionList { .. } => tag::TRANSACTION_LIST,
            Response::NotFound => tag::NOT_FOUND,
            Response::Ok => tag::OK,
            Response::Balance { .. } => tag::BALANCE,
            Response::UnspentOutputList { .. } => tag::UNSPENT_OUTPUT_LIST,
            Response::BootstrappingNodes { .. } => tag::BOOTSTRAPPING_NODES,
            Response::EncryptedStorageNonce { .. } => tag::ENCRYPTED_STORAGE_NONCE,
            Response::LastTransactionAddress { .. } => tag::LAST_TRANSACTION_ADDRESS,
            Response::FirstPublicKey { .. } => tag::FIRST_PUBLIC_KEY,
            Response::TransactionSummary { .. } => tag::TRANSACTION_SUMMARY,
            Response::P2PView { .. } => tag::P2P_VIEW,
            Response::TransactionInputList { .. } => tag::TRANSACTION_INPUT_LIST,
            Response::NodeList { .. } => tag::NODE_LIST,
            Response::TransactionChainLength { .. } => tag::TRANSACTION_CHAIN_LENGTH,
        }
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        match self {
            Response::Error { reason } => out.push(*reason as u8),
            // The transaction payload is the record's own encoding, with
            // no extra wrapping.
            Response::Transaction { transaction } => {
                out.extend_from_slice(&transaction.serialize());
            }
            Response::TransactionList { transactions } => {
                write_u32(out, transactions.len() as u32);
                for transaction in transactions {
                    out.extend_from_slice(&transaction.serialize());
                }
            }
            Response::NotFound | Response::Ok => {}
            Response::Balance { uco, tokens } => {
                write_f64(out, amount_to_wire(*uco));
                write_u16(out, tokens.len() as u16);
                for (token_address, amount) in tokens {
                    token_address.write(out);
                    write_f64(out, amount_to_wire(*amount));
                }
            }
            Response::UnspentOutputList { outputs } => {
                write_u32(out, outputs.len() as u32);
                for output in outputs {
                    output.write(out);
                }
            }
            Response::BootstrappingNodes { nodes } => {
                out.push(nodes.len() as u8);
                for node in nodes {
                    node.write(out);
                }
            }
            Response::EncryptedStorageNonce { digest } => {
                out.push(digest.len() as u8);
                out.extend_from_slice(digest);
            }
            Response::LastTransactionAddress { address } => address.write(out),
            Response::FirstPublicKey { public_key } => public_key.write(out),
            Response::TransactionSummary { summary } => summary.write(out),
            Response::P2PView { availabilities } => write_bit_view(out, availabilities),
            Response::TransactionInputList { inputs } => {
                write_u32(out, inputs.len() as u32);
                for input in inputs {
                    input.write(out);
                }
            }
            Response::NodeList { nodes } => {
                write_u16(out, nodes.len() as u16);
                for node in nodes {
                    node.write(out);
                }
            }
            Response::TransactionChainLength { length } => write_u32(out, *length),
        }
    }
}

fn decode_response(tag_byte: u8, input: &mut &[u8]) -> WireResult<Response> {
    let response = match tag_byte {
        tag::ERROR => Response::Error {
            reason: ErrorReason::try_from(read_u8(input)?)?,
        },
        tag::TRANSACTION => Response::Transaction {
            transaction: Transaction::deserialize(input)?,
        },
        tag::TRANSACTION_LIST => {
            let count = read_u32(input)? as usize;
            let mut transactions = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                transactions.push(Transaction::deserialize(input)?);
            }
            Response::TransactionList { transactions }
        }
        tag::NOT_FOUND => Response::NotFound,
        tag::OK => Response::Ok,
        tag::BALANCE => {
            let uco = amount_from_wire(read_f64(input)?)?;
            let count = read_u16(input)? as usize;
            let mut tokens = Vec::with_capacity(count);
            for _ in 0..count {
                let token_address = TaggedHash::decode(input)?;
                let amount = amount_from_wire(read_f64(input)?)?;
                tokens.push((token_address, amount));
            }
            Response::Balance { uco, tokens }
        }
        tag::UNSPENT_OUTPUT_LIST => {
            let count = read_u32(input)? as usize;
            let mut outputs = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                outputs.push(UnspentOutput::read(input)?);
            }
            Response::UnspentOutputList { outputs }
        }
        tag::BOOTSTRAPPING_NODES => {
            let count = read_u8(input)? as usize;
            let mut nodes = Vec::with_capacity(count);
            for _ in 0..count {
                nodes.push(Node::read(input)?);
            }
            Response::BootstrappingNodes { nodes }
        }
        tag::ENCRYPTED_STORAGE_NONCE => {
            let len = read_u8(input)? as usize;
            Response::EncryptedStorageNonce {
                digest: take(input, len)?.to_vec(),
            }
        }
        tag::LAST_TRANSACTION_ADDRESS => Response::LastTransactionAddress {
            address: TaggedHash::decode(input)?,
        },
        tag::FIRST_PUBLIC_KEY => Response::FirstPublicKey {
            public_key: PublicKey::decode(input)?,
        },
        tag::TRANSACTION_SUMMARY => Response::TransactionSummary {
            summary: TransactionSummary::read(input)?,
        },
        tag::P2P_VIEW => Response::P2PView {
            availabilities: read_bit_view(input)?,
        },
        tag::TRANSACTION_INPUT_LIST => {
            let count = read_u32(input)? as usize;
            let mut inputs = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                inputs.push(TransactionInput::read(input)?);
            }
            Response::TransactionInputList { inputs }
        }
        tag::NODE_LIST => {
            let count = read_u16(input)? as usize;
            let mut nodes = Vec::with_capacity(count);
            for _ in 0..count {
                nodes.push(Node::read(input)?);
            }
            Response::NodeList { nodes }
        }
        tag::TRANSACTION_CHAIN_LENGTH => Response::TransactionChainLength {
            length: read_u32(input)?,
        },
        other => return Err(WireError::UnknownFrame(other)),
    };
    Ok(response)
}

/// Encode a frame. Total: every constructible frame encodes.
pub fn encode(frame: &Frame) -> WireResult<Vec<u8>> {
    let mut out = Vec::new();
    match frame {
        Frame::Request(request) => {
            out.push(request.tag());
            request.write_payload(&mut out)?;
        }
        Frame::Response(response) => {
            out.push(response.tag());
            response.write_payload(&mut out);
        }
    }
    Ok(out)
}

/// Decode one frame from the front of `bytes`, returning the remainder.
///
/// Never panics on short input: returns [`WireError::Incomplete`] with the
/// minimum additional byte count when determinable, [`WireError::Malformed`]
/// otherwise. Unknown tags anywhere fail the whole frame; no partial state
/// escapes.
pub fn decode(bytes: &[u8]) -> WireResult<(Frame, &[u8])> {
    let mut input = bytes;
    if input.is_empty() {
        return Err(WireError::Incomplete { needed: 1 });
    }
    let tag_byte = input[0];
    input = &input[1..];
    let frame = match tag_byte {
        0..=24 => Frame::Request(decode_request(tag_byte, &mut input)?),
        239..=254 => Frame::Response(decode_response(tag_byte, &mut input)?),
        other => return Err(WireError::UnknownFrame(other)),
    };
    Ok((frame, input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_crypto::{derive_keypair, Curve, HashAlgorithm, TaggedHash};
    use axon_store::Transport;
    use axon_transaction::{TransactionData, TransactionType};
    use std::net::Ipv4Addr;

    fn sample_hash(byte: u8) -> TaggedHash {
        TaggedHash::compute(HashAlgorithm::Sha256, &[byte])
    }

    fn sample_key(seed: &[u8]) -> PublicKey {
        derive_keypair(seed, 0, Curve::Ed25519)
            .unwrap()
            .public()
            .clone()
    }

    fn sample_transaction() -> Transaction {
        let origin = derive_keypair(b"origin", 0, Curve::Ed25519).unwrap();
        Transaction::build(
            TransactionType::Transfer,
            TransactionData::default(),
            b"chain seed",
            0,
            Curve::Ed25519,
            &origin,
        )
        .unwrap()
    }

    fn sample_stamp() -> ValidationStamp {
        ValidationStamp {
            timestamp: 1_640_995_200,
            proof_of_work: sample_key(b"pow"),
            proof_of_integrity: sample_hash(0x10),
            signature: vec![0xEE; 64],
        }
    }

    fn sample_node(seed: &[u8]) -> Node {
        let key = sample_key(seed);
        Node {
            first_public_key: key.clone(),
            last_public_key: sample_key(b"last"),
            ip: Ipv4Addr::new(80, 20, 10, 200),
            port: 3000,
            http_port: 4000,
            transport: Transport::Tcp,
            reward_address: sample_hash(0x42),
            origin_public_key: sample_key(b"origin"),
            certificate: vec![0xCA; 16],
            network_patch: "F1B".to_string(),
            geo_patch: "AC2".to_string(),
            available: true,
            authorized: true,
            authorization_date: 1_700_000_000,
        }
    }

    fn roundtrip(frame: Frame) {
        let encoded = encode(&frame).unwrap();
        let (decoded, rest) = decode(&encoded).unwrap();
        assert!(rest.is_empty(), "remainder after {:?}", frame);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_get_transaction_wire_vector() {
        // encode(GetTransaction{0x00 ‖ sha256 digest}) = 0x03 ‖ 0x00 ‖ digest
        let address = TaggedHash::compute(HashAlgorithm::Sha256, b"some content");
        let frame = Frame::Request(Request::GetTransaction {
            address: address.clone(),
        });

        let encoded = encode(&frame).unwrap();
        assert_eq!(encoded[0], 0x03);
        assert_eq!(encoded[1], 0x00);
        assert_eq!(&encoded[2..], address.digest());
        assert_eq!(encoded.len(), 34);

        let (decoded, rest) = decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_request_roundtrips() {
        let frames = vec![
            Request::GetBootstrappingNodes {
                patch: "F1B".to_string(),
            },
            Request::GetStorageNonce {
                public_key: sample_key(b"node"),
            },
            Request::ListNodes,
            Request::GetTransaction {
                address: sample_hash(1),
            },
            Request::GetTransactionChain {
                address: sample_hash(2),
                after: None,
            },
            Request::GetTransactionChain {
                address: sample_hash(2),
                after: Some(1_640_995_200),
            },
            Request::GetUnspentOutputs {
                address: sample_hash(3),
            },
            Request::NewTransaction {
                transaction: sample_transaction(),
            },
            Request::StartMining {
                transaction: sample_transaction(),
                welcome_node_public_key: sample_key(b"welcome"),
                validation_node_public_keys: vec![sample_key(b"v1"), sample_key(b"v2")],
            },
            Request::AddMiningContext {
                address: sample_hash(4),
                validation_node_public_key: sample_key(b"v1"),
                previous_storage_node_public_keys: vec![sample_key(b"s1")],
                chain_storage_nodes_view: vec![true, false, true],
                beacon_storage_nodes_view: vec![false; 9],
                io_storage_nodes_view: vec![true; 11],
            },
            Request::CrossValidate {
                address: sample_hash(5),
                stamp: sample_stamp(),
                replication_tree: ReplicationTree {
                    chain: vec![vec![true, false, true], vec![false, true, false]],
                    beacon: vec![vec![true, true, false], vec![false, false, true]],
                    io: vec![vec![false, false, false], vec![true, true, true]],
                },
            },
            Request::CrossValidationDone {
                address: sample_hash(6),
                stamp: sample_stamp(),
            },
            Request::ReplicateTransaction {
                transaction: sample_transaction(),
                roles: ReplicationRoles {
                    chain: true,
                    io: false,
                    beacon: true,
                },
                ack_storage: true,
            },
            Request::AcknowledgeStorage {
                address: sample_hash(7),
            },
            Request::NotifyEndOfNodeSync {
                node_public_key: sample_key(b"sync"),
                timestamp: 1_650_000_000,
            },
            Request::GetLastTransaction {
                address: sample_hash(8),
            },
            Request::GetBalance {
                address: sample_hash(9),
            },
            Request::GetTransactionInputs {
                address: sample_hash(10),
            },
            Request::GetTransactionChainLength {
                address: sample_hash(11),
            },
            Request::GetP2PView {
                node_public_keys: vec![sample_key(b"p1"), sample_key(b"p2")],
            },
            Request::GetFirstPublicKey {
                address: sample_hash(12),
            },
            Request::GetLastTransactionAddress {
                address: sample_hash(13),
                timestamp: 1_660_000_000,
            },
            Request::NotifyLastTransactionAddress {
                address: sample_hash(14),
                previous_address: sample_hash(15),
                timestamp: 1_670_000_000,
            },
            Request::GetTransactionSummary {
                address: sample_hash(16),
            },
            Request::NodeAvailability {
                public_key: sample_key(b"avail"),
            },
            Request::Ping,
        ];
        for request in frames {
            roundtrip(Frame::Request(request));
        }
    }

    #[test]
    fn test_response_roundtrips() {
        let frames = vec![
            Response::Error {
                reason: ErrorReason::InvalidTransaction,
            },
            Response::Error {
                reason: ErrorReason::NetworkIssue,
            },
            Response::Transaction {
                transaction: sample_transaction(),
            },
            Response::TransactionList {
                transactions: vec![sample_transaction(), sample_transaction()],
            },
            Response::NotFound,
            Response::Ok,
            Response::Balance {
                uco: 1_250_000_000,
                tokens: vec![(sample_hash(20), 42), (sample_hash(21), 7)],
            },
            Response::UnspentOutputList {
                outputs: vec![UnspentOutput {
                    from: sample_hash(22),
                    amount: 99,
                    asset: axon_transaction::AssetClass::Uco,
                }],
            },
            Response::BootstrappingNodes {
                nodes: vec![sample_node(b"n1"), sample_node(b"n2")],
            },
            Response::EncryptedStorageNonce {
                digest: vec![0xAB; 60],
            },
            Response::LastTransactionAddress {
                address: sample_hash(23),
            },
            Response::FirstPublicKey {
                public_key: sample_key(b"first"),
            },
            Response::TransactionSummary {
                summary: TransactionSummary {
                    address: sample_hash(24),
                    timestamp: 1_640_995_200,
                    tx_type: TransactionType::Oracle,
                    movement_addresses: vec![sample_hash(25)],
                },
            },
            Response::P2PView {
                availabilities: vec![true, false, true, true, false],
            },
            Response::TransactionInputList {
                inputs: vec![TransactionInput {
                    from: sample_hash(26),
                    amount: 17,
                    asset: axon_transaction::AssetClass::Token(sample_hash(27)),
                    spent: false,
                    timestamp: 1_680_000_000,
                }],
            },
            Response::NodeList {
                nodes: vec![sample_node(b"n3")],
            },
            Response::TransactionChainLength { length: 12 },
        ];
        for response in frames {
            roundtrip(Frame::Response(response));
        }
    }

    #[test]
    fn test_reserved_tags_rejected() {
        for tag_byte in [25u8, 100, 238, 255] {
            match decode(&[tag_byte, 0, 0, 0]) {
                Err(WireError::UnknownFrame(t)) => assert_eq!(t, tag_byte),
                other => panic!("tag {}: unexpected {:?}", tag_byte, other),
            }
        }
    }

    #[test]
    fn test_empty_input_is_incomplete() {
        assert!(matches!(decode(&[]), Err(WireError::Incomplete { needed: 1 })));
    }

    #[test]
    fn test_truncated_hash_is_incomplete_with_needed() {
        // GetTransaction with only 10 of the 32 digest bytes present.
        let mut bytes = vec![0x03, 0x00];
        bytes.extend_from_slice(&[0u8; 10]);
        match decode(&bytes) {
            Err(WireError::Incomplete { needed }) => assert_eq!(needed, 22),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_hash_algorithm_fails_whole_frame() {
        let mut bytes = vec![0x03, 0x07];
        bytes.extend_from_slice(&[0u8; 64]);
        assert!(matches!(
            decode(&bytes),
            Err(WireError::UnknownAlgorithm(7))
        ));
    }

    #[test]
    fn test_decode_leaves_remainder_untouched() {
        let frame = Frame::Request(Request::Ping);
        let mut bytes = encode(&frame).unwrap();
        bytes.extend_from_slice(&[0x18, 0xFF]);

        let (decoded, rest) = decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(rest, &[0x18, 0xFF]);
    }

    #[test]
    fn test_replication_flags_padding_is_canonicalised() {
        // Wire data may carry garbage in the unused low nibble of the
        // packed roles byte; re-encoding clears it.
        let frame = Frame::Request(Request::ReplicateTransaction {
            transaction: sample_transaction(),
            roles: ReplicationRoles {
                chain: true,
                io: true,
                beacon: false,
            },
            ack_storage: false,
        });
        let mut wire = encode(&frame).unwrap();
        let last = wire.len() - 1;
        wire[last] |= 0b0000_1111;

        let (decoded, _) = decode(&wire).unwrap();
        assert_eq!(decoded, frame);
        let reencoded = encode(&decoded).unwrap();
        assert_eq!(reencoded, encode(&frame).unwrap());
        assert_eq!(
            encode(&decode(&reencoded).unwrap().0).unwrap(),
            reencoded,
            "encode-decode-encode must be idempotent"
        );
    }

    #[test]
    fn test_bit_view_padding_is_canonicalised() {
        let frame = Frame::Response(Response::P2PView {
            availabilities: vec![true, false, true],
        });
        let mut wire = encode(&frame).unwrap();
        // Set the 5 padding bits of the single packed byte.
        let last = wire.len() - 1;
        wire[last] |= 0b0001_1111;

        let (decoded, rest) = decode(&wire).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, frame);
        assert_eq!(encode(&decoded).unwrap(), encode(&frame).unwrap());
    }

    #[test]
    fn test_bit_view_exact_length() {
        // A view of length L decodes to exactly L bits regardless of
        // byte alignment.
        for len in [1usize, 7, 8, 9, 15, 16, 17] {
            let bits: Vec<bool> = (0..len).map(|i| i % 3 == 0).collect();
            let frame = Frame::Response(Response::P2PView {
                availabilities: bits.clone(),
            });
            let (decoded, _) = decode(&encode(&frame).unwrap()).unwrap();
            match decoded {
                Frame::Response(Response::P2PView { availabilities }) => {
                    assert_eq!(availabilities, bits)
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_cross_validate_mismatched_tree_fails_encode() {
        let frame = Frame::Request(Request::CrossValidate {
            address: sample_hash(5),
            stamp: sample_stamp(),
            replication_tree: ReplicationTree {
                chain: vec![vec![true, false]],
                beacon: vec![vec![true]],
                io: vec![vec![false, true]],
            },
        });
        assert!(matches!(
            encode(&frame),
            Err(WireError::Malformed("replication tree shape mismatch"))
        ));
    }

    #[test]
    fn test_chain_request_dangling_timestamp_is_malformed() {
        let mut bytes = vec![0x04, 0x00];
        bytes.extend_from_slice(&[0u8; 32]);
        bytes.extend_from_slice(&[1, 2]); // 2 stray bytes: not a u32
        assert!(matches!(decode(&bytes), Err(WireError::Malformed(_))));
    }
}
