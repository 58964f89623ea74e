//! Wire protocol scenarios against literal byte vectors.

use crate::generators::*;
use axon_crypto::{HashAlgorithm, TaggedHash};
use axon_transaction::{Ledger, TransactionData, TransactionType, UcoTransfer};
use axon_wire::{decode, encode, Frame, Request, Response, WireError};

#[test]
fn test_get_transaction_wire_scenario() {
    // encode(GetTransaction{0x00 ‖ sha256(...)}) = 0x03 ‖ 0x00 ‖ digest.
    let address = TaggedHash::compute(HashAlgorithm::Sha256, b"wire scenario");
    let frame = Frame::Request(Request::GetTransaction {
        address: address.clone(),
    });

    let wire = encode(&frame).unwrap();
    let mut expected = vec![0x03, 0x00];
    expected.extend_from_slice(address.digest());
    assert_eq!(wire, expected);

    let (decoded, remainder) = decode(&wire).unwrap();
    assert_eq!(decoded, frame);
    assert!(remainder.is_empty());
}

#[test]
fn test_ping_and_ok_are_single_bytes() {
    assert_eq!(encode(&Frame::Request(Request::Ping)).unwrap(), vec![0x18]);
    assert_eq!(encode(&Frame::Response(Response::Ok)).unwrap(), vec![0xF3]);
}

#[test]
fn test_new_transaction_roundtrip_with_ledger() {
    let reader = keypair(b"reader", 0);
    let tx = build_tx(
        TransactionType::Transfer,
        TransactionData {
            content: b"invoice #42".to_vec(),
            ownerships: vec![ownership_for(&[reader.public()])],
            recipients: vec![sample_hash(9)],
            ledger: Ledger {
                uco: vec![UcoTransfer {
                    to: sample_hash(7),
                    amount: 1_050_000_000,
                }],
                token: Vec::new(),
            },
            ..Default::default()
        },
        b"payer chain",
        0,
    );

    let frame = Frame::Request(Request::NewTransaction { transaction: tx });
    let encoded = encode(&frame).unwrap();
    let (decoded, remainder) = decode(&encoded).unwrap();
    assert!(remainder.is_empty());
    assert_eq!(decoded, frame);
}

#[test]
fn test_chain_request_both_framings_accepted() {
    let address = sample_hash(4);

    // Short framing: just the address.
    let mut wire = vec![0x04];
    wire.extend_from_slice(&address.to_vec());
    let (frame, _) = decode(&wire).unwrap();
    assert_eq!(
        frame,
        Frame::Request(Request::GetTransactionChain {
            address: address.clone(),
            after: None,
        })
    );

    // Extended framing: the paging timestamp is retained, not discarded.
    wire.extend_from_slice(&1_640_995_200u32.to_be_bytes());
    let (frame, remainder) = decode(&wire).unwrap();
    assert!(remainder.is_empty());
    assert_eq!(
        frame,
        Frame::Request(Request::GetTransactionChain {
            address,
            after: Some(1_640_995_200),
        })
    );
}

#[test]
fn test_node_list_roundtrip() {
    let frame = Frame::Response(Response::NodeList {
        nodes: vec![
            registered_node(b"node a", "AAA"),
            registered_node(b"node b", "0F3"),
        ],
    });
    let encoded = encode(&frame).unwrap();
    let (decoded, remainder) = decode(&encoded).unwrap();
    assert!(remainder.is_empty());
    assert_eq!(decoded, frame);
}

#[test]
fn test_transaction_response_is_transparent() {
    // Tag 240 carries the transaction's own canonical encoding, nothing
    // else: stripping the tag yields exactly Transaction::serialize().
    let tx = build_tx(
        TransactionType::Transfer,
        TransactionData::default(),
        b"payer chain",
        0,
    );
    let wire = encode(&Frame::Response(Response::Transaction {
        transaction: tx.clone(),
    }))
    .unwrap();
    assert_eq!(wire[0], 0xF0);
    assert_eq!(&wire[1..], tx.serialize().as_slice());
}

#[test]
fn test_every_reserved_tag_fails() {
    for tag in 25u8..=238 {
        assert!(
            matches!(decode(&[tag]), Err(WireError::UnknownFrame(t)) if t == tag),
            "tag {} must be reserved",
            tag
        );
    }
    assert!(matches!(decode(&[255]), Err(WireError::UnknownFrame(255))));
}

#[test]
fn test_tampering_one_byte_never_silently_passes() {
    // Flip the algorithm tag of the address: the frame must fail, not
    // decode into something else.
    let address = sample_hash(1);
    let mut wire = encode(&Frame::Request(Request::GetTransaction { address })).unwrap();
    wire[1] = 0x63;
    assert!(matches!(
        decode(&wire),
        Err(WireError::UnknownAlgorithm(0x63))
    ));
}
