//! Dispatcher behaviour with collaborator doubles.

use crate::generators::*;
use crate::harness::TestContext;
use axon_transaction::{TransactionData, TransactionType};
use axon_wire::{process, ErrorReason, Request, Response};
use chrono::{DateTime, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_640_995_803, 0).unwrap()
}

#[tokio::test]
async fn test_ping_answers_ok() {
    let ctx = TestContext::new();
    let dispatch = ctx.dispatch(now(), true);
    let response = process(Request::Ping, &dispatch).await.unwrap();
    assert_eq!(response, Response::Ok);
}

#[tokio::test]
async fn test_get_transaction_not_found() {
    let ctx = TestContext::new();
    let dispatch = ctx.dispatch(now(), true);
    let response = process(
        Request::GetTransaction {
            address: sample_hash(1),
        },
        &dispatch,
    )
    .await
    .unwrap();
    assert_eq!(response, Response::NotFound);
}

#[tokio::test]
async fn test_get_transaction_returns_stored() {
    let ctx = TestContext::new();
    let tx = build_tx(
        TransactionType::Transfer,
        TransactionData::default(),
        b"payer chain",
        0,
    );
    ctx.store.insert_transaction(tx.clone(), now());

    let dispatch = ctx.dispatch(now(), true);
    let response = process(
        Request::GetTransaction {
            address: tx.address.clone(),
        },
        &dispatch,
    )
    .await
    .unwrap();
    assert_eq!(response, Response::Transaction { transaction: tx });
}

#[tokio::test]
async fn test_new_transaction_admitted_and_acknowledged() {
    let ctx = TestContext::new();
    let dispatch = ctx.dispatch(now(), true);
    let tx = build_tx(
        TransactionType::Transfer,
        TransactionData::default(),
        b"payer chain",
        0,
    );

    let response = process(Request::NewTransaction { transaction: tx }, &dispatch)
        .await
        .unwrap();
    assert_eq!(response, Response::Ok);
}

#[tokio::test]
async fn test_new_transaction_rejection_maps_to_invalid_transaction() {
    let ctx = TestContext::new();
    let dispatch = ctx.dispatch(now(), true);
    let mut tx = build_tx(
        TransactionType::Transfer,
        TransactionData::default(),
        b"payer chain",
        0,
    );
    tx.data.content = b"tampered".to_vec();

    let response = process(Request::NewTransaction { transaction: tx }, &dispatch)
        .await
        .unwrap();
    assert_eq!(
        response,
        Response::Error {
            reason: ErrorReason::InvalidTransaction
        }
    );
}

#[tokio::test]
async fn test_new_transaction_without_ack_times_out() {
    let ctx = TestContext::new();
    // Mining double does not acknowledge; the 100 ms timeout trips.
    let dispatch = ctx.dispatch(now(), false);
    let tx = build_tx(
        TransactionType::Transfer,
        TransactionData::default(),
        b"payer chain",
        0,
    );

    let response = process(Request::NewTransaction { transaction: tx }, &dispatch)
        .await
        .unwrap();
    assert_eq!(
        response,
        Response::Error {
            reason: ErrorReason::NetworkIssue
        }
    );
}

#[tokio::test]
async fn test_acknowledge_storage_wakes_pending_submission() {
    let ctx = TestContext::new();
    let dispatch = ctx.dispatch(now(), false);
    let tx = build_tx(
        TransactionType::Transfer,
        TransactionData::default(),
        b"payer chain",
        0,
    );
    let address = tx.address.clone();

    let pending = tokio::spawn({
        let dispatch = dispatch.clone();
        async move { process(Request::NewTransaction { transaction: tx }, &dispatch).await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let ack = process(Request::AcknowledgeStorage { address }, &dispatch)
        .await
        .unwrap();
    assert_eq!(ack, Response::Ok);
    assert_eq!(pending.await.unwrap().unwrap(), Response::Ok);
}

#[tokio::test]
async fn test_list_nodes_and_p2p_view() {
    let ctx = TestContext::new();
    let node_a = registered_node(b"node a", "AAA");
    let node_b = registered_node(b"node b", "BBB");
    ctx.nodes.add_node(node_a.clone());
    ctx.nodes.add_node(node_b.clone());
    ctx.nodes.set_unavailable(&node_b.first_public_key).unwrap();

    let dispatch = ctx.dispatch(now(), true);
    match process(Request::ListNodes, &dispatch).await.unwrap() {
        Response::NodeList { nodes } => assert_eq!(nodes.len(), 2),
        other => panic!("unexpected {:?}", other),
    }

    let response = process(
        Request::GetP2PView {
            node_public_keys: vec![
                node_a.first_public_key.clone(),
                node_b.first_public_key.clone(),
            ],
        },
        &dispatch,
    )
    .await
    .unwrap();
    assert_eq!(
        response,
        Response::P2PView {
            availabilities: vec![true, false]
        }
    );
}

#[tokio::test]
async fn test_node_availability_transition() {
    let ctx = TestContext::new();
    let node = registered_node(b"node a", "AAA");
    ctx.nodes.add_node(node.clone());
    ctx.nodes.set_unavailable(&node.first_public_key).unwrap();

    let dispatch = ctx.dispatch(now(), true);
    let response = process(
        Request::NodeAvailability {
            public_key: node.first_public_key.clone(),
        },
        &dispatch,
    )
    .await
    .unwrap();
    assert_eq!(response, Response::Ok);
    assert!(ctx.nodes.get_node(&node.first_public_key).unwrap().available);
}

#[tokio::test]
async fn test_chain_lookups() {
    let ctx = TestContext::new();
    let seed = b"payer chain";
    let tx0 = build_tx(TransactionType::Transfer, TransactionData::default(), seed, 0);
    let tx1 = build_tx(TransactionType::Transfer, TransactionData::default(), seed, 1);
    ctx.store
        .insert_transaction(tx0.clone(), Utc.timestamp_opt(1_640_995_000, 0).unwrap());
    ctx.store
        .insert_transaction(tx1.clone(), Utc.timestamp_opt(1_640_995_700, 0).unwrap());

    let dispatch = ctx.dispatch(now(), true);

    match process(
        Request::GetLastTransaction {
            address: tx0.address.clone(),
        },
        &dispatch,
    )
    .await
    .unwrap()
    {
        Response::Transaction { transaction } => assert_eq!(transaction.address, tx1.address),
        other => panic!("unexpected {:?}", other),
    }

    let response = process(
        Request::GetTransactionChainLength {
            address: tx0.address.clone(),
        },
        &dispatch,
    )
    .await
    .unwrap();
    assert_eq!(response, Response::TransactionChainLength { length: 2 });

    // Paging: only the entry after the timestamp comes back.
    match process(
        Request::GetTransactionChain {
            address: tx0.address.clone(),
            after: Some(1_640_995_500),
        },
        &dispatch,
    )
    .await
    .unwrap()
    {
        Response::TransactionList { transactions } => {
            assert_eq!(transactions.len(), 1);
            assert_eq!(transactions[0].address, tx1.address);
        }
        other => panic!("unexpected {:?}", other),
    }

    // As-of lookup falls back to the requested address for unknown chains.
    let response = process(
        Request::GetLastTransactionAddress {
            address: sample_hash(0x77),
            timestamp: 1_640_995_803,
        },
        &dispatch,
    )
    .await
    .unwrap();
    assert_eq!(
        response,
        Response::LastTransactionAddress {
            address: sample_hash(0x77)
        }
    );
}

#[tokio::test]
async fn test_storage_nonce_is_decryptable_by_recipient() {
    let ctx = TestContext::new();
    let dispatch = ctx.dispatch(now(), true);
    let recipient = keypair(b"storage node", 0);

    let response = process(
        Request::GetStorageNonce {
            public_key: recipient.public().clone(),
        },
        &dispatch,
    )
    .await
    .unwrap();
    match response {
        Response::EncryptedStorageNonce { digest } => {
            let nonce = axon_crypto::ec_decrypt(&recipient, &digest).unwrap();
            assert_eq!(nonce, dispatch.storage_nonce);
        }
        other => panic!("unexpected {:?}", other),
    }
}
