//! End-to-end poller scenarios against in-memory collaborators.

use serde_json::json;

use squawker_dns::config::{BlockSelection, WatcherConfig};
use squawker_dns::watcher::CycleOutcome;

mod common;
use common::{funding_tx, harness, satori_transfer, CID, ZONE};

const RECORD: &str = r#"{"type":"A","data":"203.0.113.5"}"#;

/// Harness already past its initialization cycle at height 100.
async fn started(config: WatcherConfig) -> common::Harness {
    let mut h = harness(config);
    h.ledger.set_height(100);
    assert_eq!(h.poller.poll_once().await.unwrap(), CycleOutcome::Initialized(100));
    h
}

#[tokio::test]
async fn test_only_qualifying_transaction_is_published() {
    let mut h = started(WatcherConfig::default()).await;
    h.ledger.add_transaction(funding_tx("fund-alice", "RAlice"));
    h.ledger.add_transaction(funding_tx("fund-bob", "RBob"));
    h.content.put(CID, RECORD);

    let marker = format!("ipfs:{CID}");
    h.ledger.add_block(
        101,
        vec![
            satori_transfer("self", "fund-alice", "RAlice", json!(1), Some(&marker)),
            satori_transfer("payment", "fund-bob", "RCarol", json!(1), Some(&marker)),
        ],
    );
    h.ledger.set_height(101);

    let outcome = h.poller.poll_once().await.unwrap();
    let CycleOutcome::Processed(reports) = outcome else {
        panic!("expected processed blocks, got {outcome:?}");
    };
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].scanned, 2);
    assert_eq!(reports[0].matched, 1);
    assert_eq!(reports[0].updated, 1);

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].fqdn, format!("RAlice.evr.{ZONE}"));
    assert_eq!(sent[0].ttl, 300);
    assert_eq!(sent[0].record_type, "A");
    assert_eq!(sent[0].data, "203.0.113.5");
    assert_eq!(h.poller.cursor(), Some(101));
}

#[tokio::test]
async fn test_transaction_failures_are_isolated() {
    let mut h = started(WatcherConfig::default()).await;
    h.ledger.add_transaction(funding_tx("fund-alice", "RAlice"));
    h.ledger.add_transaction(funding_tx("fund-dave", "RDave"));
    h.content.put("QmGood", RECORD);
    h.content.put("QmBroken", "not json");

    h.ledger.add_block(
        101,
        vec![
            // Payload does not parse.
            satori_transfer("broken", "fund-alice", "RAlice", json!(1), Some("QmBroken")),
            // Prior transaction is unknown to the node.
            satori_transfer("orphan", "missing", "RAlice", json!(1), Some("QmGood")),
            satori_transfer("good", "fund-dave", "RDave", json!(1), Some("QmGood")),
        ],
    );
    h.ledger.set_height(101);

    let CycleOutcome::Processed(reports) = h.poller.poll_once().await.unwrap() else {
        panic!("expected processed blocks");
    };
    assert_eq!(reports[0].matched, 2);
    assert_eq!(reports[0].failed, 1);
    assert_eq!(reports[0].updated, 1);

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subdomain, "RDave.evr");
    assert_eq!(h.poller.cursor(), Some(101));
}

#[tokio::test]
async fn test_rejected_update_does_not_stop_block() {
    let mut h = started(WatcherConfig::default()).await;
    h.ledger.add_transaction(funding_tx("fund-alice", "RAlice"));
    h.content.put(CID, RECORD);
    h.ledger.add_block(
        101,
        vec![satori_transfer("self", "fund-alice", "RAlice", json!(1), Some(CID))],
    );
    h.ledger.set_height(101);
    *h.transport.reject.lock().unwrap() = true;

    let CycleOutcome::Processed(reports) = h.poller.poll_once().await.unwrap() else {
        panic!("expected processed blocks");
    };
    assert_eq!(reports[0].failed, 1);
    // The block still counts as processed.
    assert_eq!(h.poller.cursor(), Some(101));
}

#[tokio::test]
async fn test_block_failure_keeps_cursor() {
    let mut h = started(WatcherConfig::default()).await;
    h.ledger.fail_block(101);
    h.ledger.set_height(101);

    assert!(h.poller.poll_once().await.is_err());
    assert_eq!(h.poller.cursor(), Some(100));

    // Same block is retried on the next cycle.
    assert!(h.poller.poll_once().await.is_err());
    assert_eq!(h.poller.cursor(), Some(100));

    h.ledger.heal_block(101);
    h.poller.poll_once().await.unwrap();
    assert_eq!(h.poller.cursor(), Some(101));
    assert_eq!(*h.ledger.block_requests.lock().unwrap(), vec![101, 101, 101]);
}

#[tokio::test]
async fn test_range_mode_stops_at_failed_block() {
    let mut h = started(WatcherConfig::default()).await;
    h.ledger.fail_block(102);
    h.ledger.set_height(103);

    assert!(h.poller.poll_once().await.is_err());
    assert_eq!(h.poller.cursor(), Some(101));
    assert_eq!(*h.ledger.block_requests.lock().unwrap(), vec![101, 102]);
}

#[tokio::test]
async fn test_range_mode_fills_gaps() {
    let mut h = started(WatcherConfig::default()).await;
    h.ledger.set_height(104);

    let CycleOutcome::Processed(reports) = h.poller.poll_once().await.unwrap() else {
        panic!("expected processed blocks");
    };
    let heights: Vec<u64> = reports.iter().map(|r| r.height).collect();
    assert_eq!(heights, vec![101, 102, 103, 104]);
    assert_eq!(h.poller.cursor(), Some(104));
    assert_eq!(h.poller.poll_once().await.unwrap(), CycleOutcome::Idle);
}

#[tokio::test]
async fn test_range_mode_batch_limit() {
    let config = WatcherConfig {
        max_blocks_per_cycle: 2,
        ..Default::default()
    };
    let mut h = started(config).await;
    h.ledger.set_height(105);

    h.poller.poll_once().await.unwrap();
    assert_eq!(h.poller.cursor(), Some(102));
    h.poller.poll_once().await.unwrap();
    assert_eq!(h.poller.cursor(), Some(104));
    h.poller.poll_once().await.unwrap();
    assert_eq!(h.poller.cursor(), Some(105));
}

#[tokio::test]
async fn test_latest_mode_skips_intermediate_blocks() {
    let config = WatcherConfig {
        block_selection: BlockSelection::Latest,
        ..Default::default()
    };
    let mut h = started(config).await;
    h.ledger.set_height(104);

    h.poller.poll_once().await.unwrap();
    assert_eq!(*h.ledger.block_requests.lock().unwrap(), vec![104]);
    assert_eq!(h.poller.cursor(), Some(104));
}

#[tokio::test]
async fn test_confirmations_hold_back_target() {
    let config = WatcherConfig {
        confirmations: 2,
        ..Default::default()
    };
    let mut h = harness(config);
    h.ledger.set_height(100);
    assert_eq!(h.poller.poll_once().await.unwrap(), CycleOutcome::Initialized(98));

    h.ledger.set_height(101);
    h.poller.poll_once().await.unwrap();
    assert_eq!(*h.ledger.block_requests.lock().unwrap(), vec![99]);
}

#[tokio::test]
async fn test_start_height() {
    let config = WatcherConfig {
        start_height: Some(95),
        ..Default::default()
    };
    let mut h = harness(config);
    h.ledger.set_height(97);
    assert_eq!(h.poller.poll_once().await.unwrap(), CycleOutcome::Initialized(94));

    h.poller.poll_once().await.unwrap();
    assert_eq!(*h.ledger.block_requests.lock().unwrap(), vec![95, 96, 97]);
}

#[tokio::test]
async fn test_republishing_appends() {
    let mut h = started(WatcherConfig::default()).await;
    h.ledger.add_transaction(funding_tx("fund-alice", "RAlice"));
    h.content.put(CID, RECORD);
    h.ledger.add_block(
        101,
        vec![satori_transfer("first", "fund-alice", "RAlice", json!(1), Some(CID))],
    );
    h.ledger.add_block(
        102,
        vec![satori_transfer("second", "fund-alice", "RAlice", json!(1), Some(CID))],
    );
    h.ledger.set_height(102);

    h.poller.poll_once().await.unwrap();

    // Append semantics: the same record is sent twice, nothing replaces it.
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}
