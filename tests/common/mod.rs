//! Shared fakes for integration testing.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use squawker_dns::config::WatcherConfig;
use squawker_dns::content::{ContentError, ContentStore, RecordResolver};
use squawker_dns::ledger::{Block, Ledger, LedgerError, LedgerResult, Transaction};
use squawker_dns::protocol::Classifier;
use squawker_dns::watcher::ChainPoller;
use squawker_dns::zone::{DnsTransport, UpdateError, ZoneUpdateRequest, ZoneUpdater};

pub const ZONE: &str = "example.com";
pub const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

/// In-memory chain.
#[derive(Default)]
pub struct FakeLedger {
    height: AtomicU64,
    blocks: Mutex<HashMap<u64, Block>>,
    transactions: Mutex<HashMap<String, Transaction>>,
    failing_blocks: Mutex<HashSet<u64>>,
    pub block_requests: Mutex<Vec<u64>>,
}

impl FakeLedger {
    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn add_block(&self, height: u64, transactions: Vec<Transaction>) {
        self.blocks.lock().unwrap().insert(
            height,
            Block {
                hash: format!("hash{height}"),
                height,
                transactions,
            },
        );
    }

    pub fn add_transaction(&self, tx: Transaction) {
        self.transactions.lock().unwrap().insert(tx.txid.clone(), tx);
    }

    pub fn fail_block(&self, height: u64) {
        self.failing_blocks.lock().unwrap().insert(height);
    }

    pub fn heal_block(&self, height: u64) {
        self.failing_blocks.lock().unwrap().remove(&height);
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn get_height(&self) -> LedgerResult<u64> {
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn get_block(&self, height: u64) -> LedgerResult<Block> {
        self.block_requests.lock().unwrap().push(height);
        if self.failing_blocks.lock().unwrap().contains(&height) {
            return Err(LedgerError::Rpc(format!("injected failure at {height}")));
        }
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .unwrap_or(Block {
                hash: format!("hash{height}"),
                height,
                transactions: Vec::new(),
            }))
    }

    async fn get_raw_transaction(&self, txid: &str) -> LedgerResult<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .get(txid)
            .cloned()
            .ok_or_else(|| LedgerError::Node {
                code: -5,
                message: "No such mempool or blockchain transaction".into(),
            })
    }
}

/// Content store backed by a map.
#[derive(Default)]
pub struct FakeContentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeContentStore {
    pub fn put(&self, reference: &str, body: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(reference.to_string(), body.as_bytes().to_vec());
    }
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ContentError> {
        self.objects
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| ContentError::Unavailable(reference.to_string()))
    }
}

/// DNS transport that records every update.
#[derive(Default)]
pub struct RecordingTransport {
    pub updates: Mutex<Vec<ZoneUpdateRequest>>,
    pub reject: Mutex<bool>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<ZoneUpdateRequest> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsTransport for RecordingTransport {
    async fn send_update(&self, request: &ZoneUpdateRequest) -> Result<(), UpdateError> {
        if *self.reject.lock().unwrap() {
            return Err(UpdateError::Rejected("REFUSED".into()));
        }
        self.updates.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// A wired poller and handles to its fakes.
pub struct Harness {
    pub ledger: Arc<FakeLedger>,
    pub content: Arc<FakeContentStore>,
    pub transport: Arc<RecordingTransport>,
    pub poller: ChainPoller,
}

pub fn harness(config: WatcherConfig) -> Harness {
    let ledger = Arc::new(FakeLedger::default());
    let content = Arc::new(FakeContentStore::default());
    let transport = Arc::new(RecordingTransport::default());

    let poller = ChainPoller::new(
        ledger.clone(),
        Classifier::new("SATORI", rust_decimal::Decimal::ONE),
        RecordResolver::new(content.clone()),
        ZoneUpdater::new(transport.clone(), ZONE),
        config,
    );

    Harness {
        ledger,
        content,
        transport,
        poller,
    }
}

pub fn tx(value: Value) -> Transaction {
    serde_json::from_value(value).unwrap()
}

/// A prior transaction paying `address` at output 0.
pub fn funding_tx(txid: &str, address: &str) -> Transaction {
    tx(json!({
        "txid": txid,
        "vin": [{ "coinbase": "00" }],
        "vout": [{ "value": 10.0, "n": 0, "scriptPubKey": { "type": "pubkeyhash", "addresses": [address] } }]
    }))
}

/// A transfer of `amount` SATORI to `to`, funded by `funding`:0.
pub fn satori_transfer(txid: &str, funding: &str, to: &str, amount: Value, marker: Option<&str>) -> Transaction {
    tx(json!({
        "txid": txid,
        "vin": [{ "txid": funding, "vout": 0 }],
        "vout": [{
            "value": 0,
            "n": 0,
            "scriptPubKey": {
                "type": "transfer_asset",
                "addresses": [to],
                "asset": { "name": "SATORI", "amount": amount }
            }
        }],
        "ipfs_op_return": marker,
    }))
}
