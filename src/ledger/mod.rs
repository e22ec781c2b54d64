//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration (RPC URL, credentials)
//!     → client.rs (JSON-RPC with timeouts and failover)
//!     → types.rs (verbose blocks and transactions)
//!     → watcher / protocol (height, blocks, prior outputs)
//! ```
//!
//! # Security Constraints
//! - Never log RPC credentials
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::RpcLedgerClient;
pub use types::{Block, LedgerError, LedgerResult, OutPoint, Transaction, TxInput, TxOutput};

/// Read access to the chain.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Height of the current chain tip.
    async fn get_height(&self) -> LedgerResult<u64>;

    /// Block at `height` with full transaction bodies.
    async fn get_block(&self, height: u64) -> LedgerResult<Block>;

    /// A confirmed or mempool transaction by id.
    async fn get_raw_transaction(&self, txid: &str) -> LedgerResult<Transaction>;
}
