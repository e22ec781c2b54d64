//! Chain poller: the top-level control loop.
//!
//! # Cycle
//! ```text
//! get_height → target = height - confirmations
//!     → for each selected height above the cursor:
//!         get_block → per transaction: classify → resolve → apply
//!         → cursor.advance(height)
//!     → sleep(poll_interval) or, after a failure, sleep(backoff)
//! ```
//!
//! # Failure model
//! - Transaction errors are logged and skipped; siblings still run
//! - Block retrieval errors end the cycle; the cursor stays on the last
//!   completed block and the same block is retried next cycle

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::sleep;

use crate::config::{BlockSelection, WatcherConfig};
use crate::content::{RecordResolver, ResolutionError};
use crate::ledger::{Ledger, LedgerError, Transaction};
use crate::observability::metrics;
use crate::protocol::Classifier;
use crate::resilience::calculate_backoff;
use crate::watcher::cursor::WatcherCursor;
use crate::zone::{UpdateError, ZoneUpdateRequest, ZoneUpdater};

/// Failure of a single protocol transaction after it was recognised.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Outcome of processing one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub height: u64,
    /// Transactions examined.
    pub scanned: usize,
    /// Protocol messages recognised.
    pub matched: usize,
    /// Zone updates accepted.
    pub updated: usize,
    /// Protocol messages that failed to resolve or apply.
    pub failed: usize,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First cycle; the cursor was placed at this height.
    Initialized(u64),
    /// No new blocks past the cursor.
    Idle,
    /// Blocks processed, in order.
    Processed(Vec<BlockReport>),
}

/// Drives block retrieval, classification and zone updates.
pub struct ChainPoller {
    ledger: Arc<dyn Ledger>,
    classifier: Classifier,
    resolver: RecordResolver,
    updater: ZoneUpdater,
    config: WatcherConfig,
    cursor: WatcherCursor,
}

impl ChainPoller {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        classifier: Classifier,
        resolver: RecordResolver,
        updater: ZoneUpdater,
        config: WatcherConfig,
    ) -> Self {
        Self {
            ledger,
            classifier,
            resolver,
            updater,
            config,
            cursor: WatcherCursor::in_memory(),
        }
    }

    pub fn with_cursor(mut self, cursor: WatcherCursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Last fully processed height.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor.position()
    }

    /// Run until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let max_backoff = Duration::from_secs(self.config.max_backoff_secs);
        let mut failures: u32 = 0;

        tracing::info!(
            zone = %self.updater.zone_name(),
            interval_secs = self.config.poll_interval_secs,
            selection = ?self.config.block_selection,
            "Starting chain watcher"
        );

        loop {
            let delay = match self.poll_once().await {
                Ok(_) => {
                    failures = 0;
                    interval
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    metrics::record_poll_failure();
                    let delay = calculate_backoff(failures, interval, max_backoff);
                    tracing::error!(
                        error = %e,
                        cursor = ?self.cursor.position(),
                        consecutive_failures = failures,
                        retry_in_secs = delay.as_secs(),
                        "Error processing blocks"
                    );
                    delay
                }
            };

            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!(cursor = ?self.cursor.position(), "Chain watcher received shutdown signal, exiting loop");
                    return;
                }
            }
        }
    }

    /// One poll cycle.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, LedgerError> {
        let tip = self.ledger.get_height().await?;
        let target = tip.saturating_sub(self.config.confirmations);

        let last = match self.cursor.position() {
            Some(last) => last,
            None => {
                let start = self
                    .config
                    .start_height
                    .map(|h| h.saturating_sub(1))
                    .unwrap_or(target);
                self.cursor.advance(start);
                tracing::info!(tip, cursor = start, "Initialized chain watcher cursor");
                return Ok(CycleOutcome::Initialized(start));
            }
        };

        if target <= last {
            return Ok(CycleOutcome::Idle);
        }

        let heights: Vec<u64> = match self.config.block_selection {
            BlockSelection::Latest => {
                if target - last > 1 {
                    tracing::warn!(skipped = target - last - 1, target, "Skipping intermediate blocks");
                }
                vec![target]
            }
            BlockSelection::Range => {
                let end = target.min(last.saturating_add(self.config.max_blocks_per_cycle));
                if end < target {
                    tracing::info!(behind = target - last, batch = end - last, "Catching up");
                }
                (last + 1..=end).collect()
            }
        };

        let mut reports = Vec::with_capacity(heights.len());
        for height in heights {
            let report = self.process_block(height).await?;
            self.cursor.advance(height);
            reports.push(report);
        }
        Ok(CycleOutcome::Processed(reports))
    }

    /// Process every transaction in the block at `height`.
    ///
    /// Only block retrieval can fail; transaction errors are logged and counted.
    pub async fn process_block(&self, height: u64) -> Result<BlockReport, LedgerError> {
        let block = self.ledger.get_block(height).await?;
        let mut report = BlockReport {
            height,
            scanned: block.transactions.len(),
            ..Default::default()
        };

        for tx in &block.transactions {
            match self.process_transaction(tx).await {
                Ok(None) => {}
                Ok(Some(_)) => {
                    report.matched += 1;
                    report.updated += 1;
                }
                Err(e) => {
                    report.matched += 1;
                    report.failed += 1;
                    tracing::error!(txid = %tx.txid, height, error = %e, "Error processing transaction");
                }
            }
        }

        metrics::record_block_processed(height, report.scanned);
        tracing::debug!(
            height,
            hash = %block.hash,
            scanned = report.scanned,
            matched = report.matched,
            failed = report.failed,
            "Processed block"
        );
        Ok(report)
    }

    /// Classify one transaction and, if it is a protocol message, publish it.
    pub async fn process_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Option<ZoneUpdateRequest>, TransactionError> {
        let message = match self.classifier.classify(tx, self.ledger.as_ref()).await {
            Ok(message) => message,
            Err(mismatch) if mismatch.is_retrieval_failure() => {
                tracing::warn!(txid = %tx.txid, reason = %mismatch, "Could not classify transaction");
                return Ok(None);
            }
            Err(mismatch) => {
                tracing::trace!(txid = %tx.txid, reason = %mismatch, "Not a protocol message");
                return Ok(None);
            }
        };

        metrics::record_protocol_message();
        tracing::info!(
            txid = %message.txid,
            sender = %message.sender,
            reference = %message.reference,
            "Protocol message found"
        );

        let descriptor = self.resolver.resolve(&message.reference).await?;
        let request = self.updater.apply(&descriptor, &message.sender).await?;
        Ok(Some(request))
    }
}
