//! Squawker protocol recognition.
//!
//! # Data Flow
//! ```text
//! Transaction (from a block)
//!     → classifier.rs (marker transfer, self-transfer, input resolution)
//!     → extract.rs (ordered content-reference strategies)
//!     → ProtocolMessage { sender, reference }
//! ```
//!
//! A transaction is a protocol message when its funder sends themselves exactly
//! the configured amount of the marker asset and attaches an IPFS reference.

pub mod classifier;
pub mod extract;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ledger::{Ledger, LedgerError, LedgerResult, OutPoint, TxOutput};

pub use classifier::{ClassificationMismatch, Classifier};
pub use extract::{extract_reference, ReferenceStrategy, DEFAULT_STRATEGIES};

/// A recognised protocol message, consumed immediately by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    /// Transaction that carried the message.
    pub txid: String,
    /// Address funding the transaction's first input.
    pub sender: String,
    /// Content-store reference of the record payload.
    pub reference: String,
}

/// Maps an outpoint to the output it spends.
#[async_trait]
pub trait InputResolver: Send + Sync {
    async fn resolve_input(&self, outpoint: &OutPoint) -> LedgerResult<TxOutput>;
}

#[async_trait]
impl<L: Ledger + ?Sized> InputResolver for L {
    async fn resolve_input(&self, outpoint: &OutPoint) -> LedgerResult<TxOutput> {
        let prev = self.get_raw_transaction(&outpoint.txid).await?;
        // Outputs are listed in index order; `n` is checked in case a node doesn't.
        let index = outpoint.index as usize;
        let output = match prev.outputs.get(index) {
            Some(out) if out.n == outpoint.index => Some(out.clone()),
            _ => prev.outputs.iter().find(|out| out.n == outpoint.index).cloned(),
        };
        output.ok_or_else(|| LedgerError::MissingOutput {
            txid: outpoint.txid.clone(),
            index: outpoint.index,
        })
    }
}
