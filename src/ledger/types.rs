//! Verbose ledger types and error definitions.
//!
//! These mirror the JSON returned by `getblock <hash> 2` and
//! `getrawtransaction <txid> 1` on Evermore/Ravencoin-family nodes. Only the
//! fields the watcher reads are modelled; everything else is ignored.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// Re-export LedgerConfig from config module to avoid duplication
pub use crate::config::schema::LedgerConfig;

/// A block with full transaction bodies.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Block {
    /// Block hash.
    #[serde(default)]
    pub hash: String,
    /// Block height.
    pub height: u64,
    /// Transactions in block order.
    #[serde(rename = "tx", default)]
    pub transactions: Vec<Transaction>,
}

/// A verbose transaction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transaction {
    pub txid: String,
    #[serde(rename = "vin", default)]
    pub inputs: Vec<TxInput>,
    #[serde(rename = "vout", default)]
    pub outputs: Vec<TxOutput>,
    /// Dedicated content-store marker attached by Squawker-aware nodes.
    #[serde(rename = "ipfs_op_return", default, skip_serializing_if = "Option::is_none")]
    pub content_marker: Option<String>,
}

/// Reference to a previous transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: String,
    pub index: u32,
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// Transaction input. Coinbase inputs carry no outpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TxInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<String>,
}

impl TxInput {
    /// The output this input spends, if any.
    pub fn outpoint(&self) -> Option<OutPoint> {
        match (&self.txid, self.vout) {
            (Some(txid), Some(index)) => Some(OutPoint {
                txid: txid.clone(),
                index,
            }),
            _ => None,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.coinbase.is_some()
    }
}

/// Transaction output.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TxOutput {
    #[serde(default)]
    pub n: u32,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: ScriptPubKey,
    /// Asset annotation as emitted by some node builds at output level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetInfo>,
}

/// Locking script summary.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub asm: String,
    #[serde(default)]
    pub hex: String,
    #[serde(rename = "type", default)]
    pub script_type: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Asset annotation as emitted by stock Ravencoin nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetInfo>,
}

/// Raw asset annotation on an output.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetInfo {
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

/// Asset transfer view over an output.
#[derive(Debug, Clone, Copy)]
pub struct AssetTransfer<'a> {
    pub name: &'a str,
    pub amount: Decimal,
    pub addresses: &'a [String],
}

impl TxOutput {
    /// Destination addresses of this output.
    pub fn addresses(&self) -> &[String] {
        &self.script_pub_key.addresses
    }

    /// The asset transfer carried by this output, if any.
    pub fn asset_transfer(&self) -> Option<AssetTransfer<'_>> {
        let info = self
            .asset
            .as_ref()
            .or(self.script_pub_key.asset.as_ref())?;
        Some(AssetTransfer {
            name: &info.name,
            amount: info.amount,
            addresses: self.addresses(),
        })
    }

    /// Data pushed by an `OP_RETURN` output, hex-decoded.
    pub fn op_return_payload(&self) -> Option<Vec<u8>> {
        let mut parts = self.script_pub_key.asm.split_whitespace();
        if parts.next()? != "OP_RETURN" {
            return None;
        }
        hex::decode(parts.next()?).ok()
    }
}

/// Amounts are parsed from their JSON text so that `1.0` stays exactly one.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(serde_json::Number),
        Text(String),
    }

    let text = match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => n.to_string(),
        RawAmount::Text(s) => s,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(serde::de::Error::custom)
}

/// Errors that can occur while talking to the ledger node.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transport-level failure on every configured endpoint.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    /// Response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Referenced output index does not exist on the prior transaction.
    #[error("transaction {txid} has no output {index}")]
    MissingOutput { txid: String, index: u32 },
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
