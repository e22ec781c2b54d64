//! Transaction classification.
//!
//! # Rules
//! A transaction is a protocol message only when all of these hold:
//! 1. it has inputs and outputs
//! 2. every input resolves to a prior output (the union of their addresses is
//!    the sender set)
//! 3. some output transfers exactly `amount` of `asset_name`
//! 4. that output pays back into the sender set (self-transfer)
//! 5. a content reference can be extracted
//!
//! Cheap local checks (1, 3, 5) run before the RPC-backed ones (2, 4).

use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::ProtocolConfig;
use crate::ledger::{LedgerError, Transaction, TxOutput};
use crate::protocol::extract::{extract_reference, ReferenceStrategy, DEFAULT_STRATEGIES};
use crate::protocol::{InputResolver, ProtocolMessage};

/// Why a transaction is not a protocol message.
#[derive(Debug, Error)]
pub enum ClassificationMismatch {
    #[error("transaction has no inputs")]
    NoInputs,

    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("coinbase transaction")]
    Coinbase,

    #[error("no transfer of exactly {amount} {asset}")]
    NoMarkerTransfer { asset: String, amount: Decimal },

    #[error("marker transfer is not a self-transfer")]
    NotSelfTransfer,

    #[error("no content reference found")]
    NoContentReference,

    #[error("could not resolve input {outpoint}: {source}")]
    UnresolvableInput {
        outpoint: String,
        #[source]
        source: LedgerError,
    },

    #[error("no input carries a sender address")]
    NoSenderAddress,
}

impl ClassificationMismatch {
    /// Mismatches caused by ledger retrieval rather than transaction content.
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(self, Self::UnresolvableInput { .. })
    }
}

/// Decides whether a transaction is a Squawker protocol message.
#[derive(Debug, Clone)]
pub struct Classifier {
    asset_name: String,
    amount: Decimal,
    strategies: &'static [ReferenceStrategy],
}

impl Classifier {
    pub fn new(asset_name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            asset_name: asset_name.into(),
            amount,
            strategies: DEFAULT_STRATEGIES,
        }
    }

    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self::new(config.asset_name.clone(), config.amount)
    }

    /// Replace the reference extraction strategies.
    pub fn with_strategies(mut self, strategies: &'static [ReferenceStrategy]) -> Self {
        self.strategies = strategies;
        self
    }

    /// Classify `tx`, resolving its inputs through `inputs`.
    pub async fn classify<R>(
        &self,
        tx: &Transaction,
        inputs: &R,
    ) -> Result<ProtocolMessage, ClassificationMismatch>
    where
        R: InputResolver + ?Sized,
    {
        if tx.inputs.is_empty() {
            return Err(ClassificationMismatch::NoInputs);
        }
        if tx.outputs.is_empty() {
            return Err(ClassificationMismatch::NoOutputs);
        }
        if tx.inputs.iter().any(|input| input.is_coinbase()) {
            return Err(ClassificationMismatch::Coinbase);
        }

        let marker_outputs: Vec<&TxOutput> = tx
            .outputs
            .iter()
            .filter(|out| self.is_marker_transfer(out))
            .collect();
        if marker_outputs.is_empty() {
            return Err(ClassificationMismatch::NoMarkerTransfer {
                asset: self.asset_name.clone(),
                amount: self.amount,
            });
        }

        let (strategy, reference) = extract_reference(tx, self.strategies)
            .ok_or(ClassificationMismatch::NoContentReference)?;

        let funding = self.resolve_funding(tx, inputs).await?;
        let senders: HashSet<&str> = funding
            .iter()
            .flat_map(|out| out.addresses())
            .map(String::as_str)
            .collect();

        let self_transfer = marker_outputs
            .iter()
            .any(|out| out.addresses().iter().any(|addr| senders.contains(addr.as_str())));
        if !self_transfer {
            return Err(ClassificationMismatch::NotSelfTransfer);
        }

        let sender = funding
            .iter()
            .find_map(|out| out.addresses().first())
            .cloned()
            .ok_or(ClassificationMismatch::NoSenderAddress)?;

        tracing::debug!(txid = %tx.txid, %sender, strategy, %reference, "protocol message recognised");

        Ok(ProtocolMessage {
            txid: tx.txid.clone(),
            sender,
            reference,
        })
    }

    fn is_marker_transfer(&self, out: &TxOutput) -> bool {
        out.asset_transfer()
            .map(|t| t.name == self.asset_name && t.amount == self.amount)
            .unwrap_or(false)
    }

    /// Prior outputs spent by `tx`, in input order.
    async fn resolve_funding<R>(
        &self,
        tx: &Transaction,
        inputs: &R,
    ) -> Result<Vec<TxOutput>, ClassificationMismatch>
    where
        R: InputResolver + ?Sized,
    {
        let mut funding = Vec::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            let outpoint = input.outpoint().ok_or(ClassificationMismatch::Coinbase)?;
            let output = inputs.resolve_input(&outpoint).await.map_err(|source| {
                ClassificationMismatch::UnresolvableInput {
                    outpoint: outpoint.to_string(),
                    source,
                }
            })?;
            funding.push(output);
        }
        Ok(funding)
    }
}
