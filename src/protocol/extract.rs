//! Content-reference extraction.
//!
//! Each strategy is a pure function over a transaction. They are tried in
//! order and the first hit wins, so the dedicated marker field always beats
//! heuristic `OP_RETURN` scanning.

use crate::ledger::Transaction;

/// Prefix that tags an IPFS reference inside marker data.
pub const REFERENCE_PREFIX: &str = "ipfs:";

/// Length of a base58 CIDv0 identifier.
pub const CID_V0_LEN: usize = 46;

/// Leading characters of every CIDv0 identifier.
pub const CID_V0_PREFIX: &str = "Qm";

/// A named extraction strategy.
pub type ReferenceStrategy = (&'static str, fn(&Transaction) -> Option<String>);

/// Strategies in priority order.
pub const DEFAULT_STRATEGIES: &[ReferenceStrategy] = &[
    ("marker_field", from_marker_field),
    ("op_return_prefixed", from_prefixed_data),
    ("op_return_identifier", from_bare_identifier),
];

/// Run `strategies` in order, returning the winning strategy name and reference.
pub fn extract_reference(
    tx: &Transaction,
    strategies: &[ReferenceStrategy],
) -> Option<(&'static str, String)> {
    strategies
        .iter()
        .find_map(|(name, strategy)| strategy(tx).map(|reference| (*name, reference)))
}

/// The `ipfs_op_return` field, with the optional prefix removed.
pub fn from_marker_field(tx: &Transaction) -> Option<String> {
    let raw = tx.content_marker.as_deref()?.trim();
    let reference = raw.strip_prefix(REFERENCE_PREFIX).unwrap_or(raw);
    (!reference.is_empty()).then(|| reference.to_string())
}

/// First `OP_RETURN` payload of the form `ipfs:<reference>`.
pub fn from_prefixed_data(tx: &Transaction) -> Option<String> {
    op_return_texts(tx).find_map(|text| {
        text.strip_prefix(REFERENCE_PREFIX)
            .filter(|reference| !reference.is_empty())
            .map(str::to_string)
    })
}

/// First `OP_RETURN` payload that is a bare CIDv0.
pub fn from_bare_identifier(tx: &Transaction) -> Option<String> {
    op_return_texts(tx).find(|text| is_cid_v0(text))
}

pub fn is_cid_v0(text: &str) -> bool {
    text.len() == CID_V0_LEN
        && text.starts_with(CID_V0_PREFIX)
        && text.chars().all(|c| c.is_ascii_alphanumeric())
}

/// UTF-8 payloads of all data-carrier outputs; undecodable ones are skipped.
fn op_return_texts(tx: &Transaction) -> impl Iterator<Item = String> + '_ {
    tx.outputs
        .iter()
        .filter_map(|out| out.op_return_payload())
        .filter_map(|bytes| String::from_utf8(bytes).ok())
}
