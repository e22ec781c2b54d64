//! Zone synchronisation subsystem.
//!
//! # Data Flow
//! ```text
//! DnsRecordDescriptor + sender address
//!     → update.rs (ZoneUpdateRequest: <sender>.evr.<zone>, TTL 300)
//!     → rdata.rs (presentation data → wire RData)
//!     → transport.rs (RFC 2136 UPDATE over TCP)
//!     → authoritative nameserver
//! ```
//!
//! # Design Decisions
//! - Updates are additive: each publication appends to the RRset, nothing is
//!   deleted, so repeated publications accumulate records
//! - No prerequisites are sent; the server decides whether the zone accepts it

pub mod rdata;
pub mod transport;
pub mod update;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use transport::TcpUpdateTransport;
pub use update::ZoneUpdater;

/// Label inserted between the sender address and the zone apex.
pub const SUBDOMAIN_LABEL: &str = "evr";

/// TTL of every published record, in seconds.
pub const RECORD_TTL: u32 = 300;

/// A single additive zone change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneUpdateRequest {
    /// Zone apex the update is addressed to.
    pub zone: String,
    /// `<sender>.evr`, relative to the zone.
    pub subdomain: String,
    /// `<subdomain>.<zone>`.
    pub fqdn: String,
    pub ttl: u32,
    pub record_type: String,
    pub data: String,
}

/// Errors raised while building or sending a zone update.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("invalid DNS name {name}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("unsupported record type {0}")]
    UnsupportedRecordType(String),

    #[error("invalid {record_type} data {data:?}: {reason}")]
    InvalidData {
        record_type: String,
        data: String,
        reason: String,
    },

    #[error("message encoding failed: {0}")]
    Encode(String),

    #[error("I/O error talking to DNS server: {0}")]
    Io(#[from] std::io::Error),

    #[error("DNS update timed out after {0} seconds")]
    Timeout(u64),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("DNS server rejected update: {0}")]
    Rejected(String),
}

/// Delivers zone updates to the nameserver.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send_update(&self, request: &ZoneUpdateRequest) -> Result<(), UpdateError>;
}
