//! Content-store subsystem.
//!
//! # Data Flow
//! ```text
//! ProtocolMessage.reference
//!     → client.rs (IPFS HTTP API, endpoint failover)
//!     → resolver.rs (JSON → DnsRecordDescriptor)
//!     → zone updater
//! ```

pub mod client;
pub mod resolver;

use async_trait::async_trait;
use thiserror::Error;

pub use client::IpfsClient;
pub use resolver::{DnsRecordDescriptor, RecordResolver, ResolutionError};

/// Errors raised while fetching content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("content store returned status {0}")]
    Status(u16),

    #[error("content fetch timed out after {0} seconds")]
    Timeout(u64),

    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("all content endpoints failed for {0}")]
    Unavailable(String),

    #[error("invalid content store configuration: {0}")]
    Config(String),
}

/// Fetches raw bytes by content reference.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ContentError>;
}
