//! Record resolution: content reference → DNS record descriptor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{ContentError, ContentStore};

/// A DNS record as published in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordDescriptor {
    /// Record type, e.g. `A` or `TXT`.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Presentation-format record data.
    pub data: String,
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("content fetch failed: {0}")]
    Fetch(#[from] ContentError),

    #[error("malformed record payload: {0}")]
    Malformed(String),
}

/// Fetches and parses record descriptors.
#[derive(Clone)]
pub struct RecordResolver {
    store: Arc<dyn ContentStore>,
}

impl RecordResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, reference: &str) -> Result<DnsRecordDescriptor, ResolutionError> {
        let payload = self.store.fetch(reference).await?;
        serde_json::from_slice(&payload).map_err(|e| ResolutionError::Malformed(e.to_string()))
    }
}
