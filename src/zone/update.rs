//! Zone updater: turns a resolved record into an additive zone change.

use std::sync::Arc;

use crate::content::DnsRecordDescriptor;
use crate::observability::metrics;
use crate::zone::{DnsTransport, UpdateError, ZoneUpdateRequest, RECORD_TTL, SUBDOMAIN_LABEL};

/// Maximum length of a single DNS label.
const MAX_LABEL_LEN: usize = 63;

impl ZoneUpdateRequest {
    /// Build the request publishing `descriptor` under `<sender>.evr.<zone>`.
    pub fn new(descriptor: &DnsRecordDescriptor, sender: &str, zone: &str) -> Self {
        let zone = zone.trim_end_matches('.');
        let subdomain = format!("{}.{}", sender, SUBDOMAIN_LABEL);
        let fqdn = format!("{}.{}", subdomain, zone);
        Self {
            zone: zone.to_string(),
            subdomain,
            fqdn,
            ttl: RECORD_TTL,
            record_type: descriptor.record_type.to_ascii_uppercase(),
            data: descriptor.data.clone(),
        }
    }
}

/// Publishes resolved records into the configured zone.
#[derive(Clone)]
pub struct ZoneUpdater {
    transport: Arc<dyn DnsTransport>,
    zone_name: String,
}

impl ZoneUpdater {
    pub fn new(transport: Arc<dyn DnsTransport>, zone_name: impl Into<String>) -> Self {
        Self {
            transport,
            zone_name: zone_name.into(),
        }
    }

    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Append `descriptor` to the RRset of `<sender>.evr.<zone>`.
    ///
    /// Applying the same descriptor twice sends two updates; the server keeps
    /// whatever the RRset semantics of the record type allow.
    pub async fn apply(
        &self,
        descriptor: &DnsRecordDescriptor,
        sender: &str,
    ) -> Result<ZoneUpdateRequest, UpdateError> {
        validate_label(sender)?;
        let request = ZoneUpdateRequest::new(descriptor, sender, &self.zone_name);

        match self.transport.send_update(&request).await {
            Ok(()) => {
                metrics::record_zone_update(true);
                tracing::info!(
                    fqdn = %request.fqdn,
                    record_type = %request.record_type,
                    data = %request.data,
                    "Added zone record"
                );
                Ok(request)
            }
            Err(e) => {
                metrics::record_zone_update(false);
                tracing::error!(fqdn = %request.fqdn, error = %e, "Failed to update zone");
                Err(e)
            }
        }
    }
}

/// Sender addresses become a DNS label verbatim, so they must be one.
fn validate_label(label: &str) -> Result<(), UpdateError> {
    let reason = if label.is_empty() {
        Some("empty label")
    } else if label.len() > MAX_LABEL_LEN {
        Some("label longer than 63 bytes")
    } else if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Some("label contains characters outside [A-Za-z0-9-]")
    } else if label.starts_with('-') || label.ends_with('-') {
        Some("label starts or ends with a hyphen")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(UpdateError::InvalidName {
            name: label.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
