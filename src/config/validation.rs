//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, amount > 0)
//! - Check that addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Parse a DNS server address, defaulting the port to 53.
pub fn parse_dns_server(server: &str) -> Option<SocketAddr> {
    server
        .parse::<SocketAddr>()
        .ok()
        .or_else(|| format!("{}:53", server).parse().ok())
        .or_else(|| format!("[{}]:53", server).parse().ok())
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if Url::parse(&config.ledger.rpc_url).is_err() {
        errors.push(ValidationError::new(
            "ledger.rpc_url",
            format!("invalid URL '{}'", config.ledger.rpc_url),
        ));
    }
    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be > 0"));
    }

    if config.content.api_urls.is_empty() {
        errors.push(ValidationError::new("content.api_urls", "at least one endpoint required"));
    }
    for url in &config.content.api_urls {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::new("content.api_urls", format!("invalid URL '{}'", url)));
        }
    }
    if config.content.timeout_secs == 0 {
        errors.push(ValidationError::new("content.timeout_secs", "must be > 0"));
    }

    if config.dns.zone_name.trim_end_matches('.').is_empty() {
        errors.push(ValidationError::new("dns.zone_name", "must not be empty"));
    }
    if parse_dns_server(&config.dns.server).is_none() {
        errors.push(ValidationError::new(
            "dns.server",
            format!("invalid address '{}'", config.dns.server),
        ));
    }
    if config.dns.timeout_secs == 0 {
        errors.push(ValidationError::new("dns.timeout_secs", "must be > 0"));
    }

    if config.protocol.asset_name.is_empty() {
        errors.push(ValidationError::new("protocol.asset_name", "must not be empty"));
    }
    if config.protocol.amount <= Decimal::ZERO {
        errors.push(ValidationError::new("protocol.amount", "must be positive"));
    }

    if config.watcher.poll_interval_secs == 0 {
        errors.push(ValidationError::new("watcher.poll_interval_secs", "must be > 0"));
    }
    if config.watcher.max_backoff_secs < config.watcher.poll_interval_secs {
        errors.push(ValidationError::new(
            "watcher.max_backoff_secs",
            "must be >= poll_interval_secs",
        ));
    }
    if config.watcher.max_blocks_per_cycle == 0 {
        errors.push(ValidationError::new("watcher.max_blocks_per_cycle", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
