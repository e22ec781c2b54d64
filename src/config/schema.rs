//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Ledger node RPC settings.
    pub ledger: LedgerConfig,

    /// Content store (IPFS) settings.
    pub content: ContentConfig,

    /// Authoritative DNS server settings.
    pub dns: DnsConfig,

    /// Protocol marker constants.
    pub protocol: ProtocolConfig,

    /// Polling loop settings.
    pub watcher: WatcherConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger JSON-RPC configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// RPC basic-auth user.
    pub rpc_user: String,

    /// RPC basic-auth password.
    pub rpc_password: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

/// Default Evermore RPC port.
pub const DEFAULT_RPC_PORT: u16 = 9766;

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: format!("http://127.0.0.1:{}", DEFAULT_RPC_PORT),
            failover_urls: Vec::new(),
            rpc_user: String::new(),
            rpc_password: String::new(),
            rpc_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("failover_urls", &self.failover_urls)
            .field("rpc_user", &self.rpc_user)
            .field("rpc_password", &"<redacted>")
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .finish()
    }
}

/// IPFS content store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// IPFS HTTP API base URLs, tried in order.
    pub api_urls: Vec<String>,

    /// Per-endpoint fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Largest record payload accepted.
    pub max_payload_bytes: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_urls: vec![
                "http://127.0.0.1:5001".to_string(),
                "http://squawker.app:8080".to_string(),
            ],
            timeout_secs: 30,
            max_payload_bytes: 64 * 1024,
        }
    }
}

/// Authoritative DNS server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Server address; port 53 is assumed when omitted.
    pub server: String,

    /// Zone receiving `<sender>.evr` records.
    pub zone_name: String,

    /// Update exchange timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:53".to_string(),
            zone_name: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Squawker protocol constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Marker asset name.
    pub asset_name: String,

    /// Exact marker amount.
    pub amount: Decimal,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            asset_name: "SATORI".to_string(),
            amount: Decimal::ONE,
        }
    }
}

/// Which blocks a cycle processes once the tip moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockSelection {
    /// Every block after the cursor, up to the target.
    #[default]
    Range,
    /// Only the target block; intermediate blocks are skipped.
    Latest,
}

/// Polling loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Delay between cycles in seconds.
    pub poll_interval_secs: u64,

    /// Upper bound for the retry delay after failed cycles, in seconds.
    pub max_backoff_secs: u64,

    /// Blocks to stay behind the tip.
    pub confirmations: u64,

    pub block_selection: BlockSelection,

    /// Cap on blocks processed in one cycle (range mode).
    pub max_blocks_per_cycle: u64,

    /// First height to process when no cursor exists; defaults to the tip.
    pub start_height: Option<u64>,

    /// File mirroring the cursor across restarts.
    pub cursor_path: Option<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_backoff_secs: 300,
            confirmations: 0,
            block_selection: BlockSelection::Range,
            max_blocks_per_cycle: 100,
            start_height: None,
            cursor_path: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.ledger.rpc_url, "http://127.0.0.1:9766");
        assert_eq!(config.watcher.poll_interval_secs, 10);
        assert_eq!(config.watcher.block_selection, BlockSelection::Range);
        assert_eq!(config.protocol.asset_name, "SATORI");
        assert_eq!(config.protocol.amount, Decimal::ONE);
        assert!(config.watcher.cursor_path.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [dns]
            zone_name = "example.com"

            [protocol]
            amount = "1.5"

            [watcher]
            block_selection = "latest"
            "#,
        )
        .unwrap();
        assert_eq!(config.dns.zone_name, "example.com");
        assert_eq!(config.dns.server, "127.0.0.1:53");
        assert_eq!(config.protocol.amount.to_string(), "1.5");
        assert_eq!(config.watcher.block_selection, BlockSelection::Latest);
    }

    #[test]
    fn test_password_is_redacted() {
        let mut ledger = LedgerConfig::default();
        ledger.rpc_password = "hunter2".into();
        assert!(!format!("{:?}", ledger).contains("hunter2"));
    }
}
