//! Startup orchestration.
//!
//! # Responsibilities
//! - Build collaborators (ledger, content store, DNS transport) from config
//! - Wire them into the classifier, resolver, updater and poller
//! - Restore the cursor when persistence is configured
//!
//! # Design Decisions
//! - Fail fast: any construction error is fatal
//! - Connectivity problems are not: the poller retries with backoff

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::validation::parse_dns_server;
use crate::config::BridgeConfig;
use crate::content::{ContentError, IpfsClient, RecordResolver};
use crate::ledger::{Ledger, LedgerError, RpcLedgerClient};
use crate::protocol::Classifier;
use crate::watcher::{ChainPoller, FileCursorStore, WatcherCursor};
use crate::zone::{TcpUpdateTransport, ZoneUpdater};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("ledger client: {0}")]
    Ledger(#[from] LedgerError),

    #[error("content client: {0}")]
    Content(#[from] ContentError),

    #[error("invalid DNS server address '{0}'")]
    DnsServer(String),

    #[error("cursor file: {0}")]
    Cursor(#[from] std::io::Error),
}

/// Build a ready-to-run poller from validated configuration.
pub fn build_poller(config: &BridgeConfig) -> Result<ChainPoller, StartupError> {
    let ledger: Arc<dyn Ledger> = Arc::new(RpcLedgerClient::new(config.ledger.clone())?);
    let content = Arc::new(IpfsClient::new(&config.content)?);

    let server = parse_dns_server(&config.dns.server)
        .ok_or_else(|| StartupError::DnsServer(config.dns.server.clone()))?;
    let transport = Arc::new(TcpUpdateTransport::new(
        server,
        Duration::from_secs(config.dns.timeout_secs),
    ));

    let cursor = match &config.watcher.cursor_path {
        Some(path) => WatcherCursor::persistent(FileCursorStore::new(path))?,
        None => WatcherCursor::in_memory(),
    };

    tracing::info!(
        rpc_url = %config.ledger.rpc_url,
        dns_server = %server,
        zone = %config.dns.zone_name,
        asset = %config.protocol.asset_name,
        amount = %config.protocol.amount,
        cursor = ?cursor.position(),
        "Watcher configured"
    );

    Ok(ChainPoller::new(
        ledger,
        Classifier::from_config(&config.protocol),
        RecordResolver::new(content),
        ZoneUpdater::new(transport, config.dns.zone_name.clone()),
        config.watcher.clone(),
    )
    .with_cursor(cursor))
}

/// Log whether the ledger is reachable; never fails.
pub async fn check_ledger(ledger: &dyn Ledger) -> bool {
    match ledger.get_height().await {
        Ok(height) => {
            tracing::info!(height, "Connected to ledger RPC");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ledger RPC unreachable; will keep retrying");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.dns.zone_name = "example.com".into();
        config
    }

    #[test]
    fn test_build_poller_defaults() {
        let poller = build_poller(&config()).unwrap();
        assert_eq!(poller.cursor(), None);
    }

    #[test]
    fn test_build_poller_restores_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor.json");
        std::fs::write(&path, r#"{"height": 42}"#).unwrap();

        let mut config = config();
        config.watcher.cursor_path = Some(path.to_string_lossy().into_owned());
        assert_eq!(build_poller(&config).unwrap().cursor(), Some(42));
    }

    #[test]
    fn test_bad_dns_server() {
        let mut config = config();
        config.dns.server = "ns1.example.com".into();
        assert!(matches!(build_poller(&config), Err(StartupError::DnsServer(_))));
    }
}
