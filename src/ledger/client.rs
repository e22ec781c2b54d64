//! Ledger JSON-RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Speak JSON-RPC 1.0 to an Evermore node over HTTP basic auth
//! - Query chain height, blocks and prior transactions
//! - Fail over to secondary endpoints on transport errors
//! - Never fail over on node errors (the answer would be the same)

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::timeout;
use url::Url;

use crate::ledger::types::{Block, LedgerConfig, LedgerError, LedgerResult, Transaction};
use crate::ledger::Ledger;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client for the ledger node.
#[derive(Clone)]
pub struct RpcLedgerClient {
    /// Primary endpoint followed by failovers.
    endpoints: Vec<Url>,
    http: reqwest::Client,
    config: LedgerConfig,
    timeout_duration: Duration,
}

impl RpcLedgerClient {
    /// Create a new client. Invalid failover URLs are skipped with a warning.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut endpoints = Vec::new();

        let primary: Url = config.rpc_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        endpoints.push(primary);

        for url_str in &config.failover_urls {
            match url_str.parse() {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LedgerError::Rpc(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            endpoints,
            http,
            config,
            timeout_duration,
        })
    }

    /// Issue one JSON-RPC call, trying each endpoint in turn.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "squawker-dns",
            "method": method,
            "params": params,
        });

        let timeout_secs = self.timeout_duration.as_secs();
        let mut last_failure = None;

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            let mut request = self.http.post(endpoint.clone()).json(&body);
            if !self.config.rpc_user.is_empty() {
                request = request.basic_auth(&self.config.rpc_user, Some(&self.config.rpc_password));
            }

            let response = match timeout(self.timeout_duration, request.send()).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, method, error = %e, "RPC error, trying next endpoint");
                    last_failure = Some(LedgerError::Rpc(e.to_string()));
                    continue;
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, method, "RPC timeout, trying next endpoint");
                    last_failure = Some(LedgerError::Timeout(timeout_secs));
                    continue;
                }
            };

            // bitcoind-style nodes answer RPC errors with HTTP 500 and a JSON body,
            // so only auth and routing failures are treated as transport errors.
            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::NOT_FOUND {
                tracing::warn!(endpoint_idx = i, method, %status, "RPC endpoint refused request");
                last_failure = Some(LedgerError::Rpc(format!("HTTP {}", status)));
                continue;
            }

            let payload = match timeout(self.timeout_duration, response.bytes()).await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, method, error = %e, "RPC body read failed");
                    last_failure = Some(LedgerError::Rpc(e.to_string()));
                    continue;
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, method, "RPC timeout reading body");
                    last_failure = Some(LedgerError::Timeout(timeout_secs));
                    continue;
                }
            };

            let decoded: RpcResponse<T> = match serde_json::from_slice(&payload) {
                Ok(decoded) => decoded,
                // A gateway in front of the node answering with an HTML error page.
                Err(e) if status.is_server_error() => {
                    tracing::warn!(endpoint_idx = i, method, %status, "Non-JSON RPC error response, trying next endpoint");
                    last_failure = Some(LedgerError::Rpc(format!("HTTP {}: {}", status, e)));
                    continue;
                }
                Err(e) => return Err(LedgerError::Decode(format!("{}: {}", method, e))),
            };
            if let Some(err) = decoded.error {
                return Err(LedgerError::Node {
                    code: err.code,
                    message: err.message,
                });
            }
            return decoded
                .result
                .ok_or_else(|| LedgerError::Decode(format!("{}: empty result", method)));
        }

        match last_failure {
            Some(LedgerError::Timeout(secs)) => Err(LedgerError::Timeout(secs)),
            Some(e) => Err(LedgerError::Rpc(format!("All RPC endpoints failed for {}: {}", method, e))),
            None => Err(LedgerError::Rpc(format!("All RPC endpoints failed for {}", method))),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

#[async_trait]
impl Ledger for RpcLedgerClient {
    async fn get_height(&self) -> LedgerResult<u64> {
        self.call("getblockcount", json!([])).await
    }

    async fn get_block(&self, height: u64) -> LedgerResult<Block> {
        let hash: String = self.call("getblockhash", json!([height])).await?;
        self.call("getblock", json!([hash, 2])).await
    }

    async fn get_raw_transaction(&self, txid: &str) -> LedgerResult<Transaction> {
        self.call("getrawtransaction", json!([txid, 1])).await
    }
}

impl std::fmt::Debug for RpcLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedgerClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("endpoints", &self.endpoints.len())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
