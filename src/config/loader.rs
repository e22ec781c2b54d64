//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{BridgeConfig, DEFAULT_RPC_PORT};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => BridgeConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the deployment environment variables on top of `config`.
///
/// `RPC_HOST`/`RPC_PORT` rebuild the primary RPC URL; `BIND_SERVER` and
/// `ZONE_NAME` select the DNS target.
pub fn apply_env_overrides<F>(config: &mut BridgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(user) = non_empty("RPC_USER") {
        config.ledger.rpc_user = user;
    }
    if let Some(password) = non_empty("RPC_PASSWORD") {
        config.ledger.rpc_password = password;
    }

    let host = non_empty("RPC_HOST");
    let port = non_empty("RPC_PORT");
    if host.is_some() || port.is_some() {
        let host = host.unwrap_or_else(|| "127.0.0.1".to_string());
        let port = port.unwrap_or_else(|| DEFAULT_RPC_PORT.to_string());
        config.ledger.rpc_url = if host.contains("://") {
            format!("{}:{}", host.trim_end_matches('/'), port)
        } else {
            format!("http://{}:{}", host, port)
        };
    }

    if let Some(server) = non_empty("BIND_SERVER") {
        config.dns.server = server;
    }
    if let Some(zone) = non_empty("ZONE_NAME") {
        config.dns.zone_name = zone;
    }
}
