//! Squawker DNS bridge library.
//!
//! Watches an Evermore chain for Squawker protocol transactions and publishes
//! the DNS records they reference into an authoritative zone.

pub mod config;
pub mod content;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod protocol;
pub mod resilience;
pub mod watcher;
pub mod zone;

pub use config::schema::BridgeConfig;
pub use lifecycle::Shutdown;
pub use watcher::ChainPoller;
