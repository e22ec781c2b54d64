//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Failed poll cycle:
//!     → backoff.rs (capped exponential delay with jitter)
//!     → poller sleeps, retries the same blocks (cursor unchanged)
//! ```
//!
//! # Design Decisions
//! - Every collaborator call has a deadline (see each client)
//! - Block-level failures retry forever, but never faster than the poll interval

pub mod backoff;

pub use backoff::calculate_backoff;
