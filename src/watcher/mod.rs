//! Chain watching subsystem.

pub mod cursor;
pub mod poller;

pub use cursor::{FileCursorStore, WatcherCursor};
pub use poller::{BlockReport, ChainPoller, CycleOutcome, TransactionError};
