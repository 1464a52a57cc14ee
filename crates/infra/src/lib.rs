//! Infrastructure layer: durable snapshot log, the locked ledger, config.

pub mod config;
pub mod ledger;
pub mod snapshot_log;

pub use config::{ConfigError, FrontendConfig, LedgerConfig};
pub use ledger::{InventoryLedger, LedgerError};
pub use snapshot_log::{FileSnapshotLog, InMemorySnapshotLog, SnapshotLog, SnapshotLogError};
