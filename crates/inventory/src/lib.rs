//! Share inventory domain module.
//!
//! This crate contains the grant arbitration rules and the snapshot record
//! format, implemented purely as deterministic domain logic (no IO, no
//! network, no storage).

pub mod inventory;
pub mod snapshot;

pub use inventory::{GrantRecord, GrantShares, Inventory};
pub use snapshot::{ShareClassState, Snapshot, SnapshotError};
