//! Append-only snapshot log boundary.
//!
//! Every committed grant appends one full inventory snapshot. Recovery only
//! ever needs the last complete record.

pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::FileSnapshotLog;
pub use in_memory::InMemorySnapshotLog;
pub use r#trait::{SnapshotLog, SnapshotLogError};
