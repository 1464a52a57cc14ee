use std::io;

use thiserror::Error;

use stockcert_inventory::{Snapshot, SnapshotError};

/// Snapshot log operation error.
///
/// These are **infrastructure errors** (IO, corrupt storage) as opposed to
/// grant denials.
#[derive(Debug, Error)]
pub enum SnapshotLogError {
    #[error("snapshot log io error: {0}")]
    Io(#[from] io::Error),

    /// The last complete record exists but cannot be parsed.
    #[error("corrupt snapshot record at byte {offset}: {source}")]
    Corrupt {
        offset: u64,
        #[source]
        source: SnapshotError,
    },

    #[error("snapshot record at byte {offset} is not valid utf-8")]
    InvalidUtf8 { offset: u64 },
}

/// Durable, append-only storage of inventory snapshots.
///
/// Owned exclusively by one ledger; implementations need no internal locking.
pub trait SnapshotLog {
    /// Recover the most recent complete snapshot, if any.
    ///
    /// An incomplete trailing record (a crash mid-append) is discarded.
    fn load(&mut self) -> Result<Option<Snapshot>, SnapshotLogError>;

    /// Durably append one snapshot record.
    ///
    /// On error nothing may be considered committed; implementations leave
    /// the log as it was before the call when they can.
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotLogError>;
}

impl<L: SnapshotLog + ?Sized> SnapshotLog for Box<L> {
    fn load(&mut self) -> Result<Option<Snapshot>, SnapshotLogError> {
        (**self).load()
    }

    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotLogError> {
        (**self).append(snapshot)
    }
}
