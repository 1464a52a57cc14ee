use std::io;
use std::sync::{Arc, Mutex};

use stockcert_inventory::Snapshot;

use super::r#trait::{SnapshotLog, SnapshotLogError};

#[derive(Debug, Default)]
struct Inner {
    lines: Vec<String>,
    fail_appends: bool,
}

/// In-memory snapshot log.
///
/// Intended for tests/dev. Clones share the same storage, so a test can keep
/// a handle to inspect what a ledger wrote.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotLog {
    inner: Arc<Mutex<Inner>>,
}

impl InMemorySnapshotLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every appended record, in order, as encoded log lines.
    pub fn lines(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.lines.clone())
            .unwrap_or_default()
    }

    /// Make subsequent appends fail with an IO error (simulates a full disk).
    pub fn set_fail_appends(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_appends = fail;
        }
    }
}

fn poisoned() -> SnapshotLogError {
    SnapshotLogError::Io(io::Error::other("in-memory log lock poisoned"))
}

impl SnapshotLog for InMemorySnapshotLog {
    fn load(&mut self) -> Result<Option<Snapshot>, SnapshotLogError> {
        let inner = self.inner.lock().map_err(|_| poisoned())?;
        let Some(last) = inner.lines.last() else {
            return Ok(None);
        };
        let offset = inner.lines[..inner.lines.len() - 1]
            .iter()
            .map(|l| l.len() as u64)
            .sum();
        Snapshot::parse_line(last)
            .map(Some)
            .map_err(|source| SnapshotLogError::Corrupt { offset, source })
    }

    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotLogError> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;
        if inner.fail_appends {
            return Err(SnapshotLogError::Io(io::Error::other("simulated append failure")));
        }
        inner.lines.push(snapshot.to_line());
        Ok(())
    }
}
