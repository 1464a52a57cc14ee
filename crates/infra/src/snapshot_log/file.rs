//! File-backed snapshot log.
//!
//! Layout: one snapshot per line, appended after every grant, never
//! rewritten. Recovery seeks to the end of the file and scans backward for
//! the last two newlines; only the bytes between them are read and parsed,
//! however long the log has grown.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use stockcert_inventory::Snapshot;

use super::r#trait::{SnapshotLog, SnapshotLogError};

/// Bytes read per step while scanning backward.
const SCAN_CHUNK: usize = 4096;

/// Location of the last complete record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct RecordSpan {
    /// First byte of the record.
    start: u64,
    /// One past the terminating `\n`.
    end: u64,
}

#[derive(Debug)]
pub struct FileSnapshotLog {
    path: PathBuf,
    file: File,
    /// Length of the file up to the last complete record.
    committed_len: u64,
    sync_appends: bool,
}

impl FileSnapshotLog {
    /// Open (or create) the log at `path`.
    ///
    /// With `sync_appends`, every append is followed by `fsync` of the data.
    pub fn open(path: impl AsRef<Path>, sync_appends: bool) -> Result<Self, SnapshotLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;
        let committed_len = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            committed_len,
            sync_appends,
        })
    }

    fn locate_last_record(&mut self, len: u64) -> Result<Option<RecordSpan>, SnapshotLogError> {
        let mut buf = vec![0u8; SCAN_CHUNK];
        let mut pos = len;
        let mut end: Option<u64> = None;

        while pos > 0 {
            let step = usize::try_from(pos).map_or(SCAN_CHUNK, |p| p.min(SCAN_CHUNK));
            let chunk_start = pos - step as u64;
            self.file.seek(SeekFrom::Start(chunk_start))?;
            self.file.read_exact(&mut buf[..step])?;

            for i in (0..step).rev() {
                if buf[i] != b'\n' {
                    continue;
                }
                let newline_at = chunk_start + i as u64;
                match end {
                    None => end = Some(newline_at + 1),
                    Some(end) => {
                        return Ok(Some(RecordSpan {
                            start: newline_at + 1,
                            end,
                        }));
                    }
                }
            }
            pos = chunk_start;
        }

        // Zero or one newline: the record (if any) starts at the beginning.
        Ok(end.map(|end| RecordSpan { start: 0, end }))
    }

    /// Cut the file back to the end of the last complete record.
    ///
    /// Goes through a fresh handle opened by path, so it works even when the
    /// append handle itself is what failed.
    fn truncate_to_committed(&self) -> std::io::Result<()> {
        OpenOptions::new()
            .write(true)
            .open(&self.path)?
            .set_len(self.committed_len)
    }

    fn read_record(&mut self, span: RecordSpan) -> Result<Snapshot, SnapshotLogError> {
        let len = usize::try_from(span.end - span.start).map_err(|_| {
            SnapshotLogError::Io(std::io::Error::other("snapshot record too large"))
        })?;
        let mut raw = vec![0u8; len];
        self.file.seek(SeekFrom::Start(span.start))?;
        self.file.read_exact(&mut raw)?;

        let line = std::str::from_utf8(&raw)
            .map_err(|_| SnapshotLogError::InvalidUtf8 { offset: span.start })?;
        Snapshot::parse_line(line).map_err(|source| SnapshotLogError::Corrupt {
            offset: span.start,
            source,
        })
    }
}

impl SnapshotLog for FileSnapshotLog {
    fn load(&mut self) -> Result<Option<Snapshot>, SnapshotLogError> {
        let len = self.file.metadata()?.len();
        let span = self.locate_last_record(len)?;
        let complete_len = span.map_or(0, |s| s.end);

        if complete_len < len {
            // Crash mid-append: drop the partial record so the next append
            // starts on a fresh line.
            warn!(
                path = %self.path.display(),
                discarded_bytes = len - complete_len,
                "discarding truncated snapshot log tail"
            );
            self.file.set_len(complete_len)?;
        }
        self.committed_len = complete_len;

        let Some(span) = span else {
            info!(path = %self.path.display(), "snapshot log empty");
            return Ok(None);
        };

        let snapshot = self.read_record(span)?;
        info!(
            path = %self.path.display(),
            offset = span.start,
            classes = snapshot.len(),
            "restored inventory from snapshot log"
        );
        Ok(Some(snapshot))
    }

    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotLogError> {
        let line = snapshot.to_line();

        let written = self
            .file
            .write_all(line.as_bytes())
            .and_then(|()| if self.sync_appends { self.file.sync_data() } else { Ok(()) });

        if let Err(e) = written {
            // Roll back a partial line so the log still ends on a record boundary.
            if let Err(rollback) = self.truncate_to_committed() {
                warn!(path = %self.path.display(), error = %rollback, "failed to roll back partial append");
            }
            return Err(e.into());
        }

        self.committed_len += line.len() as u64;
        Ok(())
    }
}
