//! Snapshot records: the full inventory state written after every grant.
//!
//! One record is one line of the form
//!
//! ```text
//! |CS:2587320:1268|PS:694140:5586
//! ```
//!
//! meaning class `CS` has 2,587,320 shares remaining and has issued 1,268
//! certificates. Classes are written in code order so identical state always
//! encodes to identical bytes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use stockcert_core::{DomainError, ShareClassCode};

const BLOCK_DELIMITER: char = '|';
const FIELD_DELIMITER: char = ':';

/// Per-class counters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ShareClassState {
    pub remaining_shares: u64,
    pub issued_certificates: u64,
}

impl ShareClassState {
    pub fn authorized(amount: u64) -> Self {
        Self {
            remaining_shares: amount,
            issued_certificates: 0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot record is empty")]
    Empty,

    #[error("snapshot record must start with '|': {0:?}")]
    MissingLeadingDelimiter(String),

    #[error("malformed class block {0:?} (expected <class>:<remaining>:<issued>)")]
    MalformedBlock(String),

    #[error("invalid counter in block {block:?}: {reason}")]
    InvalidCounter { block: String, reason: String },

    #[error(transparent)]
    InvalidShareClass(#[from] DomainError),

    #[error("share class {0} appears twice in one record")]
    DuplicateClass(ShareClassCode),
}

/// Full inventory state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    classes: BTreeMap<ShareClassCode, ShareClassState>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, share_class: &ShareClassCode) -> Option<ShareClassState> {
        self.classes.get(share_class).copied()
    }

    pub fn get_mut(&mut self, share_class: &ShareClassCode) -> Option<&mut ShareClassState> {
        self.classes.get_mut(share_class)
    }

    /// Insert a class unless it is already present. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, share_class: ShareClassCode, state: ShareClassState) -> bool {
        match self.classes.entry(share_class) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(state);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ShareClassCode, &ShareClassState)> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Encode as one newline-terminated log line.
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(self.classes.len() * 24 + 1);
        for (code, state) in self.iter() {
            // Writing into a String cannot fail.
            let _ = write!(
                line,
                "{BLOCK_DELIMITER}{code}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}",
                state.remaining_shares, state.issued_certificates
            );
        }
        line.push('\n');
        line
    }

    /// Parse a single record. A trailing `\n` (or `\r\n`) is accepted.
    pub fn parse_line(line: &str) -> Result<Self, SnapshotError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return Err(SnapshotError::Empty);
        }
        let body = line
            .strip_prefix(BLOCK_DELIMITER)
            .ok_or_else(|| SnapshotError::MissingLeadingDelimiter(line.to_string()))?;

        let mut classes = BTreeMap::new();
        for block in body.split(BLOCK_DELIMITER) {
            let (code, state) = parse_block(block)?;
            if classes.contains_key(&code) {
                return Err(SnapshotError::DuplicateClass(code));
            }
            classes.insert(code, state);
        }
        Ok(Self { classes })
    }
}

fn parse_block(block: &str) -> Result<(ShareClassCode, ShareClassState), SnapshotError> {
    let mut fields = block.split(FIELD_DELIMITER);
    let (Some(code), Some(remaining), Some(issued), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(SnapshotError::MalformedBlock(block.to_string()));
    };

    let counter = |raw: &str| {
        raw.parse::<u64>().map_err(|e| SnapshotError::InvalidCounter {
            block: block.to_string(),
            reason: e.to_string(),
        })
    };

    Ok((
        ShareClassCode::new(code)?,
        ShareClassState {
            remaining_shares: counter(remaining)?,
            issued_certificates: counter(issued)?,
        },
    ))
}

impl FromIterator<(ShareClassCode, ShareClassState)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (ShareClassCode, ShareClassState)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}
