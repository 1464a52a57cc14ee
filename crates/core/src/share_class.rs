//! Strongly-typed share class code.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest code accepted. Codes are short tags like `CS` or `PS`.
pub const MAX_CODE_LEN: usize = 16;

/// Identifier of a share class (e.g. `CS` for common stock).
///
/// Codes are embedded verbatim in the snapshot log (`|CS:40:1`), so the log
/// delimiters and whitespace are rejected on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareClassCode(String);

impl ShareClassCode {
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into();
        if code.is_empty() {
            return Err(DomainError::invalid_share_class("code cannot be empty"));
        }
        if code.len() > MAX_CODE_LEN {
            return Err(DomainError::invalid_share_class(format!(
                "code longer than {MAX_CODE_LEN} bytes: {code}"
            )));
        }
        if code
            .chars()
            .any(|c| c == '|' || c == ':' || c.is_whitespace() || c.is_control())
        {
            return Err(DomainError::invalid_share_class(format!(
                "code contains a reserved character: {code:?}"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ShareClassCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareClassCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ShareClassCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShareClassCode> for String {
    fn from(value: ShareClassCode) -> Self {
        value.0
    }
}

impl AsRef<str> for ShareClassCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
