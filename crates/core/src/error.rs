//! Domain error model.

use thiserror::Error;

use crate::share_class::ShareClassCode;

/// Domain-level error.
///
/// Keep this focused on deterministic failures when building domain values.
/// Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A share class code was rejected.
    #[error("invalid share class code: {0}")]
    InvalidShareClass(String),
}

impl DomainError {
    pub fn invalid_share_class(msg: impl Into<String>) -> Self {
        Self::InvalidShareClass(msg.into())
    }
}

/// Why the ledger refused a grant.
///
/// Denials are legitimate business outcomes (out of stock, unknown class).
/// They are reported to the requester and are never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrantDenial {
    #[error("unknown share class: {0}")]
    UnknownShareClass(ShareClassCode),

    #[error("insufficient shares in {share_class}: requested {requested}, remaining {remaining}")]
    InsufficientShares {
        share_class: ShareClassCode,
        requested: u64,
        remaining: u64,
    },

    #[error("share amount must be positive")]
    ZeroAmount,
}
