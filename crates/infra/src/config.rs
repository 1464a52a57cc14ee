//! Configuration loading and representation.
//!
//! Everything is read from `STOCKCERT_*` environment variables with
//! defaults suitable for a single-machine dev setup. Parsing goes through a
//! key lookup closure so tests never touch the process environment.

use std::path::PathBuf;

use thiserror::Error;

use stockcert_core::ShareClassCode;

pub const LEDGER_ADDR: &str = "STOCKCERT_LEDGER_ADDR";
pub const LOG_PATH: &str = "STOCKCERT_LOG_PATH";
pub const SHARE_CLASSES: &str = "STOCKCERT_SHARE_CLASSES";
pub const SYNC_APPENDS: &str = "STOCKCERT_SYNC_APPENDS";
pub const HTTP_ADDR: &str = "STOCKCERT_HTTP_ADDR";
pub const COMPANY: &str = "STOCKCERT_COMPANY";
pub const MAX_RETRIES: &str = "STOCKCERT_MAX_RETRIES";

const DEFAULT_LEDGER_ADDR: &str = "127.0.0.1:7070";
const DEFAULT_LOG_PATH: &str = "stockcert.log";
const DEFAULT_SHARE_CLASSES: &str = "CS=5000000,PS=1000000";
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_COMPANY: &str = "Impossible Cuts Inc.";
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Inventory ledger daemon settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub listen_addr: String,
    pub log_path: PathBuf,
    /// Authorized totals, registered in this order at startup.
    pub share_classes: Vec<(ShareClassCode, u64)>,
    pub sync_appends: bool,
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let share_classes = lookup(SHARE_CLASSES).unwrap_or_else(|| DEFAULT_SHARE_CLASSES.to_string());
        let sync_appends = match lookup(SYNC_APPENDS) {
            Some(raw) => parse_bool(SYNC_APPENDS, &raw)?,
            None => false,
        };

        Ok(Self {
            listen_addr: lookup(LEDGER_ADDR).unwrap_or_else(|| DEFAULT_LEDGER_ADDR.to_string()),
            log_path: lookup(LOG_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            share_classes: parse_share_classes(&share_classes)?,
            sync_appends,
        })
    }
}

/// HTTP front end settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendConfig {
    pub http_addr: String,
    pub ledger_addr: String,
    pub company: String,
    pub max_retries: u32,
}

impl FrontendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_retries = match lookup(MAX_RETRIES) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid(MAX_RETRIES, e.to_string()))?,
            None => DEFAULT_MAX_RETRIES,
        };

        Ok(Self {
            http_addr: lookup(HTTP_ADDR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            ledger_addr: lookup(LEDGER_ADDR).unwrap_or_else(|| DEFAULT_LEDGER_ADDR.to_string()),
            company: lookup(COMPANY).unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            max_retries,
        })
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(key, format!("expected a boolean, got {other:?}"))),
    }
}

/// Parse `CS=5000000,PS=1000000`.
pub fn parse_share_classes(raw: &str) -> Result<Vec<(ShareClassCode, u64)>, ConfigError> {
    let mut classes: Vec<(ShareClassCode, u64)> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (code, amount) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::invalid(SHARE_CLASSES, format!("expected CLASS=AMOUNT, got {entry:?}")))?;

        let code = ShareClassCode::new(code.trim())
            .map_err(|e| ConfigError::invalid(SHARE_CLASSES, e.to_string()))?;
        let amount = amount
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::invalid(SHARE_CLASSES, format!("{code}: {e}")))?;

        if classes.iter().any(|(existing, _)| *existing == code) {
            return Err(ConfigError::invalid(SHARE_CLASSES, format!("{code} listed twice")));
        }
        classes.push((code, amount));
    }

    Ok(classes)
}
