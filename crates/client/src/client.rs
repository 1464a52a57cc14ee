//! Grant client: the only piece of the core the HTTP layer talks to.

use thiserror::Error;
use tracing::debug;

use stockcert_channel::{FailureKind, LedgerRequest, LedgerResponse};
use stockcert_core::{Certificate, ShareClassCode};

use crate::pool::{ConnectionPool, PoolError};

/// The ledger refused the grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Issued(Certificate),
    Denied(Denial),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The ledger reported a failure of its own (not a denial).
    #[error("ledger failed to process grant: {0}")]
    Ledger(String),

    #[error("unexpected ledger reply: {0}")]
    UnexpectedReply(String),
}

#[derive(Debug)]
pub struct GrantClient {
    pool: ConnectionPool,
    company: String,
}

impl GrantClient {
    pub fn new(pool: ConnectionPool, company: impl Into<String>) -> Self {
        Self {
            pool,
            company: company.into(),
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Ask the ledger for `amount` shares of `share_class` on behalf of
    /// `stakeholder`.
    pub async fn request_grant(
        &self,
        stakeholder: &str,
        share_class: ShareClassCode,
        amount: u64,
    ) -> Result<GrantOutcome, ClientError> {
        let request = LedgerRequest::Grant {
            share_class: share_class.clone(),
            share_amount: amount,
        };

        match self.pool.send(&request).await? {
            LedgerResponse::Granted {
                cert_id,
                share_class: granted_class,
                share_amount,
            } => {
                if granted_class != share_class || share_amount != amount {
                    return Err(ClientError::UnexpectedReply(format!(
                        "asked for {amount} {share_class}, ledger granted {share_amount} {granted_class}"
                    )));
                }
                Ok(GrantOutcome::Issued(Certificate::issue(
                    self.company.clone(),
                    stakeholder,
                    granted_class,
                    cert_id,
                    share_amount,
                )))
            }
            LedgerResponse::Failed {
                error,
                kind: FailureKind::Denied,
            } => {
                debug!(%share_class, amount, reason = %error, "grant denied");
                Ok(GrantOutcome::Denied(Denial { reason: error }))
            }
            LedgerResponse::Failed {
                error,
                kind: FailureKind::Internal,
            } => Err(ClientError::Ledger(error)),
        }
    }
}
