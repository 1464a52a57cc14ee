//! Client-side pool of idle ledger connections.
//!
//! Connections are opened on demand and never waited for: `acquire` hands out
//! an idle connection or dials a new one. A connection goes back to the idle
//! set only after a complete, well-formed request/response cycle.
//!
//! The ledger (or anything in between) may close an idle connection at any
//! time. A request that finds its connection closed discards it and is resent
//! on a fresh connection, up to `max_retries` times.

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use stockcert_channel::{Channel, ChannelError, LedgerRequest, LedgerResponse};

/// A connected, framed transport to the ledger.
pub type GrantConnection = Channel<TcpStream>;

const DEFAULT_MAX_IDLE: usize = 64;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Ledger address (`host:port`).
    pub addr: String,
    /// Idle connections kept for reuse; extra releases are dropped.
    pub max_idle: usize,
    /// Resends after a peer-closed failure before giving up.
    pub max_retries: u32,
    pub connect_timeout: Duration,
    /// Bound on one request/response cycle.
    pub request_timeout: Duration,
}

impl PoolConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            max_idle: DEFAULT_MAX_IDLE,
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to connect to ledger at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Every attempt found its connection closed by the peer.
    #[error("ledger kept closing connections ({attempts} attempts): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ChannelError,
    },
}

#[derive(Debug)]
pub struct ConnectionPool {
    config: PoolConfig,
    idle: Mutex<Vec<GrantConnection>>,
}

impl ConnectionPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    /// Take an idle connection, or open a new one.
    pub async fn acquire(&self) -> Result<GrantConnection, PoolError> {
        if let Some(conn) = self.idle.lock().ok().and_then(|mut idle| idle.pop()) {
            return Ok(conn);
        }
        self.connect().await
    }

    /// Return a connection after a completed request/response cycle.
    pub fn release(&self, conn: GrantConnection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.config.max_idle {
                idle.push(conn);
            }
        }
    }

    async fn connect(&self) -> Result<GrantConnection, PoolError> {
        let addr = &self.config.addr;
        let stream = timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PoolError::Timeout {
                operation: "ledger connect",
            })?
            .map_err(|source| PoolError::Connect {
                addr: addr.clone(),
                source,
            })?;

        // Requests are tiny and latency-bound.
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "failed to set TCP_NODELAY");
        }
        debug!(%addr, "opened ledger connection");
        Ok(Channel::new(stream))
    }

    /// Run one request/response cycle, retrying on stale connections.
    ///
    /// The connection is released on success and discarded on any error.
    #[instrument(skip(self, request), fields(addr = %self.config.addr))]
    pub async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse, PoolError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let mut conn = self.acquire().await?;

            let result = timeout(self.config.request_timeout, conn.request(request))
                .await
                .map_err(|_| PoolError::Timeout {
                    operation: "ledger request",
                })?;

            match result {
                Ok(response) => {
                    self.release(conn);
                    return Ok(response);
                }
                Err(e) if e.is_peer_closed() => {
                    if attempts > self.config.max_retries {
                        warn!(attempts, error = %e, "giving up on ledger request");
                        return Err(PoolError::RetriesExhausted { attempts, source: e });
                    }
                    debug!(attempts, error = %e, "ledger closed connection; retrying on a fresh one");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
