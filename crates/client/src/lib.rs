//! Front-end side of the Grant Channel: pooled connections to the ledger and
//! the grant client the HTTP layer calls.

pub mod client;
pub mod pool;

pub use client::{ClientError, Denial, GrantClient, GrantOutcome};
pub use pool::{ConnectionPool, GrantConnection, PoolConfig, PoolError};
