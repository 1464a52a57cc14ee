//! Grant Channel: the line protocol between the front end and the ledger.
//!
//! Each message is one compact JSON object terminated by `\n`. Connections
//! are long-lived; any number of request/response cycles run over one
//! connection, strictly alternating.

pub mod codec;
pub mod message;

pub use codec::{Channel, ChannelError, MAX_MESSAGE_BYTES};
pub use message::{FailureKind, LedgerRequest, LedgerResponse};
