//! Newline-delimited JSON framing over any async byte stream.

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::message::{LedgerRequest, LedgerResponse};

/// Largest accepted message, excluding the terminating newline.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// Zero-length read: the peer closed the connection between messages.
    #[error("peer closed the connection")]
    PeerClosed,

    /// Unparseable, empty, oversized or truncated message.
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("channel io error: {0}")]
    Io(#[from] io::Error),
}

impl ChannelError {
    /// Whether the failure means the connection is dead (closed or reset by
    /// the peer), as opposed to a protocol or local failure.
    pub fn is_peer_closed(&self) -> bool {
        match self {
            ChannelError::PeerClosed => true,
            ChannelError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// One end of a Grant Channel connection.
#[derive(Debug)]
pub struct Channel<S> {
    stream: BufReader<S>,
    line: String,
}

impl<S> Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            line: String::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    /// Write one message and flush it.
    pub async fn send<M: Serialize>(&mut self, message: &M) -> Result<(), ChannelError> {
        let mut frame = serde_json::to_vec(message)?;
        frame.push(b'\n');

        let stream = self.stream.get_mut();
        stream.write_all(&frame).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Read one message.
    ///
    /// Returns `ChannelError::PeerClosed` when the peer closed the connection
    /// before sending any byte of a new message.
    pub async fn recv<M: DeserializeOwned>(&mut self) -> Result<M, ChannelError> {
        self.line.clear();
        let limit = MAX_MESSAGE_BYTES as u64 + 1;

        let read = match (&mut self.stream).take(limit).read_line(&mut self.line).await {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(ChannelError::Malformed("message is not valid utf-8".into()));
            }
            Err(e) => return Err(e.into()),
        };

        if read == 0 {
            return Err(ChannelError::PeerClosed);
        }

        let Some(body) = self.line.strip_suffix('\n') else {
            return Err(if self.line.len() > MAX_MESSAGE_BYTES {
                ChannelError::Malformed(format!("message exceeds {MAX_MESSAGE_BYTES} bytes"))
            } else {
                ChannelError::Malformed("connection closed mid-message".into())
            });
        };

        let body = body.strip_suffix('\r').unwrap_or(body);
        if body.trim().is_empty() {
            return Err(ChannelError::Malformed("empty message".into()));
        }

        serde_json::from_str(body).map_err(|e| ChannelError::Malformed(e.to_string()))
    }

    /// One full request/response cycle.
    pub async fn request(&mut self, request: &LedgerRequest) -> Result<LedgerResponse, ChannelError> {
        self.send(request).await?;
        self.recv().await
    }
}
