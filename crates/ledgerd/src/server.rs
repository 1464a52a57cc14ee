//! TCP server loop for the inventory ledger.
//!
//! One task per connection; each task reads requests and writes replies in
//! strict alternation until the peer closes. The ledger call itself is
//! synchronous, so no request ever suspends inside the grant critical
//! section.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use stockcert_channel::{Channel, ChannelError, LedgerRequest, LedgerResponse};
use stockcert_infra::{FileSnapshotLog, InventoryLedger, LedgerConfig, LedgerError, SnapshotLog};

/// Open the configured log, replay it, and register the configured classes.
///
/// Classes restored from the log keep their persisted counters.
pub fn open_ledger(config: &LedgerConfig) -> Result<InventoryLedger<FileSnapshotLog>, LedgerError> {
    let log = FileSnapshotLog::open(&config.log_path, config.sync_appends)?;
    let ledger = InventoryLedger::load(log)?;
    for (share_class, authorized) in &config.share_classes {
        ledger.register(share_class.clone(), *authorized)?;
    }
    if ledger.snapshot()?.is_empty() {
        warn!(path = %config.log_path.display(), "no share classes known; every grant will be denied");
    }
    Ok(ledger)
}

/// Turn one request into its reply.
pub fn respond<L: SnapshotLog>(ledger: &InventoryLedger<L>, request: LedgerRequest) -> LedgerResponse {
    match request {
        LedgerRequest::Grant {
            share_class,
            share_amount,
        } => match ledger.grant(share_class, share_amount) {
            Ok(record) => LedgerResponse::Granted {
                cert_id: record.sequence,
                share_class: record.share_class,
                share_amount: record.amount,
            },
            Err(LedgerError::Denied(denial)) => LedgerResponse::denied(&denial),
            Err(e) => {
                error!(error = %e, "grant failed");
                LedgerResponse::internal(e.to_string())
            }
        },
    }
}

/// Accept connections until `shutdown` resolves, then close them all.
pub async fn serve<L>(
    listener: TcpListener,
    ledger: Arc<InventoryLedger<L>>,
    shutdown: impl Future<Output = ()>,
) -> io::Result<()>
where
    L: SnapshotLog + Send + 'static,
{
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    let ledger = ledger.clone();
                    connections.spawn(async move {
                        if let Err(e) = handle_connection(stream, ledger).await {
                            warn!(%peer, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    info!(open_connections = connections.len(), "ledger shutting down");
    connections.shutdown().await;
    Ok(())
}

async fn handle_connection<L: SnapshotLog>(
    stream: TcpStream,
    ledger: Arc<InventoryLedger<L>>,
) -> Result<(), ChannelError> {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }
    let mut chan = Channel::new(stream);

    loop {
        let request = match chan.recv::<LedgerRequest>().await {
            Ok(request) => request,
            Err(ChannelError::PeerClosed) => return Ok(()),
            Err(ChannelError::Malformed(reason)) => {
                // Framing can no longer be trusted; fail this request and drop the connection.
                warn!(%reason, "malformed request");
                let reply = LedgerResponse::internal(format!("malformed request: {reason}"));
                if let Err(e) = chan.send(&reply).await {
                    debug!(error = %e, "failed to send malformed-request reply");
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let reply = respond(&ledger, request);
        chan.send(&reply).await?;
    }
}
