use std::path::Path;
use std::sync::Arc;

use stockcert_client::{ConnectionPool, Denial, GrantClient, GrantOutcome, PoolConfig};
use stockcert_core::ShareClassCode;
use stockcert_infra::LedgerConfig;

struct TestLedger {
    addr: String,
    stop: Option<tokio::sync::oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestLedger {
    /// Open the log at `log_path` and serve it on `addr` (`127.0.0.1:0` for any port).
    async fn spawn(log_path: &Path, addr: &str, classes: &[(&str, u64)]) -> Self {
        let config = LedgerConfig {
            listen_addr: addr.to_string(),
            log_path: log_path.to_path_buf(),
            share_classes: classes
                .iter()
                .map(|(c, n)| (ShareClassCode::new(*c).unwrap(), *n))
                .collect(),
            sync_appends: true,
        };
        let ledger = Arc::new(stockcert_ledgerd::open_ledger(&config).unwrap());
        let listener = tokio::net::TcpListener::bind(&config.listen_addr)
            .await
            .expect("failed to bind ledger port");
        let addr = listener.local_addr().unwrap().to_string();

        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(stockcert_ledgerd::serve(listener, ledger, async move {
            let _ = stopped.await;
        }));

        Self {
            addr,
            stop: Some(stop),
            handle,
        }
    }

    /// Stop accepting and close every open connection.
    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.handle).await.unwrap().unwrap();
    }
}

impl Drop for TestLedger {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn client_for(addr: &str) -> GrantClient {
    GrantClient::new(
        ConnectionPool::new(PoolConfig::new(addr)),
        "Impossible Cuts Inc.",
    )
}

fn cs() -> ShareClassCode {
    ShareClassCode::new("CS").unwrap()
}

fn issued_id(outcome: GrantOutcome) -> String {
    match outcome {
        GrantOutcome::Issued(cert) => cert.cert_id.to_string(),
        GrantOutcome::Denied(Denial { reason }) => panic!("unexpected denial: {reason}"),
    }
}

#[tokio::test]
async fn scenario_grants_until_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = TestLedger::spawn(&dir.path().join("ledger.log"), "127.0.0.1:0", &[("CS", 100)]).await;
    let client = client_for(&ledger.addr);

    assert_eq!(issued_id(client.request_grant("a", cs(), 60).await.unwrap()), "CS-1");
    assert!(matches!(
        client.request_grant("b", cs(), 50).await.unwrap(),
        GrantOutcome::Denied(_)
    ));
    assert_eq!(issued_id(client.request_grant("c", cs(), 40).await.unwrap()), "CS-2");
    assert!(matches!(
        client.request_grant("d", cs(), 1).await.unwrap(),
        GrantOutcome::Denied(_)
    ));
    assert!(matches!(
        client
            .request_grant("e", ShareClassCode::new("XX").unwrap(), 1)
            .await
            .unwrap(),
        GrantOutcome::Denied(Denial { reason }) if reason.contains("unknown share class")
    ));

    // Every call above reused the single pooled connection.
    assert_eq!(client.pool().idle_count(), 1);
    ledger.shutdown().await;
}

#[tokio::test]
async fn concurrent_clients_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = TestLedger::spawn(&dir.path().join("ledger.log"), "127.0.0.1:0", &[("CS", 500)]).await;
    let client = Arc::new(client_for(&ledger.addr));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..5 {
                    if let GrantOutcome::Issued(cert) =
                        client.request_grant(&format!("holder-{i}"), cs(), 7).await.unwrap()
                    {
                        ids.push(cert.cert_id.sequence());
                    }
                }
                ids
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.extend(task.await.unwrap());
    }
    ids.sort_unstable();

    // 500 / 7 = 71 grants fit out of 100 attempts.
    assert_eq!(ids, (1..=71).collect::<Vec<_>>());
    ledger.shutdown().await;
}

#[tokio::test]
async fn restart_is_transparent_and_sequence_continues() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("ledger.log");

    let first = TestLedger::spawn(&log_path, "127.0.0.1:0", &[("CS", 100)]).await;
    let addr = first.addr.clone();
    let client = client_for(&addr);

    assert_eq!(issued_id(client.request_grant("a", cs(), 10).await.unwrap()), "CS-1");
    assert_eq!(issued_id(client.request_grant("b", cs(), 10).await.unwrap()), "CS-2");
    assert_eq!(client.pool().idle_count(), 1);

    // The pooled connection dies with the old process.
    first.shutdown().await;

    // Same address, same log, generous re-registration that must be ignored.
    let second = TestLedger::spawn(&log_path, &addr, &[("CS", 1_000_000)]).await;

    assert_eq!(issued_id(client.request_grant("c", cs(), 80).await.unwrap()), "CS-3");
    assert!(matches!(
        client.request_grant("d", cs(), 1).await.unwrap(),
        GrantOutcome::Denied(_)
    ));
    second.shutdown().await;

    assert_eq!(
        std::fs::read_to_string(&log_path).unwrap(),
        "|CS:90:1\n|CS:80:2\n|CS:0:3\n"
    );
}
