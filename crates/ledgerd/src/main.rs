use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use stockcert_infra::LedgerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockcert_observability::init();

    let config = LedgerConfig::from_env()?;
    let ledger = Arc::new(
        stockcert_ledgerd::open_ledger(&config)
            .with_context(|| format!("failed to open ledger log {}", config.log_path.display()))?,
    );

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("ledger listening on {}", listener.local_addr()?);

    stockcert_ledgerd::serve(listener, ledger, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await?;

    Ok(())
}
