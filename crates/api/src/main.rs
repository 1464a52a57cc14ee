use std::sync::Arc;

use anyhow::Context;

use stockcert_client::{ConnectionPool, GrantClient, PoolConfig};
use stockcert_infra::FrontendConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockcert_observability::init();

    let config = FrontendConfig::from_env()?;
    let pool = ConnectionPool::new(
        PoolConfig::new(config.ledger_addr.clone()).with_max_retries(config.max_retries),
    );
    let client = Arc::new(GrantClient::new(pool, config.company.clone()));

    let app = stockcert_api::app::build_app(client);

    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;

    tracing::info!(ledger = %config.ledger_addr, "listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
