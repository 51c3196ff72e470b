use std::sync::Arc;

use anyhow::{Context, Result};
use footballbin_mcp::{api, config::Config, store::SqliteStore, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "footballbin_mcp=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let store = SqliteStore::open(&config.db_path, config.tables.clone()).with_context(|| {
        format!(
            "Failed to open prediction store at {}",
            config.db_path.display()
        )
    })?;

    let bind_addr = config.bind_addr;
    let app = api::router(AppState::new(config, Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("footballbin-mcp listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
