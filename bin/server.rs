// Ledger Core - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use tracing::info;

use ledger_core::api::{router, AppState};
use ledger_core::{init_logging, open_database, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config.log_filter);

    let conn = open_database(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    info!(path = %config.db_path.display(), "database opened");

    let app = router(AppState::new(conn));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "server running");
    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
