use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use daily_log_backend::{build_router, build_service, config::Config, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config = Config::from_env();
    let service = build_service(&config);

    // Open the store eagerly so a bad DATABASE_URL shows up in the startup log.
    // Requests still connect lazily if this fails.
    if let Err(e) = service.connections().connect().await {
        warn!("Log store not reachable yet: {}", e);
    }

    let app = build_router(&config, service);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_address))?;

    info!("Server running on http://{}", config.bind_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
