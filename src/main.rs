//! fanout-hub server entry point.
//!
//! Starts the pool control loop and the Axum HTTP server with the
//! WebSocket endpoints.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fanout_hub::app::build_app;
use fanout_hub::app_state::AppState;
use fanout_hub::config::HubConfig;
use fanout_hub::domain::{Pool, PoolExit};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = HubConfig::from_env().context("invalid LISTEN_ADDR")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting fanout-hub");

    // Start the pool
    let (pool, pool_task) = Pool::spawn(config.pool);
    tokio::spawn(async move {
        match pool_task.await {
            Ok(PoolExit::BroadcastFault { client_id }) => {
                tracing::error!(client_id = %client_id, "pool stopped; restart the process to resume fan-out");
            }
            Ok(PoolExit::AllHandlesDropped) => {}
            Err(e) => tracing::error!(error = %e, "pool task failed"),
        }
    });

    // Build router
    let listen_addr = config.listen_addr;
    let app = build_app(AppState::new(pool, config));

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
