use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use scholaris::logging::{init_tracing, shutdown_tracer};
use scholaris::metrics::{init_metrics, metrics_app};
use scholaris::modules::start_cortex;
use scholaris::router::init_router;
use scholaris::state::init_app_state;
use scholaris_config::ServerConfig;
use scholaris_db::run_migrations;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let server_config = ServerConfig::from_env();
    init_tracing(&server_config.service_name)?;

    let (state, inbox) = init_app_state().await?;
    run_migrations(&state.db)
        .await
        .context("Failed to run database migrations")?;

    start_cortex(&state, inbox)?;

    match init_metrics() {
        Ok(Some(handle)) => {
            let addr = SocketAddr::from(([0, 0, 0, 0], server_config.metrics_port));
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context("Failed to bind metrics port")?;
            info!(%addr, "Metrics exporter listening");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                    error!(error = %e, "Metrics server stopped");
                }
            });
        }
        Ok(None) => info!("Observability disabled, metrics exporter not started"),
        Err(e) => error!(error = %e, "Failed to install metrics recorder"),
    }

    let app = init_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.user_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, service = %server_config.service_name, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown_tracer().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
