//! # schemagate: Binary Entry Point
//!
//! Parses flags, bootstraps the schema registry, starts the directory
//! watcher, and serves HTTP until interrupted.

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use schemagate_api::bootstrap::bootstrap;
use schemagate_api::{AppConfig, ServerArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // RUST_LOG wins; otherwise --verbose raises this workspace and request
    // tracing to debug.
    let default_filter = if args.verbose {
        "info,schemagate_api=debug,schemagate_registry=debug,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = AppConfig::try_from(args)?;
    let bind_address = config.bind_address();

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    let state = bootstrap(config)
        .map_err(|e| {
            tracing::error!("Bootstrap failed: {e}");
            e
        })?
        .with_metrics(metrics);

    let _watch = std::sync::Arc::clone(&state.reconciler)
        .watch()
        .context("failed to watch schemas directory")?;

    let app = schemagate_api::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!("schemagate listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("schemagate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
