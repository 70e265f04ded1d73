//! Log Sift Server
//!
//! HTTP service that extracts error statistics from uploaded log files and
//! summarizes them with an OpenAI-compatible backend

use anyhow::{Context, Result};
use logsift::config::settings::LoggingConfig;
use logsift::{create_router, version_info, Settings};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("Failed to load server settings")?;

    // Initialize logging
    init_logging(&settings.logging)?;
    info!("{}", version_info());

    let shutdown = CancellationToken::new();

    // Create router
    let app = create_router(settings.clone(), shutdown.clone()).await?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Log Sift server started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("🔍 Analysis endpoint: http://{}/basic-analysis/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    info!("Server stopped");
    Ok(())
}

/// Wait for ctrl-c, then cancel every in-flight pipeline
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }

    info!("Shutdown signal received, cancelling in-flight generations");
    shutdown.cancel();
}

/// Initialize logging system
fn init_logging(config: &LoggingConfig) -> Result<()> {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        // JSON format logs (production environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(config.level.as_str())
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format (development environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(config.level.as_str())
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("Logging system initialized");
    Ok(())
}
