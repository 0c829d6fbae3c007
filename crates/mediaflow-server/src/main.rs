//! Mediaflow Server - Main entry point

use anyhow::Result;
use mediaflow_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mediaflow_server::{
    api::{self, AppState},
    config::Config,
    pipeline::{HttpDownloader, MediaPipeline, ScreenshotSigner},
    records::AirtableClient,
    storage::S3Store,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("mediaflow-server".to_string())
        .filter_directives("mediaflow_server=debug,tower_http=debug,aws_config=warn".to_string())
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting mediaflow server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let timeout = Duration::from_secs(config.pipeline.http_timeout_secs);

    let store = S3Store::new(config.storage.clone()).await?;
    info!(bucket = %store.bucket(), "Storage client initialized");

    let records = AirtableClient::new(config.records.clone(), timeout)?;
    let downloader = HttpDownloader::new(timeout)?;

    let pipeline = MediaPipeline::new(
        Arc::new(downloader),
        Arc::new(store),
        Arc::new(records),
        ScreenshotSigner::new(config.screenshot.clone()),
        config.pipeline.clone(),
    );

    let shutdown = CancellationToken::new();
    let state = AppState {
        pipeline: Arc::new(pipeline),
        shutdown: shutdown.clone(),
    };

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown, config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel every in-flight ingestion
async fn shutdown_signal(shutdown: CancellationToken, timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    shutdown.cancel();

    // In-flight requests observe the cancellation and return 503
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
