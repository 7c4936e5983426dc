//! Drawscan Server
//!
//! HTTP service that reads dimensions off scanned engineering drawings:
//! whole-document sweeps and single bounding-box extraction.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drawscan_server::config::Config;
use drawscan_server::routes;
use drawscan_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "drawscan_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Drawscan Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Tesseract: {} (lang={}, psm sparse={} dense={})",
        config.ocr.binary.display(),
        config.ocr.language,
        config.ocr.sparse_psm,
        config.ocr.dense_psm
    );
    tracing::info!(
        "Rendering at {} DPI (regions) / {} DPI (sweeps), max {} pages",
        config.extraction.region_dpi,
        config.extraction.sweep_dpi,
        config.extraction.max_pages
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    // Create application state
    let app_state = AppState::new(config);

    let recognizer = app_state.extraction().recognizer();
    if tokio::task::spawn_blocking(move || recognizer.is_available()).await.unwrap_or(false) {
        tracing::info!("Tesseract is available");
    } else {
        tracing::warn!("Tesseract is not available; extraction requests will return 503");
    }
    match app_state.extraction().extractor_name() {
        Some(provider) => tracing::info!("Structured extraction via {}", provider),
        None => tracing::info!("Structured extraction disabled"),
    }

    // Build router
    let app = routes::router(app_state);

    // Start server with graceful shutdown
    tracing::info!("Drawscan Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
