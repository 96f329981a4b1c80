//! Workforce Cache host process
//!
//! Mounts the caching subsystem, serves the diagnostics API and unmounts on
//! shutdown.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workforce_cache::api::create_router;
use workforce_cache::{AppState, CacheSubsystem, Config};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Mount the cache subsystem (sweep + image maintenance armed)
/// 4. Serve the diagnostics API on the configured port
/// 5. On SIGINT/SIGTERM, stop serving and unmount
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workforce_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Workforce Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}ms, sweep_interval={}s, image_expiry={}s, storage_dir={}",
        config.max_entries,
        config.default_ttl_ms,
        config.sweep_interval_secs,
        config.image_expiry_secs,
        config.storage_dir.display()
    );

    let subsystem = CacheSubsystem::mount_default(&config)
        .with_context(|| format!("Failed to mount cache storage at {}", config.storage_dir.display()))?;
    let state = AppState::new(subsystem);
    let subsystem = state.subsystem.clone();

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Diagnostics API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    subsystem.unmount();
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
