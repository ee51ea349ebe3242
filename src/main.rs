use anyhow::{Context, Result};
use axum::serve;
use private_tracker::core::config::Config;
use private_tracker::core::routes::build_router;
use private_tracker::core::startup::{seed_whitelist, shutdown, spawn_cleanup_task, spawn_flush_task};
use private_tracker::core::state::AppState;
use private_tracker::core::tracing_init::init_tracing;
use private_tracker::stores::registry::StoreRegistry;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    // Load and validate configuration
    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        If this is your first time running the tracker, copy config.example.toml to config.toml and adjust the values.",
        config_path.display()
    ))?;

    init_tracing(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        listen = %config.server.listen,
        num_threads = config.server.num_threads,
        public = config.tracker.public,
        store_driver = %config.store.driver,
        log_level = %config.logging.level,
        "Private tracker starting"
    );

    let registry = StoreRegistry::with_defaults();
    let store = registry
        .build(&config.store)
        .context(format!("Available store drivers: {:?}", registry.names()))?;

    let state = Arc::new(AppState::new(config.clone(), store));

    let seeded = seed_whitelist(&state)
        .await
        .context("Failed to seed client whitelist")?;
    info!(added = seeded, configured = config.whitelist.len(), "Client whitelist seeded");

    spawn_cleanup_task(Arc::clone(&state));
    spawn_flush_task(Arc::clone(&state));

    info!(
        cleanup_interval_seconds = config.tracker.cleanup_interval,
        peer_timeout_seconds = config.tracker.peer_timeout,
        sync_interval_seconds = config.tracker.sync_interval,
        "Background tasks started"
    );

    let app = build_router(Arc::clone(&state)).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
            )
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout))),
    );

    let listener = TcpListener::bind(config.server.listen)
        .await
        .context(format!("Failed to bind TCP listener to {}", config.server.listen))?;

    info!(address = %config.server.listen, "Listening");

    serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped, flushing pending stats");
    shutdown(&state).await;
    info!("Shut down gracefully");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
