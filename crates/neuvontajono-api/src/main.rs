//! Main entry point for the neuvontajono server

use neuvontajono_api::build_router;
use neuvontajono_core::{
    Config,
    context_error::{ContextError, Result, ResultExt},
    init_logging,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal outside development
    let dotenv = dotenvy::dotenv();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };

    init_logging(&config.logging)?;

    if let Err(e) = dotenv {
        info!("No .env file loaded: {}", e);
    }
    if let Some(err) = config_error {
        warn!("Failed to load config ({}), using defaults", err);
    }

    info!(
        "Starting neuvontajono v{} on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port
    );

    let store = neuvontajono_database::connect(&config)
        .await
        .inspect_err(|e| error!("Failed to open store: {}", e))
        .with_context(|| "Store initialization failed")?;

    if let Err(e) = store.health_check().await {
        error!("Store health check failed: {}", e);
        return Err(ContextError::with_context(e, "Store health check failed"));
    }
    info!("Store health check passed");

    let app = build_router(config.clone(), store)?
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = format!("{}:{}", config.server.host, config.server.port)
        .parse::<SocketAddr>()
        .with_context(|| "Invalid server address")?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .with_context(|| "Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received terminate signal, shutting down gracefully...");
        },
    }
}
