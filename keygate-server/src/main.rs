//! KEYGATE HTTP Server binary

use keygate_core::{DocumentFetcher, Gate, GateConfig, HttpFetcher};
use keygate_server::metrics::MeteredFetcher;
use keygate_server::api::flag_enabled;
use keygate_server::{app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Config file from `KEYGATE_CONFIG`, otherwise `KEYGATE_*` variables
fn load_config() -> anyhow::Result<GateConfig> {
    match std::env::var("KEYGATE_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            Ok(GateConfig::from_file(&path)?)
        }
        Err(_) => {
            info!("Loading configuration from environment");
            Ok(GateConfig::from_env()?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let enable_otel = std::env::var("OTEL_ENABLED")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if enable_otel {
        keygate_server::tracing::init_tracing_stack("keygate-server")?;
        info!("OpenTelemetry tracing enabled");
    } else {
        keygate_server::tracing::init_console_logging()?;
        info!("Console logging enabled (set OTEL_ENABLED=true for OpenTelemetry)");
    }

    info!("Starting KEYGATE HTTP Server v{}", env!("CARGO_PKG_VERSION"));

    keygate_server::metrics::init_prometheus()?;
    keygate_server::metrics::init_metrics();

    let config = load_config()?;
    let http: Arc<dyn DocumentFetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);
    let fetcher = Arc::new(MeteredFetcher::new(http, config.documents.clone()));
    let gate = Arc::new(Gate::new(config, fetcher));

    let debug = std::env::var("DEBUG")
        .map(|value| flag_enabled(&value))
        .unwrap_or(false);
    let state = AppState::with_debug(gate, debug);

    let router = app(state);

    let addr: SocketAddr = std::env::var("BIND_ADDRESS")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, shutting down gracefully...");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    if enable_otel {
        info!("Flushing OpenTelemetry traces...");
        keygate_server::tracing::shutdown_telemetry();
    }

    info!("Server shutdown complete");
    Ok(())
}
