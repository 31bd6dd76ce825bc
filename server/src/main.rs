//! leafcure Server
//!
//! HTTP API for leaf disease identification. Accepts leaf photos, returns the
//! predicted disease with a cure suggestion, and serves the remedy catalog.

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use leafcure::utils::logging::{init_logging, LogConfig, LogLevel};
use tracing::{info, warn};

use crate::state::{AppState, ServerConfig};

/// leafcure Server
#[derive(Parser, Debug)]
#[command(name = "leafcure-server")]
#[command(version)]
#[command(about = "HTTP API for leaf disease identification")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "LEAFCURE_PORT", default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "LEAFCURE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Path to the model manifest
    #[arg(short, long, env = "LEAFCURE_MODEL", default_value = "models/tomato.json")]
    model: PathBuf,

    /// Load the model at startup and exit if it cannot be loaded
    #[arg(long, env = "LEAFCURE_EAGER_LOAD", default_value = "false")]
    eager_load: bool,

    /// Largest accepted image upload, in MiB
    #[arg(long, default_value = "10")]
    max_upload_mb: usize,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, env = "LEAFCURE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: LogLevel::from_name(&cli.log_level),
        ..LogConfig::production()
    };
    init_logging(&log_config).map_err(anyhow::Error::msg)?;

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        model_path: cli.model,
        eager_load: cli.eager_load,
        max_upload_bytes: ServerConfig::upload_limit_bytes(cli.max_upload_mb),
    };

    info!("leafcure Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Model:      {:?}", config.model_path);
    info!("  Backend:    {}", leafcure::backend::backend_name());
    info!("  Eager load: {}", config.eager_load);
    info!("  Max upload: {} bytes", config.max_upload_bytes);

    if !config.model_path.exists() {
        warn!(
            "Model manifest not found at {:?}. /diagnose will return 503 until it exists.",
            config.model_path
        );
    }

    let state = Arc::new(AppState::new(config));

    if state.config.eager_load {
        let handle = state.model.get_or_load().await?;
        info!("Model loaded: {} classes", handle.labels().len());
    }

    let addr: SocketAddr = state.config.bind_address().parse()?;
    let app = routes::router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
