//! Swaplens HTTP Server Binary
//!
//! This is the main entry point for the swaplens REST API server.
//! It loads the configuration, sets up the HTTP router, and starts serving
//! requests for the dashboard frontend.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin swaplens-server --features http-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `SWAPLENS_CONFIG`: Optional path to a TOML file with base values
//! - `SWAPLENS_TOLERANCE_SCALE`: Raw-units divisor for the tolerance slider
//! - `SWAPLENS_DEFAULT_TOLERANCE_RAW`: Initial tolerance in raw units
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use swaplens::config::AppConfig;
use swaplens::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting swaplens HTTP server");

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    info!(
        tolerance_scale = config.tolerance_scale,
        default_tolerance_raw = config.default_tolerance_raw,
        "Configuration loaded"
    );

    // Create application state with a fresh analysis session
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(config);

    // Create router with all endpoints
    let app = create_router(state);

    info!("Server listening on http://{}", addr);
    info!("API documentation: http://{}/health", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
