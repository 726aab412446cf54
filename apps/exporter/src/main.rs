mod config;
mod errors;
mod export;
mod layout;
mod models;
mod normalize;
mod render;
mod routes;
mod source;
mod state;
mod view;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::SoftwareCapture;
use crate::routes::build_router;
use crate::source::{AssetPolicy, HttpResumeSource};
use crate::state::AppState;
use crate::view::ViewRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume exporter v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the upstream resume source
    let source = HttpResumeSource::new(
        &config.source_url,
        Duration::from_secs(config.source_timeout_secs),
        AssetPolicy {
            allowed_hosts: config.asset_allowed_hosts.clone(),
            max_bytes: config.max_asset_bytes,
        },
    )?;
    info!("Resume source: {}", config.source_url);

    // Initialize the capture backend
    let capture = SoftwareCapture {
        font: config.font,
        viewport_width: config.viewport_width,
        max_height_px: config.max_capture_height_px,
    };
    info!(
        "Capture backend: software, font {:?}, viewport {}px",
        config.font, config.viewport_width
    );

    let state = AppState {
        config: config.clone(),
        source: Arc::new(source),
        capture: Arc::new(capture),
        views: ViewRegistry::default(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
