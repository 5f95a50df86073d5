//! Rectifier Service - Main Entry Point
//!
//! Serves document rectification and PDF conversion with streamed progress.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rectifier::api::{self, AppState};
use rectifier::types::ServiceConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "rectifier=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ServiceConfig::from_env().context("loading configuration")?;

    info!("Starting Rectifier Service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        model = %config.default_model,
        chunk_size = config.default_chunk_size,
        backend = %config.llm_base_url,
        "Configuration loaded"
    );
    if config.llm_api_key.is_none() {
        info!("No backend API key configured, sending unauthenticated requests");
    }

    let addr = config.bind_addr();
    let state = Arc::new(AppState::from_config(config).context("initializing capabilities")?);
    let app = api::router(state);

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
