//! HTTP surface of the rectification service.

mod extract;
pub mod handlers;

pub use extract::JsonBody;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::capabilities::{Extractor, LlmRectifierFactory, PdfExtractor, RectifierFactory};
use crate::error::ServiceResult;
use crate::types::ServiceConfig;

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServiceConfig,
    pub rectifiers: Arc<dyn RectifierFactory>,
    pub extractor: Arc<dyn Extractor>,
}

impl AppState {
    /// State wired to the HTTP rectification backend and the PDF extractor.
    pub fn from_config(config: ServiceConfig) -> ServiceResult<Self> {
        let rectifiers = Arc::new(LlmRectifierFactory::new(&config)?);
        Ok(Self::with_capabilities(
            config,
            rectifiers,
            Arc::new(PdfExtractor::new()),
        ))
    }

    pub fn with_capabilities(
        config: ServiceConfig,
        rectifiers: Arc<dyn RectifierFactory>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            config,
            rectifiers,
            extractor,
        }
    }
}

/// Build the HTTP routes.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Document operations
        .route("/api/rectify", post(handlers::rectify))
        .route("/api/convert", post(handlers::convert))
        // State
        .with_state(state)
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
