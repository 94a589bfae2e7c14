//! HTTP surface: an axum router over the flows in [`crate::generate`].
//!
//! | Route                   | Flow                                    |
//! |-------------------------|-----------------------------------------|
//! | `POST /ai`              | analysis, JSON in / JSON out            |
//! | `POST /ai/transliterate`| transliteration, same contract as `/ai` |
//! | `POST /generate-docx`   | document generation, DOCX download      |
//! | `GET /health`           | liveness                                |
//! | anything else           | static files, when configured           |
//!
//! The model client is built once at startup and shared through
//! [`AppState`].

mod download;
mod handlers;

pub use download::attachment_response;
pub use handlers::{
    analyze_handler, generate_docx_handler, health_handler, transliterate_handler, TextRequest,
    TopicRequest,
};

use crate::config::{GenerationConfig, ServerConfig};
use crate::error::DocGenError;
use crate::model::ModelClient;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ModelClient>,
    pub config: Arc<GenerationConfig>,
}

impl AppState {
    pub fn new(client: Arc<dyn ModelClient>, config: GenerationConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

/// Build the router with CORS, request tracing and the optional static
/// fallback.
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/ai", post(analyze_handler))
        .route("/ai/transliterate", post(transliterate_handler))
        .route("/generate-docx", post(generate_docx_handler));

    if let Some(dir) = &server.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `server.addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, server: &ServerConfig) -> Result<(), DocGenError> {
    let router = create_router(state, server);
    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .map_err(|e| DocGenError::Internal(format!("Failed to bind {}: {}", server.addr, e)))?;

    info!("Server running on http://{}", server.addr);
    if let Some(dir) = &server.static_dir {
        info!("Serving static files from {}", dir.display());
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DocGenError::Internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
