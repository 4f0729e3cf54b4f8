//! Route definitions and router construction.
//!
//! Paths come from `readaloud_core::contracts::http::tts` so the server and
//! the HTTP client cannot drift apart.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use readaloud_core::contracts::http::tts as paths;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Speech queue routes, without state applied.
pub(crate) fn tts_routes() -> Router<AppState> {
    Router::new()
        .route(paths::QUEUES, post(handlers::tts::create_queue))
        .route(
            paths::QUEUE,
            get(handlers::tts::queue_info).delete(handlers::tts::cancel_queue),
        )
        .route(paths::QUEUE_TEXT, post(handlers::tts::add_text))
        .route(paths::QUEUE_END, post(handlers::tts::end_queue))
        .route(paths::QUEUE_POLL, post(handlers::tts::poll))
        .route(paths::VOICES, get(handlers::tts::voices))
        .route(paths::STATUS, get(handlers::tts::status))
}

/// Create the main Axum router.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .merge(tts_routes().with_state(state).layer(cors))
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
