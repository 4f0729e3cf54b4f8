//! Axum web server adapter for readaloud.
//!
//! Exposes the queue lifecycle of [`TtsQueueService`](readaloud_tts::TtsQueueService)
//! as a JSON API under `/api/tts`. Handlers are thin: each calls one
//! service method and maps [`QueueError`](readaloud_core::QueueError) through
//! [`HttpError`].

#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings; these serve the integration tests.
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use readaloud_playback as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export primary types
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, serve, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
