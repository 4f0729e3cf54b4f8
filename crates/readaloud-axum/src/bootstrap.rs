//! Axum server bootstrap: the composition root.
//!
//! Loads the synthesis backend (if a model directory is configured), builds
//! the queue service and serves the router until cancelled.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use readaloud_core::Settings;
use readaloud_tts::backend::load_backend;
use readaloud_tts::{QueueConfig, TtsQueueService};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::routes::create_router;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Port for the HTTP server (0 picks a free port).
    pub port: u16,
    /// Speech model directory. Without one, queue creation reports
    /// `MODEL_UNAVAILABLE`.
    pub model_dir: Option<PathBuf>,
    pub queue: QueueConfig,
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            model_dir: settings.model_dir.clone(),
            queue: QueueConfig::from_settings(settings),
            cors: CorsConfig::default(),
        }
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Application context for the Axum adapter.
pub struct AxumContext {
    /// Speech queue registry shared by every handler.
    pub tts: Arc<TtsQueueService>,
}

impl AxumContext {
    pub const fn new(tts: Arc<TtsQueueService>) -> Self {
        Self { tts }
    }
}

/// Build the queue service, loading the backend from `config.model_dir`.
///
/// A backend that fails to load is logged and left unset; the server still
/// starts and reports the model as unavailable.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let service = Arc::new(TtsQueueService::new(config.queue.clone()));

    if let Some(dir) = config.model_dir.clone() {
        info!(model_dir = %dir.display(), "Loading speech model");
        match tokio::task::spawn_blocking(move || load_backend(&dir)).await? {
            Ok(backend) => {
                info!(sample_rate = backend.sample_rate(), "Speech model loaded");
                service.set_backend(Some(backend));
            }
            Err(e) => warn!(error = %e, "Speech model not loaded"),
        }
    } else {
        warn!("No model directory configured; queues will report MODEL_UNAVAILABLE");
    }

    Ok(AxumContext::new(service))
}

/// Serve `ctx` on a pre-bound listener until `cancel` fires.
///
/// On shutdown every live queue is cancelled.
pub async fn serve(
    listener: TcpListener,
    ctx: AxumContext,
    cors: CorsConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    let tts = Arc::clone(&ctx.tts);
    let app = create_router(ctx, &cors);

    info!("readaloud server listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    tts.shutdown();
    info!("readaloud server shut down");
    Ok(())
}

/// Bootstrap and serve on `config.host:config.port`.
pub async fn start_server(config: ServerConfig, cancel: CancellationToken) -> Result<()> {
    let ctx = bootstrap(&config).await?;
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    serve(listener, ctx, config.cors, cancel).await
}
