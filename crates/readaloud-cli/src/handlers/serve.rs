//! Serve command handler.

use anyhow::Result;
use readaloud_axum::{ServerConfig, start_server};
use readaloud_core::Settings;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the HTTP server until Ctrl-C.
pub async fn execute(settings: &Settings) -> Result<()> {
    let config = ServerConfig::from_settings(settings);
    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down");
                cancel.cancel();
            }
        }
    });

    info!(
        bind = %settings.bind_addr(),
        min_tokens = settings.min_tokens,
        max_tokens = settings.max_tokens,
        default_voice = %settings.default_voice,
        "Starting readaloud server"
    );
    start_server(config, cancel).await
}
