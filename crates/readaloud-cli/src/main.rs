//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use readaloud_cli::config::resolve_settings;
use readaloud_cli::handlers::say::SayOptions;
use readaloud_cli::{Cli, Commands, handlers};
use readaloud_core::SettingsUpdate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads `env` defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Client commands keep the terminal for the progress line
    let default_level = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Some(Commands::Serve { .. }), false) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve {
            host,
            port,
            model_dir,
            min_tokens,
            max_tokens,
            cleanup_grace_secs,
            default_voice,
        } => {
            let overrides = SettingsUpdate {
                min_tokens,
                max_tokens,
                cleanup_grace_secs,
                default_voice,
                host,
                port,
                model_dir: model_dir.map(Some),
                ..SettingsUpdate::default()
            };
            let settings = resolve_settings(cli.config.as_deref(), &overrides)?;
            handlers::serve::execute(&settings).await?;
        }
        Commands::Say {
            text,
            server,
            voice,
            word_delay_ms,
            silent,
            progress_interval_ms,
            finish_tolerance_ms,
        } => {
            let overrides = SettingsUpdate {
                progress_interval_ms,
                finish_tolerance_ms,
                ..SettingsUpdate::default()
            };
            let settings = resolve_settings(cli.config.as_deref(), &overrides)?;
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };
            let options = SayOptions {
                server: server.server,
                voice,
                word_delay: std::time::Duration::from_millis(word_delay_ms),
                silent,
            };
            handlers::say::execute(text, options, &settings).await?;
        }
        Commands::Voices { server } => handlers::voices::list(&server.server).await?,
        Commands::Status { server } => handlers::voices::status(&server.server).await?,
    }

    Ok(())
}
