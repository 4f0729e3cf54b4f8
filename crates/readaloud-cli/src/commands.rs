//! Subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Where a client subcommand finds the server.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL of a running `readaloud serve`
    #[arg(long, env = "READALOUD_SERVER", default_value = "http://127.0.0.1:3109")]
    pub server: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the speech queue HTTP server
    Serve {
        /// Interface to bind
        #[arg(long, env = "READALOUD_HOST")]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long, env = "READALOUD_PORT")]
        port: Option<u16>,
        /// Directory with the speech model files
        #[arg(long, env = "READALOUD_MODEL_DIR")]
        model_dir: Option<PathBuf>,
        /// Minimum tokens buffered before a chunk is cut
        #[arg(long)]
        min_tokens: Option<usize>,
        /// Token count above which a chunk is forced
        #[arg(long)]
        max_tokens: Option<usize>,
        /// Seconds a finished queue stays pollable
        #[arg(long)]
        cleanup_grace_secs: Option<u64>,
        /// Voice used when a client does not pick one
        #[arg(long)]
        default_voice: Option<String>,
    },

    /// Speak text through a server with a live read-along line
    Say {
        /// Text to speak; read from stdin when omitted
        text: Option<String>,
        #[command(flatten)]
        server: ServerArgs,
        /// Voice id
        #[arg(long)]
        voice: Option<String>,
        /// Delay between streamed words, simulating incremental input
        #[arg(long, default_value = "0")]
        word_delay_ms: u64,
        /// Track timing without opening an audio device
        #[arg(long)]
        silent: bool,
        /// Read-along position sampling interval
        #[arg(long)]
        progress_interval_ms: Option<u64>,
        /// Slack when deciding the last chunk has played
        #[arg(long)]
        finish_tolerance_ms: Option<u64>,
    },

    /// List voices offered by the server
    Voices {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Show server model status
    Status {
        #[command(flatten)]
        server: ServerArgs,
    },
}
