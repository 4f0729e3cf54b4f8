//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Streaming text-to-speech with read-along.
#[derive(Parser)]
#[command(name = "readaloud")]
#[command(about = "Stream text to speech and follow along as it plays")]
#[command(version)]
pub struct Cli {
    /// JSON settings file, layered under command-line flags
    #[arg(long, global = true, env = "READALOUD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
