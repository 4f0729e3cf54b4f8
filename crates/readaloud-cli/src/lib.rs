//! `readaloud` command-line interface.
//!
//! `main.rs` is the composition root; this library holds the parser, the
//! settings layering and one handler per subcommand.

#![deny(unused_crate_dependencies)]

// Used by main.rs binary
use dotenvy as _;
use tracing_subscriber as _;

// Only referenced to forward the `sherpa` and `hf-tokenizer` features
use readaloud_tts as _;

pub mod commands;
pub mod config;
pub mod handlers;
pub mod parser;
pub mod progress;

// Re-export primary types for convenient access
pub use commands::Commands;
pub use parser::Cli;
