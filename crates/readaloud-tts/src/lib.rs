//! Streaming speech queues.
//!
//! [`TtsQueueService`] owns a registry of sessions. Each session gets one
//! worker task that drains submitted text through a
//! [`TextChunker`](readaloud_core::TextChunker), synthesizes every ready
//! chunk and appends it to the session's chunk log, where `poll` picks it
//! up exactly once.

#![deny(unused_crate_dependencies)]

pub mod backend;
mod service;
mod session;
mod worker;

pub use service::{QueueConfig, TtsQueueService, new_queue_id};

