//! HTTP handlers.

pub mod tts;
