//! HTTP route constants.

pub mod tts;
