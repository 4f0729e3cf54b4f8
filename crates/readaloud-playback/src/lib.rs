//! Client-side playback for readaloud.
//!
//! [`ReadAlongPlayer`] streams text into a [`DeliveryPort`] (in-process
//! service or [`HttpDeliveryClient`]), pulls synthesized chunks, schedules
//! them gaplessly on an [`AudioOutput`](output::AudioOutput) and reports
//! which character is being spoken.
//!
//! [`DeliveryPort`]: readaloud_core::DeliveryPort

#![deny(unused_crate_dependencies)]

// Integration tests drive the player against the in-process queue service.
#[cfg(test)]
use readaloud_tts as _;
pub mod client;
pub mod error;
pub mod events;
pub mod output;
pub mod player;
pub mod scheduler;
pub mod timeline;

pub use client::HttpDeliveryClient;
pub use error::PlaybackError;
pub use events::PlaybackEvent;
pub use output::{AudioOutput, AudioOutputFactory, SpeakerFactory, VirtualFactory};
pub use player::{PlayerConfig, ReadAlongPlayer};
pub use scheduler::{PlaybackScheduler, PlaybackState};
pub use timeline::{ChunkTiming, Timeline, snap_to_word_end};
