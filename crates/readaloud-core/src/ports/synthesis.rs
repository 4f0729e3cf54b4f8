//! Synthesis engine port.
//!
//! The engine is a black box: text in, PCM samples out, given a prepared
//! voice prompt and a trailing-silence parameter.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::tokenizer::SpeechTokenizer;
use crate::error::VoiceError;

// ── Shared types ───────────────────────────────────────────────────

/// Audio produced by one synthesis call.
#[derive(Debug, Clone)]
pub struct TtsAudio {
    /// PCM f32 samples, mono.
    pub samples: Vec<f32>,

    /// Sample rate of the audio (e.g., 24 000 Hz for Kokoro).
    pub sample_rate: u32,

    /// Duration of the audio.
    pub duration: Duration,
}

impl TtsAudio {
    /// Build from samples, deriving the duration.
    #[must_use]
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration = if sample_rate == 0 {
            Duration::ZERO
        } else {
            #[allow(clippy::cast_precision_loss)]
            Duration::from_secs_f64(samples.len() as f64 / f64::from(sample_rate))
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }
}

/// Information about an available voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    /// Voice identifier (used in API calls).
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Language/accent category.
    pub category: String,

    pub gender: VoiceGender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoiceGender {
    Female,
    Male,
}

/// Convenience constructor for [`VoiceInfo`].
#[must_use]
pub fn voice_info(id: &str, name: &str, category: &str, gender: VoiceGender) -> VoiceInfo {
    VoiceInfo {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        gender,
    }
}

/// Per-voice conditioning state, prepared once per session.
///
/// Every synthesis call receives its own clone, so a backend may consume or
/// mutate the state freely without affecting later chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePrompt {
    /// Voice id the prompt was prepared for.
    pub voice: String,

    /// Backend speaker index, for multi-speaker models.
    pub speaker_id: i32,

    /// Backend-defined conditioning data (may be empty).
    pub state: Vec<f32>,
}

impl VoicePrompt {
    #[must_use]
    pub fn new(voice: impl Into<String>, speaker_id: i32) -> Self {
        Self {
            voice: voice.into(),
            speaker_id,
            state: Vec::new(),
        }
    }
}

/// One synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub prompt: VoicePrompt,
    /// Frames generated past the detected end of speech.
    pub trailing_frames: usize,
}

/// Frames to keep generating after the end-of-speech token.
///
/// Short texts get more padding so their endings are not clipped; two extra
/// frames are always added.
#[must_use]
pub fn trailing_frames_after_end(text: &str) -> usize {
    let words = text.split_whitespace().count();
    let base = if words <= 4 { 3 } else { 1 };
    base + 2
}

// ── Synthesizer trait ──────────────────────────────────────────────

/// Backend-agnostic speech synthesizer.
///
/// Implementations must be `Send + Sync`: one instance is shared by every
/// session worker. `synthesize` is CPU or accelerator bound, so
/// implementations should move inference off the async executor (e.g.
/// `tokio::task::spawn_blocking`).
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Output sample rate (Hz).
    fn sample_rate(&self) -> u32;

    /// Whether the model is loaded and able to synthesize.
    fn is_ready(&self) -> bool {
        true
    }

    /// The engine's tokenizer, used to decide chunk boundaries.
    fn tokenizer(&self) -> Arc<dyn SpeechTokenizer>;

    /// Prepare the conditioning state for `voice`.
    async fn prepare_voice(&self, voice: &str) -> Result<VoicePrompt, VoiceError>;

    /// Synthesize one chunk of text.
    async fn synthesize(&self, request: SynthesisRequest) -> Result<TtsAudio, VoiceError>;

    /// List all available voices with metadata.
    fn available_voices(&self) -> Vec<VoiceInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_texts_get_more_trailing_frames() {
        assert_eq!(trailing_frames_after_end("Hi."), 5);
        assert_eq!(trailing_frames_after_end("one two three four"), 5);
        assert_eq!(trailing_frames_after_end("one two three four five"), 3);
        assert_eq!(trailing_frames_after_end(""), 5);
    }

    #[test]
    fn audio_duration_from_samples() {
        let audio = TtsAudio::from_samples(vec![0.0; 12_000], 24_000);
        assert_eq!(audio.duration, Duration::from_millis(500));
        assert_eq!(TtsAudio::from_samples(vec![0.0; 10], 0).duration, Duration::ZERO);
    }
}
