//! Sherpa-ONNX Kokoro backend, implementing [`SpeechSynthesizer`] via `sherpa-rs`.
//!
//! `KokoroTts::create` takes `&mut self`, so the engine sits behind an
//! `Arc<Mutex<…>>` and every call runs on `tokio::task::spawn_blocking`.
//! Sessions share the engine; the per-session state is just the speaker id
//! carried in the [`VoicePrompt`].

use std::path::Path;
use std::sync::{Arc, Mutex};

use sherpa_rs::tts::{KokoroTts, KokoroTtsConfig};

use readaloud_core::ports::voice_info;
use readaloud_core::{
    SpeechSynthesizer, SpeechTokenizer, SynthesisRequest, TtsAudio, VoiceError, VoiceGender,
    VoiceInfo, VoicePrompt,
};

/// Kokoro output sample rate (24 kHz).
pub const SHERPA_TTS_SAMPLE_RATE: u32 = 24_000;

/// Samples per trailing frame (80 ms at 24 kHz).
const FRAME_SAMPLES: usize = 1_920;

pub struct SherpaSynthesizer {
    engine: Arc<Mutex<KokoroTts>>,
    tokenizer: Arc<dyn SpeechTokenizer>,
    speed: f32,
}

impl SherpaSynthesizer {
    /// Load the Kokoro model from a directory.
    ///
    /// The directory must contain `model.onnx`, `voices.bin`, `tokens.txt`
    /// and an `espeak-ng-data/` directory.
    pub fn load(model_dir: &Path, tokenizer: Arc<dyn SpeechTokenizer>) -> Result<Self, VoiceError> {
        let model_path = model_dir.join("model.onnx");
        let voices_path = model_dir.join("voices.bin");
        let tokens_path = model_dir.join("tokens.txt");
        let data_dir = model_dir.join("espeak-ng-data");

        for path in [&model_path, &voices_path, &tokens_path, &data_dir] {
            if !path.exists() {
                return Err(VoiceError::ModelNotFound(path.clone()));
            }
        }

        tracing::info!(dir = %model_dir.display(), "Loading Sherpa Kokoro TTS model");

        let config = KokoroTtsConfig {
            model: path_to_string(&model_path)?,
            voices: path_to_string(&voices_path)?,
            tokens: path_to_string(&tokens_path)?,
            data_dir: path_to_string(&data_dir)?,
            length_scale: 1.0,
            ..Default::default()
        };
        let engine = KokoroTts::new(config);

        tracing::info!("Sherpa Kokoro TTS model loaded");

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            tokenizer,
            speed: 1.0,
        })
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for SherpaSynthesizer {
    fn sample_rate(&self) -> u32 {
        SHERPA_TTS_SAMPLE_RATE
    }

    fn tokenizer(&self) -> Arc<dyn SpeechTokenizer> {
        Arc::clone(&self.tokenizer)
    }

    async fn prepare_voice(&self, voice: &str) -> Result<VoicePrompt, VoiceError> {
        let speaker_id =
            speaker_id(voice).ok_or_else(|| VoiceError::UnknownVoice(voice.to_string()))?;
        Ok(VoicePrompt::new(voice, speaker_id))
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<TtsAudio, VoiceError> {
        let SynthesisRequest {
            text,
            prompt,
            trailing_frames,
        } = request;

        tracing::debug!(
            text_len = text.len(),
            voice = %prompt.voice,
            speaker_id = prompt.speaker_id,
            "Synthesizing speech (Sherpa Kokoro)"
        );

        let engine = Arc::clone(&self.engine);
        let speed = self.speed;
        let audio = tokio::task::spawn_blocking(move || {
            engine
                .lock()
                .map_err(|e| VoiceError::SynthesisError(format!("TTS engine lock poisoned: {e}")))
                .and_then(|mut guard| {
                    guard
                        .create(&text, prompt.speaker_id, speed)
                        .map_err(|e| VoiceError::SynthesisError(format!("{e}")))
                })
        })
        .await
        .map_err(|e| VoiceError::SynthesisError(format!("spawn_blocking join error: {e}")))??;

        let mut samples = audio.samples;
        samples.resize(samples.len() + trailing_frames * FRAME_SAMPLES, 0.0);

        let sample_rate = if audio.sample_rate > 0 {
            audio.sample_rate
        } else {
            SHERPA_TTS_SAMPLE_RATE
        };
        Ok(TtsAudio::from_samples(samples, sample_rate))
    }

    fn available_voices(&self) -> Vec<VoiceInfo> {
        sherpa_kokoro_voices()
    }
}

// ── Voice catalogue ────────────────────────────────────────────────
//
// Speaker ids are indices into the packed `voices.bin` style matrix of
// `kokoro-en-v0_19`.

const VOICES: [(&str, &str, &str, VoiceGender); 11] = [
    ("af", "Default", "American English", VoiceGender::Female),
    ("af_bella", "Bella", "American English", VoiceGender::Female),
    ("af_nicole", "Nicole", "American English", VoiceGender::Female),
    ("af_sarah", "Sarah", "American English", VoiceGender::Female),
    ("af_sky", "Sky", "American English", VoiceGender::Female),
    ("am_adam", "Adam", "American English", VoiceGender::Male),
    ("am_michael", "Michael", "American English", VoiceGender::Male),
    ("bf_emma", "Emma", "British English", VoiceGender::Female),
    ("bf_isabella", "Isabella", "British English", VoiceGender::Female),
    ("bm_george", "George", "British English", VoiceGender::Male),
    ("bm_lewis", "Lewis", "British English", VoiceGender::Male),
];

fn speaker_id(voice: &str) -> Option<i32> {
    VOICES
        .iter()
        .position(|(id, ..)| *id == voice)
        .and_then(|index| i32::try_from(index).ok())
}

/// All Kokoro voices with metadata. Usable without a loaded engine.
#[must_use]
pub fn sherpa_kokoro_voices() -> Vec<VoiceInfo> {
    VOICES
        .iter()
        .map(|(id, name, category, gender)| voice_info(id, name, category, *gender))
        .collect()
}

fn path_to_string(path: &Path) -> Result<String, VoiceError> {
    path.to_str()
        .map(ToString::to_string)
        .ok_or_else(|| VoiceError::ModelLoadError(format!("Invalid path: {}", path.display())))
}
