use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// A run of buffered text the chunker decided is ready for synthesis.
///
/// `text` is the exact slice cut from the input stream, including any
/// whitespace that separated it from the next chunk, so concatenating chunk
/// texts reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
}

impl TextChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Text handed to the synthesizer.
    #[must_use]
    pub fn speech_text(&self) -> &str {
        self.text.trim()
    }

    /// Length in characters (Unicode scalar values).
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// True when there is nothing to speak.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.speech_text().is_empty()
    }
}

/// One synthesized chunk of a session.
///
/// `pcm` is mono signed 16-bit little-endian audio at the session's sample
/// rate. `char_start..char_end` is the range of the session text this audio
/// speaks.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub index: u32,
    pub pcm: Vec<u8>,
    pub char_start: usize,
    pub char_end: usize,
    pub duration_ms: f64,
}

impl AudioChunk {
    #[must_use]
    pub fn to_dto(&self) -> AudioChunkDto {
        AudioChunkDto {
            index: self.index,
            audio_base64: STANDARD.encode(&self.pcm),
            char_start: self.char_start,
            char_end: self.char_end,
            duration_ms: self.duration_ms,
        }
    }
}

/// Wire form of an [`AudioChunk`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunkDto {
    pub index: u32,
    pub audio_base64: String,
    pub char_start: usize,
    pub char_end: usize,
    pub duration_ms: f64,
}

impl AudioChunkDto {
    /// Decode the base64 payload back into an [`AudioChunk`].
    pub fn into_chunk(self) -> Result<AudioChunk, base64::DecodeError> {
        let pcm = STANDARD.decode(self.audio_base64.as_bytes())?;
        Ok(AudioChunk {
            index: self.index,
            pcm,
            char_start: self.char_start,
            char_end: self.char_end,
            duration_ms: self.duration_ms,
        })
    }
}
