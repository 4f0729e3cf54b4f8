//! Error taxonomy shared by the generation and delivery sides.

use std::path::PathBuf;

/// Failures of the queue lifecycle operations.
///
/// The HTTP adapter maps each variant onto a status code and a stable
/// `type` discriminant; remote clients map it back with
/// [`QueueError::from_type_code`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Unknown queue id.
    #[error("Queue not found: {0}")]
    NotFound(String),

    /// Text was submitted after the end marker was enqueued.
    #[error("Queue already ended: {0}")]
    AlreadyEnded(String),

    /// The synthesis backend is not loaded or not ready.
    #[error("Speech model unavailable: {0}")]
    ModelUnavailable(String),

    /// Synthesis failed while the worker was processing a chunk.
    #[error("Speech generation failed: {0}")]
    GenerationFailure(String),

    /// The channel to a remote delivery endpoint failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl QueueError {
    /// Stable discriminant used on the wire.
    #[must_use]
    pub const fn type_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyEnded(_) => "ALREADY_ENDED",
            Self::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            Self::GenerationFailure(_) => "GENERATION_FAILURE",
            Self::Transport(_) => "TRANSPORT",
        }
    }

    /// Rebuild an error from its wire discriminant and message.
    ///
    /// Unknown discriminants become [`QueueError::Transport`].
    #[must_use]
    pub fn from_type_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "NOT_FOUND" => Self::NotFound(message),
            "ALREADY_ENDED" => Self::AlreadyEnded(message),
            "MODEL_UNAVAILABLE" => Self::ModelUnavailable(message),
            "GENERATION_FAILURE" => Self::GenerationFailure(message),
            _ => Self::Transport(message),
        }
    }
}

/// Errors raised at the synthesis and tokenizer boundary.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Model file not found at expected path.
    #[error("Voice model not found at {0}")]
    ModelNotFound(PathBuf),

    /// Failed to load the synthesis model.
    #[error("Failed to load TTS model: {0}")]
    ModelLoadError(String),

    /// Unknown voice id.
    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    /// Failed to synthesize speech.
    #[error("Speech synthesis failed: {0}")]
    SynthesisError(String),

    /// Failed to load or run the tokenizer.
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),
}

impl From<VoiceError> for QueueError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::ModelNotFound(_)
            | VoiceError::ModelLoadError(_) => Self::ModelUnavailable(err.to_string()),
            other => Self::GenerationFailure(other.to_string()),
        }
    }
}
