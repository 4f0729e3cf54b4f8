//! Synthesis backends and tokenizer loading.
//!
//! | Feature        | Module             | Provides                     |
//! |----------------|--------------------|------------------------------|
//! | `sherpa`       | [`sherpa`]         | Kokoro synthesis via sherpa  |
//! | `hf-tokenizer` | [`hf_tokenizer`]   | `tokenizer.json` tokenizer   |
//!
//! Without `hf-tokenizer`, or without a `tokenizer.json` next to the model,
//! chunking uses the built-in [`RuleTokenizer`].

#[cfg(feature = "hf-tokenizer")]
pub mod hf_tokenizer;
#[cfg(feature = "sherpa")]
pub mod sherpa;

use std::path::Path;
use std::sync::Arc;

use readaloud_core::{RuleTokenizer, SpeechSynthesizer, SpeechTokenizer, VoiceError};

/// File name of a HuggingFace tokenizer inside a model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Load the tokenizer that matches the model in `model_dir`.
pub fn load_tokenizer(model_dir: &Path) -> Arc<dyn SpeechTokenizer> {
    #[cfg(feature = "hf-tokenizer")]
    {
        let path = model_dir.join(TOKENIZER_FILE);
        if path.exists() {
            match hf_tokenizer::HfTokenizer::from_file(&path) {
                Ok(tokenizer) => return Arc::new(tokenizer),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Falling back to rule tokenizer");
                }
            }
        }
    }

    tracing::debug!(dir = %model_dir.display(), "Using rule tokenizer");
    Arc::new(RuleTokenizer)
}

/// Load the synthesis backend from `model_dir`.
pub fn load_backend(model_dir: &Path) -> Result<Arc<dyn SpeechSynthesizer>, VoiceError> {
    if !model_dir.exists() {
        return Err(VoiceError::ModelNotFound(model_dir.to_path_buf()));
    }
    load_engine(model_dir)
}

#[cfg(feature = "sherpa")]
fn load_engine(model_dir: &Path) -> Result<Arc<dyn SpeechSynthesizer>, VoiceError> {
    let tokenizer = load_tokenizer(model_dir);
    let backend = sherpa::SherpaSynthesizer::load(model_dir, tokenizer)?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "sherpa"))]
fn load_engine(_model_dir: &Path) -> Result<Arc<dyn SpeechSynthesizer>, VoiceError> {
    Err(VoiceError::ModelLoadError(
        "built without a synthesis backend (enable the `sherpa` feature)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_dir_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            load_backend(&missing),
            Err(VoiceError::ModelNotFound(_))
        ));
    }

    #[test]
    fn empty_dir_uses_rule_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = load_tokenizer(dir.path());
        assert_eq!(tokenizer.tokenize("Hi there.").len(), 3);
        assert_eq!(tokenizer.sentence_end_ids().len(), 4);
    }
}
