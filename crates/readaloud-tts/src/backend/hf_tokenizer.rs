//! HuggingFace `tokenizer.json` adapter.

use std::collections::HashSet;
use std::path::Path;

use tokenizers::Tokenizer;

use readaloud_core::ports::is_sentence_end_text;
use readaloud_core::{SpeechTokenizer, Token, TokenId, VoiceError};

/// Tokenizer loaded from a `tokenizer.json` shipped with the model.
pub struct HfTokenizer {
    inner: Tokenizer,
}

impl HfTokenizer {
    pub fn from_file(path: &Path) -> Result<Self, VoiceError> {
        let inner = Tokenizer::from_file(path)
            .map_err(|e| VoiceError::TokenizerError(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "Loaded HuggingFace tokenizer");
        Ok(Self { inner })
    }
}

impl SpeechTokenizer for HfTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let encoding = match self.inner.encode(text, false) {
            Ok(encoding) => encoding,
            Err(e) => {
                tracing::warn!(error = %e, "Tokenization failed");
                return Vec::new();
            }
        };
        encoding
            .get_ids()
            .iter()
            .zip(encoding.get_offsets())
            .filter(|(_, (start, end))| end > start)
            .map(|(&id, &(start, end))| Token {
                id,
                span: start..end,
            })
            .collect()
    }

    fn sentence_end_ids(&self) -> HashSet<TokenId> {
        // Check the vocabulary entry itself; offsets of merged pieces may
        // include a word-boundary marker.
        let probe = readaloud_core::ports::tokenizer::SENTENCE_END_PROBE;
        self.tokenize(probe)
            .into_iter()
            .filter(|token| {
                self.inner
                    .id_to_token(token.id)
                    .is_some_and(|piece| is_sentence_end_text(piece.trim_start_matches(['▁', 'Ġ'])))
            })
            .map(|token| token.id)
            .collect()
    }
}
