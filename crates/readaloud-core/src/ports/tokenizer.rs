//! Tokenizer port used by the text chunker.

use std::collections::HashSet;
use std::ops::Range;

/// Numeric token identifier.
pub type TokenId = u32;

/// One token with the byte span of the input it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub span: Range<usize>,
}

/// Text used to derive the sentence-end token set.
pub const SENTENCE_END_PROBE: &str = ".!...?";

/// The synthesis engine's own tokenizer.
///
/// Chunk boundaries are decided on these tokens so that they match what the
/// engine will actually synthesize. Spans must be ordered, non-overlapping
/// byte ranges on `char` boundaries of the input.
pub trait SpeechTokenizer: Send + Sync {
    /// Tokenize `text`.
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Ids of the tokens that end a sentence.
    ///
    /// The default tokenizes [`SENTENCE_END_PROBE`] and keeps every token
    /// made only of terminal punctuation.
    fn sentence_end_ids(&self) -> HashSet<TokenId> {
        self.tokenize(SENTENCE_END_PROBE)
            .into_iter()
            .filter(|token| {
                SENTENCE_END_PROBE
                    .get(token.span.clone())
                    .is_some_and(is_sentence_end_text)
            })
            .map(|token| token.id)
            .collect()
    }
}

/// True when `piece` is non-empty and made only of `.`, `!`, `?` or `…`.
#[must_use]
pub fn is_sentence_end_text(piece: &str) -> bool {
    let piece = piece.trim();
    !piece.is_empty() && piece.chars().all(|c| matches!(c, '.' | '!' | '?' | '…'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_end_text_detection() {
        assert!(is_sentence_end_text("."));
        assert!(is_sentence_end_text("..."));
        assert!(is_sentence_end_text(" ?"));
        assert!(is_sentence_end_text("…"));
        assert!(!is_sentence_end_text(","));
        assert!(!is_sentence_end_text(""));
        assert!(!is_sentence_end_text("a."));
    }
}
