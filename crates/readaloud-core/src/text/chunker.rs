//! Streaming text chunker.
//!
//! Buffers text as it arrives and emits chunks once enough tokens are
//! buffered, preferring to cut at sentence ends.
//!
//! - Below `min_tokens` nothing is emitted.
//! - Below `max_tokens` the whole buffer is emitted only if it ends a
//!   sentence.
//! - At or above `max_tokens` (or when forced by [`TextChunker::flush`]) the
//!   buffer is cut at the last sentence boundary within `max_tokens`; failing
//!   that at the first boundary past it; failing that exactly at
//!   `max_tokens`.
//!
//! Chunks are sliced from the buffer by token byte spans, so the
//! concatenation of all emitted chunk texts is exactly the input text.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::TextChunk;
use crate::ports::{SpeechTokenizer, Token, TokenId};

pub struct TextChunker {
    tokenizer: Arc<dyn SpeechTokenizer>,
    sentence_end: HashSet<TokenId>,
    min_tokens: usize,
    max_tokens: usize,
    buffer: String,
}

impl std::fmt::Debug for TextChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextChunker")
            .field("min_tokens", &self.min_tokens)
            .field("max_tokens", &self.max_tokens)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl TextChunker {
    /// Create a chunker. `max_tokens` is raised to at least 1.
    pub fn new(tokenizer: Arc<dyn SpeechTokenizer>, min_tokens: usize, max_tokens: usize) -> Self {
        let sentence_end = tokenizer.sentence_end_ids();
        Self {
            tokenizer,
            sentence_end,
            min_tokens,
            max_tokens: max_tokens.max(1),
            buffer: String::new(),
        }
    }

    /// Append `text` and return every chunk that became ready.
    pub fn add_text(&mut self, text: &str) -> Vec<TextChunk> {
        self.buffer.push_str(text);
        self.extract_ready(false)
    }

    /// Emit whatever remains. Called once at end of text.
    ///
    /// A whitespace-only remainder is still returned as a (silent) chunk so
    /// the character accounting covers the whole input.
    pub fn flush(&mut self) -> Vec<TextChunk> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        if self.buffer.trim().is_empty() {
            return vec![TextChunk::new(std::mem::take(&mut self.buffer))];
        }

        let mut chunks = self.extract_ready(true);
        if !self.buffer.is_empty() {
            chunks.push(TextChunk::new(std::mem::take(&mut self.buffer)));
        }
        chunks
    }

    /// Current buffered text.
    #[must_use]
    pub fn buffered_text(&self) -> &str {
        &self.buffer
    }

    /// Token count of the buffered text.
    #[must_use]
    pub fn buffered_token_count(&self) -> usize {
        self.tokenizer.tokenize(self.buffer.trim()).len()
    }

    /// Drop any buffered text.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn extract_ready(&mut self, force: bool) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        // Only the first extraction of a flush is forced.
        while let Some(chunk) = self.try_extract(force && chunks.is_empty()) {
            chunks.push(chunk);
        }
        chunks
    }

    fn try_extract(&mut self, force: bool) -> Option<TextChunk> {
        let trimmed_start = self.buffer.trim_start();
        let lead = self.buffer.len() - trimmed_start.len();
        let text = trimmed_start.trim_end();
        if text.is_empty() {
            return None;
        }

        let tokens = self.tokenizer.tokenize(text);
        let count = tokens.len();

        if count < self.min_tokens && !force {
            return None;
        }

        if count < self.max_tokens && !force {
            if self.ends_sentence(&tokens) {
                return Some(self.take_all());
            }
            return None;
        }

        let split = self.best_split(&tokens, force);
        if split == 0 {
            return force.then(|| self.take_all());
        }
        if split >= count {
            return Some(self.take_all());
        }

        let cut = lead + tokens[split].span.start;
        let rest = self.buffer.split_off(cut);
        Some(TextChunk::new(std::mem::replace(&mut self.buffer, rest)))
    }

    fn take_all(&mut self) -> TextChunk {
        TextChunk::new(std::mem::take(&mut self.buffer))
    }

    fn ends_sentence(&self, tokens: &[Token]) -> bool {
        tokens
            .last()
            .is_some_and(|t| self.sentence_end.contains(&t.id))
    }

    /// Token index to cut before; 0 means no cut.
    fn best_split(&self, tokens: &[Token], force: bool) -> usize {
        // Positions just after a run of sentence-end tokens.
        let mut boundaries = Vec::new();
        let mut prev_was_end = false;
        for (i, token) in tokens.iter().enumerate() {
            if self.sentence_end.contains(&token.id) {
                prev_was_end = true;
            } else if prev_was_end {
                boundaries.push(i);
                prev_was_end = false;
            }
        }
        if self.ends_sentence(tokens) {
            boundaries.push(tokens.len());
        }

        if boundaries.is_empty() {
            if tokens.len() >= self.max_tokens {
                return self.max_tokens;
            }
            return if force { tokens.len() } else { 0 };
        }

        let mut best = 0;
        for boundary in boundaries {
            if boundary <= self.max_tokens {
                best = boundary;
            } else {
                if best == 0 {
                    best = boundary;
                }
                break;
            }
        }
        best
    }
}
