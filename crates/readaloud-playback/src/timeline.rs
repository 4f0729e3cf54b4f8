//! Time-to-text mapping for read-along highlighting.

/// Where one chunk sits on the output clock and in the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkTiming {
    pub char_start: usize,
    pub char_end: usize,
    /// Seconds on the output clock.
    pub audio_start: f64,
    pub audio_end: f64,
}

/// Chunk timings in index order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    timings: Vec<ChunkTiming>,
}

impl Timeline {
    pub fn push(&mut self, timing: ChunkTiming) {
        self.timings.push(timing);
    }

    pub fn timings(&self) -> &[ChunkTiming] {
        &self.timings
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// Character offset being spoken at output time `now`.
    ///
    /// Before the first chunk this is 0; past a chunk's end (including a gap
    /// before the next one) it is that chunk's `char_end`. Inside a chunk the
    /// offset is interpolated linearly and rounded down.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn char_position(&self, now: f64) -> usize {
        let Some(timing) = self.timings.iter().rev().find(|t| now >= t.audio_start) else {
            return 0;
        };
        if now >= timing.audio_end {
            return timing.char_end;
        }
        let duration = timing.audio_end - timing.audio_start;
        let progress = (now - timing.audio_start) / duration;
        let span = timing.char_end.saturating_sub(timing.char_start) as f64;
        timing.char_start + (progress * span).floor() as usize
    }
}

/// Move `offset` (in chars) forward to the end of the word it falls in.
///
/// Offsets at or past the end clamp to the text length; an offset already on
/// whitespace is kept.
pub fn snap_to_word_end(text: &str, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }
    let mut chars = text.chars().enumerate().skip(offset);
    match chars.find(|(_, c)| c.is_whitespace()) {
        Some((index, _)) => index,
        None => text.chars().count(),
    }
}
