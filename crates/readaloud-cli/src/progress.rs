//! Terminal read-along line.

use indicatif::{ProgressBar, ProgressStyle};
use readaloud_playback::PlaybackState;

const TAIL_WIDTH: usize = 40;

/// Progress bar over the characters of the spoken text.
pub struct ReadAlongProgress {
    bar: ProgressBar,
    chars: Vec<char>,
}

impl ReadAlongProgress {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let bar = ProgressBar::new(chars.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix:8} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("█▓░")),
        );
        bar.set_prefix(state_label(PlaybackState::Idle));
        Self { bar, chars }
    }

    pub fn set_position(&self, chars: usize) {
        self.bar.set_position(chars as u64);
        self.bar.set_message(spoken_tail(&self.chars, chars, TAIL_WIDTH));
    }

    pub fn set_state(&self, state: PlaybackState) {
        self.bar.set_prefix(state_label(state));
    }

    pub fn warn(&self, message: &str) {
        self.bar.println(format!("error: {message}"));
    }

    pub fn finish(&self) {
        self.bar.set_prefix(state_label(PlaybackState::Finished));
        self.bar.finish();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

const fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "waiting",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
        PlaybackState::Finished => "done",
    }
}

/// The last `width` characters before `pos`, on one line.
fn spoken_tail(chars: &[char], pos: usize, width: usize) -> String {
    let end = pos.min(chars.len());
    let start = end.saturating_sub(width);
    let tail: String = chars[start..end]
        .iter()
        .map(|&c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    tail.trim_start().to_string()
}
