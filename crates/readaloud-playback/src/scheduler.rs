//! Gapless chunk scheduling and the playback state machine.
//!
//! ```text
//! Idle ──first chunk scheduled──▶ Playing ◀──▶ Paused
//!                                    │
//!              all received and clock past the end
//!                                    ▼
//!                                 Finished
//! ```
//!
//! Chunks are scheduled strictly in index order at
//! `max(now, next_play_time)`, so late arrivals never overlap and never
//! leave gaps beyond what the network forced. Chunks that arrive while the
//! output is suspended wait in `pending` until [`PlaybackScheduler::resume`].

use std::collections::BTreeMap;

use readaloud_core::AudioChunk;
use readaloud_core::pcm::pcm16le_to_f32;
use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::output::AudioOutput;
use crate::timeline::{ChunkTiming, Timeline};

/// Client playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Finished,
}

#[derive(Debug)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    sample_rate: u32,
    next_play_time: f64,
    timeline: Timeline,
    /// In-order chunks held while the output is suspended.
    pending: Vec<AudioChunk>,
    /// Out-of-order arrivals, keyed by index.
    reorder: BTreeMap<u32, AudioChunk>,
    next_index: u32,
    all_received: bool,
    finish_tolerance: f64,
}

impl PlaybackScheduler {
    /// `finish_tolerance` is in seconds.
    pub fn new(sample_rate: u32, finish_tolerance: f64) -> Self {
        Self {
            state: PlaybackState::Idle,
            sample_rate,
            next_play_time: 0.0,
            timeline: Timeline::default(),
            pending: Vec::new(),
            reorder: BTreeMap::new(),
            next_index: 0,
            all_received: false,
            finish_tolerance,
        }
    }

    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub const fn next_play_time(&self) -> f64 {
        self.next_play_time
    }

    pub const fn all_received(&self) -> bool {
        self.all_received
    }

    /// Chunks received but not yet scheduled.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.reorder.is_empty()
    }

    /// Accept a delivered chunk and schedule everything now in order.
    pub fn receive(
        &mut self,
        chunk: AudioChunk,
        output: &mut dyn AudioOutput,
    ) -> Result<(), PlaybackError> {
        if chunk.index < self.next_index || self.reorder.contains_key(&chunk.index) {
            tracing::debug!(chunk_index = chunk.index, "Ignoring duplicate chunk");
            return Ok(());
        }
        self.reorder.insert(chunk.index, chunk);

        while let Some(chunk) = self.reorder.remove(&self.next_index) {
            self.next_index += 1;
            if output.is_suspended() {
                self.pending.push(chunk);
            } else {
                self.schedule(chunk, output)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn schedule(
        &mut self,
        chunk: AudioChunk,
        output: &mut dyn AudioOutput,
    ) -> Result<(), PlaybackError> {
        let samples = pcm16le_to_f32(&chunk.pcm);
        let duration = if self.sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / f64::from(self.sample_rate)
        };
        let start = output.current_time().max(self.next_play_time);

        if !samples.is_empty() {
            output.schedule(samples, start)?;
        }
        self.next_play_time = start + duration;
        self.timeline.push(ChunkTiming {
            char_start: chunk.char_start,
            char_end: chunk.char_end,
            audio_start: start,
            audio_end: self.next_play_time,
        });

        tracing::debug!(
            chunk_index = chunk.index,
            start,
            duration,
            "Scheduled chunk"
        );

        if self.state == PlaybackState::Idle {
            self.state = PlaybackState::Playing;
        }
        Ok(())
    }

    /// The server reported the session done.
    pub fn mark_all_received(&mut self) {
        self.all_received = true;
        if self.timeline.is_empty() && !self.has_pending() {
            self.state = PlaybackState::Finished;
        }
    }

    /// Suspend the output. Only meaningful while playing.
    pub fn pause(&mut self, output: &mut dyn AudioOutput) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        output.suspend()?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    /// Resume the output and schedule anything held while suspended.
    pub fn resume(&mut self, output: &mut dyn AudioOutput) -> Result<(), PlaybackError> {
        if self.state == PlaybackState::Finished {
            return Ok(());
        }
        if output.is_suspended() {
            output.resume()?;
        }
        for chunk in std::mem::take(&mut self.pending) {
            self.schedule(chunk, output)?;
        }
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
        Ok(())
    }

    /// Advance to `Finished` once all audio is in and played out.
    pub fn tick(&mut self, output: &dyn AudioOutput) {
        if self.state == PlaybackState::Playing
            && self.all_received
            && !self.has_pending()
            && output.current_time() >= self.next_play_time - self.finish_tolerance
        {
            self.state = PlaybackState::Finished;
        }
    }

    /// Raw character offset at the output's current time.
    pub fn char_position(&self, output: &dyn AudioOutput) -> usize {
        self.timeline.char_position(output.current_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Output driven by a manually set clock.
    #[derive(Default)]
    struct ManualOutput {
        now: f64,
        suspended: bool,
        scheduled: Vec<(f64, usize)>,
    }

    impl AudioOutput for ManualOutput {
        fn current_time(&self) -> f64 {
            self.now
        }

        fn schedule(&mut self, samples: Vec<f32>, start_at: f64) -> Result<(), PlaybackError> {
            self.scheduled.push((start_at, samples.len()));
            Ok(())
        }

        fn is_suspended(&self) -> bool {
            self.suspended
        }

        fn suspend(&mut self) -> Result<(), PlaybackError> {
            self.suspended = true;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), PlaybackError> {
            self.suspended = false;
            Ok(())
        }

        fn close(&mut self) {}
    }

    /// `samples` of silence at 100 Hz.
    fn chunk(index: u32, chars: std::ops::Range<usize>, samples: usize) -> AudioChunk {
        AudioChunk {
            index,
            pcm: vec![0; samples * 2],
            char_start: chars.start,
            char_end: chars.end,
            duration_ms: samples as f64 * 10.0,
        }
    }

    fn scheduler() -> PlaybackScheduler {
        PlaybackScheduler::new(100, 0.05)
    }

    fn assert_gapless(timeline: &Timeline) {
        for pair in timeline.timings().windows(2) {
            assert!((pair[0].audio_end - pair[1].audio_start).abs() < 1e-9);
            assert!(pair[0].audio_start <= pair[1].audio_start);
        }
    }

    #[test]
    fn first_chunk_starts_playing() {
        let mut out = ManualOutput::default();
        let mut s = scheduler();
        assert_eq!(s.state(), PlaybackState::Idle);
        s.receive(chunk(0, 0..5, 100), &mut out).unwrap();
        assert_eq!(s.state(), PlaybackState::Playing);
        assert!((s.next_play_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_order_chunks_are_scheduled_by_index() {
        let mut out = ManualOutput::default();
        let mut s = scheduler();
        s.receive(chunk(2, 9..12, 30), &mut out).unwrap();
        s.receive(chunk(1, 5..9, 20), &mut out).unwrap();
        assert!(s.timeline().is_empty());
        assert!(s.has_pending());

        s.receive(chunk(0, 0..5, 50), &mut out).unwrap();
        let chars: Vec<_> = s.timeline().timings().iter().map(|t| t.char_start).collect();
        assert_eq!(chars, vec![0, 5, 9]);
        assert_gapless(s.timeline());
        assert!(!s.has_pending());
    }

    #[test]
    fn late_chunk_starts_at_now() {
        let mut out = ManualOutput::default();
        let mut s = scheduler();
        s.receive(chunk(0, 0..5, 50), &mut out).unwrap();
        out.now = 2.0;
        s.receive(chunk(1, 5..9, 50), &mut out).unwrap();
        let timings = s.timeline().timings();
        assert!((timings[1].audio_start - 2.0).abs() < 1e-9);
        assert!((s.next_play_time() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut out = ManualOutput::default();
        let mut s = scheduler();
        s.receive(chunk(0, 0..5, 50), &mut out).unwrap();
        s.receive(chunk(0, 0..5, 50), &mut out).unwrap();
        assert_eq!(s.timeline().timings().len(), 1);
        assert_eq!(out.scheduled.len(), 1);
    }

    #[test]
    fn chunks_wait_while_suspended_and_resume_gaplessly() {
        let mut out = ManualOutput {
            suspended: true,
            ..ManualOutput::default()
        };
        let mut s = scheduler();
        s.receive(chunk(0, 0..5, 50), &mut out).unwrap();
        s.receive(chunk(1, 5..9, 50), &mut out).unwrap();
        assert_eq!(s.state(), PlaybackState::Idle);
        assert!(out.scheduled.is_empty());

        s.resume(&mut out).unwrap();
        assert!(!out.is_suspended());
        assert_eq!(s.state(), PlaybackState::Playing);
        assert_eq!(out.scheduled, vec![(0.0, 50), (0.5, 50)]);
        assert_gapless(s.timeline());
    }

    #[test]
    fn pause_resume_keeps_schedule_contiguous() {
        let mut out = ManualOutput::default();
        let mut s = scheduler();
        s.receive(chunk(0, 0..5, 100), &mut out).unwrap();
        out.now = 0.4;
        s.pause(&mut out).unwrap();
        assert_eq!(s.state(), PlaybackState::Paused);

        // Arrives while suspended.
        s.receive(chunk(1, 5..9, 100), &mut out).unwrap();
        assert_eq!(s.timeline().timings().len(), 1);

        s.resume(&mut out).unwrap();
        assert_eq!(s.state(), PlaybackState::Playing);
        let timings = s.timeline().timings();
        assert!((timings[1].audio_start - 1.0).abs() < 1e-9);
        assert_gapless(s.timeline());
    }

    #[test]
    fn finishes_after_all_received_and_played() {
        let mut out = ManualOutput::default();
        let mut s = scheduler();
        s.receive(chunk(0, 0..5, 100), &mut out).unwrap();

        out.now = 2.0;
        s.tick(&out);
        assert_eq!(s.state(), PlaybackState::Playing);

        s.mark_all_received();
        out.now = 0.9;
        s.tick(&out);
        assert_eq!(s.state(), PlaybackState::Playing);

        out.now = 0.96;
        s.tick(&out);
        assert_eq!(s.state(), PlaybackState::Finished);
    }

    #[test]
    fn empty_session_finishes_immediately() {
        let mut s = scheduler();
        s.mark_all_received();
        assert_eq!(s.state(), PlaybackState::Finished);
    }

    #[test]
    fn position_follows_output_clock() {
        let mut out = ManualOutput::default();
        let mut s = scheduler();
        s.receive(chunk(0, 0..10, 100), &mut out).unwrap();
        s.receive(chunk(1, 10..30, 100), &mut out).unwrap();
        out.now = 0.5;
        assert_eq!(s.char_position(&out), 5);
        out.now = 1.5;
        assert_eq!(s.char_position(&out), 20);
        out.now = 5.0;
        assert_eq!(s.char_position(&out), 30);
    }
}
