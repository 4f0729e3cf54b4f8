//! Default-speaker output via rodio.
//!
//! rodio plays sources back to back, so scheduling at an absolute time is
//! done by queueing silence for any gap between the end of queued audio and
//! the requested start.

use super::{AudioOutput, AudioOutputFactory, AudioThreadHandle, PausableClock};
use crate::error::PlaybackError;

pub struct SpeakerOutput {
    audio: Option<AudioThreadHandle>,
    clock: PausableClock,
    sample_rate: u32,
    /// Output time at which everything queued so far ends.
    queued_until: f64,
}

impl SpeakerOutput {
    pub fn open(sample_rate: u32, start_suspended: bool) -> Result<Self, PlaybackError> {
        let audio = AudioThreadHandle::spawn(start_suspended)?;
        Ok(Self {
            audio: Some(audio),
            clock: PausableClock::new(start_suspended),
            sample_rate,
            queued_until: 0.0,
        })
    }

    fn audio(&self) -> Result<&AudioThreadHandle, PlaybackError> {
        self.audio.as_ref().ok_or(PlaybackError::OutputClosed)
    }
}

impl AudioOutput for SpeakerOutput {
    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn schedule(&mut self, samples: Vec<f32>, start_at: f64) -> Result<(), PlaybackError> {
        let audio = self.audio()?;
        let rate = f64::from(self.sample_rate);

        // A drained sink starts whatever is appended next right away.
        let queued_until = self.queued_until.max(self.clock.now());
        let gap = start_at - queued_until;
        if gap > 0.0 {
            let silence = (gap * rate).round() as usize;
            if silence > 0 {
                audio.append(vec![0.0; silence], self.sample_rate)?;
            }
        }

        let duration = samples.len() as f64 / rate;
        audio.append(samples, self.sample_rate)?;
        self.queued_until = queued_until.max(start_at) + duration;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.clock.is_paused()
    }

    fn suspend(&mut self) -> Result<(), PlaybackError> {
        self.audio()?.pause()?;
        self.clock.pause();
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        self.audio()?.play()?;
        self.clock.resume();
        Ok(())
    }

    fn close(&mut self) {
        if let Some(audio) = self.audio.take() {
            audio.stop();
        }
        self.clock.pause();
    }
}

/// Opens [`SpeakerOutput`]s on the default device.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeakerFactory;

impl AudioOutputFactory for SpeakerFactory {
    fn open(
        &self,
        sample_rate: u32,
        start_suspended: bool,
    ) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        tracing::info!(sample_rate, start_suspended, "Opening speaker output");
        Ok(Box::new(SpeakerOutput::open(sample_rate, start_suspended)?))
    }
}
