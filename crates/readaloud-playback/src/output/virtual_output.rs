use super::{AudioOutput, AudioOutputFactory, PausableClock};
use crate::error::PlaybackError;

/// Silent output on a wall clock. Used when no audio device is wanted.
#[derive(Debug)]
pub struct VirtualOutput {
    clock: PausableClock,
    closed: bool,
}

impl VirtualOutput {
    pub fn new(start_suspended: bool) -> Self {
        Self {
            clock: PausableClock::new(start_suspended),
            closed: false,
        }
    }
}

impl AudioOutput for VirtualOutput {
    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn schedule(&mut self, _samples: Vec<f32>, _start_at: f64) -> Result<(), PlaybackError> {
        if self.closed {
            return Err(PlaybackError::OutputClosed);
        }
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.clock.is_paused()
    }

    fn suspend(&mut self) -> Result<(), PlaybackError> {
        self.clock.pause();
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        if self.closed {
            return Err(PlaybackError::OutputClosed);
        }
        self.clock.resume();
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.clock.pause();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualFactory;

impl AudioOutputFactory for VirtualFactory {
    fn open(
        &self,
        _sample_rate: u32,
        start_suspended: bool,
    ) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        Ok(Box::new(VirtualOutput::new(start_suspended)))
    }
}
