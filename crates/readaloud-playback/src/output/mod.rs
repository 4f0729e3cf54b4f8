//! Audio output port and implementations.
//!
//! An [`AudioOutput`] is a clock plus a schedule: chunks are placed at an
//! absolute time on the output clock, and the clock stops while the output
//! is suspended.
//!
//! | Type              | Sound | Clock                       |
//! |-------------------|-------|-----------------------------|
//! | [`SpeakerOutput`] | yes   | wall clock, paused with sink |
//! | [`VirtualOutput`] | no    | wall clock                   |

mod audio_thread;
mod clock;
mod speaker;
mod virtual_output;

pub use audio_thread::AudioThreadHandle;
pub use clock::PausableClock;
pub use speaker::{SpeakerFactory, SpeakerOutput};
pub use virtual_output::{VirtualFactory, VirtualOutput};

use crate::error::PlaybackError;

/// One open audio output at a fixed sample rate.
pub trait AudioOutput: Send {
    /// Seconds elapsed on the output clock.
    fn current_time(&self) -> f64;

    /// Play mono `samples` starting at `start_at` on the output clock.
    ///
    /// Callers never schedule overlapping audio; `start_at` is at or after
    /// the end of everything scheduled before.
    fn schedule(&mut self, samples: Vec<f32>, start_at: f64) -> Result<(), PlaybackError>;

    fn is_suspended(&self) -> bool;

    /// Suspend the hardware output; the clock stops.
    fn suspend(&mut self) -> Result<(), PlaybackError>;

    fn resume(&mut self) -> Result<(), PlaybackError>;

    /// Stop all audio and release the device.
    fn close(&mut self);
}

/// Opens outputs for new sessions.
pub trait AudioOutputFactory: Send + Sync {
    fn open(
        &self,
        sample_rate: u32,
        start_suspended: bool,
    ) -> Result<Box<dyn AudioOutput>, PlaybackError>;
}
