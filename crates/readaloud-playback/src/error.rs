//! Playback error types.

/// Errors that can occur on the playback side.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Failed to open the audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The audio thread exited unexpectedly.
    #[error("Audio thread died unexpectedly")]
    AudioThreadDied,

    /// The output was closed.
    #[error("Audio output is closed")]
    OutputClosed,

    /// A delivery operation failed.
    #[error(transparent)]
    Queue(#[from] readaloud_core::QueueError),
}
