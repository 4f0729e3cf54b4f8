//! Dedicated audio thread that owns the `!Send` rodio output stream.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so it lives on one OS
//! thread for its whole life. [`AudioThreadHandle`] is the `Send + Sync`
//! proxy: every operation is an [`AudioCommand`] sent over a channel.

use std::sync::mpsc;
use std::thread;

use rodio::{OutputStream, Sink};

use crate::error::PlaybackError;

// ── Commands ───────────────────────────────────────────────────────

enum AudioCommand {
    /// Queue samples after everything already in the sink.
    Append {
        samples: Vec<f32>,
        sample_rate: u32,
        reply: mpsc::Sender<Result<(), PlaybackError>>,
    },

    Pause,

    Play,

    /// Drop everything queued.
    Stop,

    Shutdown,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the audio output thread.
pub struct AudioThreadHandle {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioThreadHandle {
    /// Spawn the thread and open the default output device on it.
    ///
    /// With `start_paused` the sink is created paused, as if autoplay were
    /// blocked until the user interacts.
    pub fn spawn(start_paused: bool) -> Result<Self, PlaybackError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), PlaybackError>>();

        let thread = thread::Builder::new()
            .name("readaloud-audio".into())
            .spawn(move || Self::run(start_paused, &cmd_rx, &init_tx))
            .map_err(|e| {
                PlaybackError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx.recv().map_err(|_| PlaybackError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    pub fn append(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), PlaybackError> {
        self.send_and_recv(|reply| AudioCommand::Append {
            samples,
            sample_rate,
            reply,
        })
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        self.send(AudioCommand::Pause)
    }

    pub fn play(&self) -> Result<(), PlaybackError> {
        self.send(AudioCommand::Play)
    }

    /// Stop playback immediately (fire-and-forget).
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(AudioCommand::Stop);
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn send(&self, cmd: AudioCommand) -> Result<(), PlaybackError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| PlaybackError::AudioThreadDied)
    }

    /// Send a command and block until the audio thread replies.
    fn send_and_recv<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, PlaybackError>>) -> AudioCommand,
    ) -> Result<T, PlaybackError> {
        let (tx, rx) = mpsc::channel();
        self.send(build(tx))?;
        rx.recv().map_err(|_| PlaybackError::AudioThreadDied)?
    }

    // ── Audio thread event loop ────────────────────────────────────

    fn run(
        start_paused: bool,
        cmd_rx: &mpsc::Receiver<AudioCommand>,
        init_tx: &mpsc::Sender<Result<(), PlaybackError>>,
    ) {
        let (stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(PlaybackError::OutputStreamError(e.to_string())));
                return;
            }
        };
        let sink = match Sink::try_new(&handle) {
            Ok(sink) => sink,
            Err(e) => {
                let _ = init_tx.send(Err(PlaybackError::OutputStreamError(e.to_string())));
                return;
            }
        };
        if start_paused {
            sink.pause();
        }

        if init_tx.send(Ok(())).is_err() {
            return;
        }
        tracing::debug!(start_paused, "Audio output opened on default device");

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::Append {
                    samples,
                    sample_rate,
                    reply,
                } => {
                    sink.append(rodio::buffer::SamplesBuffer::new(1, sample_rate, samples));
                    let _ = reply.send(Ok(()));
                }
                AudioCommand::Pause => sink.pause(),
                AudioCommand::Play => sink.play(),
                AudioCommand::Stop => sink.stop(),
                AudioCommand::Shutdown => break,
            }
        }

        sink.stop();
        drop(stream);
        tracing::debug!("Audio thread shutting down");
    }
}

impl Drop for AudioThreadHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
