//! Read-along player: drives a delivery session and an audio output.
//!
//! The player owns at most one turn at a time. A turn is one queue on the
//! delivery side, one audio output and one [`PlaybackScheduler`]. Two
//! background tasks serve each turn: a poll loop pulling chunks and a
//! progress sampler emitting [`PlaybackEvent::Position`].
//!
//! Every operation (submit, finish, toggle, restart, shutdown) and every
//! scheduling step runs under one async mutex, so output teardown and setup
//! never interleave. Background tasks carry the generation they were
//! started for and exit once it is no longer current.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use readaloud_core::{DeliveryPort, QueueError, QueueId, SessionStatus, Settings};

use crate::error::PlaybackError;
use crate::events::PlaybackEvent;
use crate::output::{AudioOutput, AudioOutputFactory};
use crate::scheduler::{PlaybackScheduler, PlaybackState};
use crate::timeline::snap_to_word_end;

/// Player tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub voice: String,
    /// Poll interval after a poll that returned chunks.
    pub poll_active: Duration,
    /// Poll interval after an empty poll.
    pub poll_idle: Duration,
    pub progress_interval: Duration,
    pub finish_tolerance: Duration,
    /// Open the first output suspended, waiting for a `toggle`.
    pub start_suspended: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::with_defaults())
    }
}

impl PlayerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            voice: settings.default_voice.clone(),
            poll_active: Duration::from_millis(settings.poll_active_ms),
            poll_idle: Duration::from_millis(settings.poll_idle_ms),
            progress_interval: Duration::from_millis(settings.progress_interval_ms),
            finish_tolerance: Duration::from_millis(settings.finish_tolerance_ms),
            start_suspended: false,
        }
    }
}

struct Shared {
    delivery: Arc<dyn DeliveryPort>,
    factory: Arc<dyn AudioOutputFactory>,
    config: PlayerConfig,
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

impl Shared {
    fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.send(event);
    }
}

struct Turn {
    generation: u64,
    queue_id: QueueId,
    /// Text submitted to the queue so far.
    text: String,
    ended: bool,
    output: Box<dyn AudioOutput>,
    scheduler: PlaybackScheduler,
    cancel: CancellationToken,
    last_state: PlaybackState,
    last_position: Option<usize>,
}

impl Turn {
    fn emit_state(&mut self, shared: &Shared) {
        let state = self.scheduler.state();
        if state != self.last_state {
            self.last_state = state;
            tracing::debug!(queue_id = %self.queue_id, ?state, "Playback state changed");
            shared.emit(PlaybackEvent::StateChanged { state });
        }
    }
}

#[derive(Default)]
struct PlayerInner {
    turn: Option<Turn>,
    generation: u64,
    /// Set by the first `toggle`; later outputs open running.
    unlocked: bool,
}

/// Streams text to a delivery endpoint and plays the result with
/// read-along position tracking.
#[derive(Clone)]
pub struct ReadAlongPlayer {
    shared: Arc<Shared>,
    inner: Arc<Mutex<PlayerInner>>,
}

impl ReadAlongPlayer {
    /// Create a player and the receiver for its events.
    pub fn new(
        delivery: Arc<dyn DeliveryPort>,
        factory: Arc<dyn AudioOutputFactory>,
        config: PlayerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let player = Self {
            shared: Arc::new(Shared {
                delivery,
                factory,
                config,
                events,
            }),
            inner: Arc::new(Mutex::new(PlayerInner::default())),
        };
        (player, rx)
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Current state, or `None` with no turn.
    pub async fn state(&self) -> Option<PlaybackState> {
        let inner = self.inner.lock().await;
        inner.turn.as_ref().map(|turn| turn.scheduler.state())
    }

    pub async fn queue_id(&self) -> Option<QueueId> {
        let inner = self.inner.lock().await;
        inner.turn.as_ref().map(|turn| turn.queue_id.clone())
    }

    /// Snapped read-along position and total characters.
    pub async fn position(&self) -> Option<(usize, usize)> {
        let inner = self.inner.lock().await;
        inner.turn.as_ref().map(|turn| {
            let total = turn.text.chars().count();
            if turn.scheduler.state() == PlaybackState::Finished {
                return (total, total);
            }
            let raw = turn.scheduler.char_position(turn.output.as_ref());
            (snap_to_word_end(&turn.text, raw), total)
        })
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Submit the full text of the current turn so far.
    ///
    /// Text that extends what was already submitted is appended to the
    /// current queue. Anything else starts a new turn, cancelling the old
    /// queue and output.
    pub async fn submit_text(&self, full_text: &str) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        self.submit_locked(&mut inner, full_text, false).await
    }

    /// Submit the final text of the turn and end its queue.
    pub async fn finish_text(&self, full_text: &str) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        self.submit_locked(&mut inner, full_text, true).await
    }

    /// Play/pause control.
    ///
    /// A finished turn restarts. Playing pauses. Anything else resumes,
    /// which also starts an output opened suspended.
    pub async fn toggle(&self) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        inner.unlocked = true;
        let Some(turn) = inner.turn.as_mut() else {
            return Ok(());
        };

        match turn.scheduler.state() {
            PlaybackState::Finished => return self.restart_locked(&mut inner).await,
            PlaybackState::Playing if !turn.output.is_suspended() => {
                turn.scheduler.pause(turn.output.as_mut())?;
            }
            _ => turn.scheduler.resume(turn.output.as_mut())?,
        }
        turn.emit_state(&self.shared);
        Ok(())
    }

    /// Replay the whole turn from the start as a fresh session.
    pub async fn restart(&self) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock().await;
        self.restart_locked(&mut inner).await
    }

    /// Cancel the current queue and close the output.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        self.teardown(&mut inner).await;
    }

    // ── Internals (op guard held) ──────────────────────────────────

    async fn submit_locked(
        &self,
        inner: &mut PlayerInner,
        text: &str,
        end: bool,
    ) -> Result<(), PlaybackError> {
        let repeated = inner
            .turn
            .as_ref()
            .is_some_and(|turn| turn.ended && turn.text == text);
        if repeated {
            return Ok(());
        }

        let continues = inner
            .turn
            .as_ref()
            .is_some_and(|turn| !turn.ended && text.starts_with(turn.text.as_str()));
        if continues && let Some(turn) = inner.turn.as_mut() {
            return self.append_locked(turn, text, end).await;
        }
        self.start_turn(inner, text, end).await
    }

    /// Send the part of `text` the queue has not seen yet.
    async fn append_locked(
        &self,
        turn: &mut Turn,
        text: &str,
        end: bool,
    ) -> Result<(), PlaybackError> {
        let delivery = &self.shared.delivery;
        let delta = &text[turn.text.len()..];
        if !delta.is_empty() {
            delivery.add_text(&turn.queue_id, delta).await?;
            turn.text = text.to_string();
        }
        if end {
            delivery.end_queue(&turn.queue_id).await?;
            turn.ended = true;
        }
        Ok(())
    }

    async fn restart_locked(&self, inner: &mut PlayerInner) -> Result<(), PlaybackError> {
        let Some((text, ended)) = inner.turn.as_ref().map(|t| (t.text.clone(), t.ended)) else {
            return Ok(());
        };
        inner.unlocked = true;
        tracing::info!(chars = text.chars().count(), "Restarting read-along");
        self.start_turn(inner, &text, ended).await
    }

    async fn start_turn(
        &self,
        inner: &mut PlayerInner,
        text: &str,
        end: bool,
    ) -> Result<(), PlaybackError> {
        self.teardown(inner).await;
        inner.generation += 1;
        let generation = inner.generation;
        let shared = &self.shared;

        let created = shared.delivery.create_queue(&shared.config.voice).await?;
        let suspended = shared.config.start_suspended && !inner.unlocked;
        let output = match shared.factory.open(created.sample_rate, suspended) {
            Ok(output) => output,
            Err(e) => {
                let _ = shared.delivery.cancel_queue(&created.queue_id).await;
                return Err(e);
            }
        };

        tracing::info!(
            queue_id = %created.queue_id,
            sample_rate = created.sample_rate,
            suspended,
            "Read-along turn started"
        );

        let finish_tolerance = shared.config.finish_tolerance.as_secs_f64();
        let cancel = CancellationToken::new();
        inner.turn = Some(Turn {
            generation,
            queue_id: created.queue_id.clone(),
            text: String::new(),
            ended: false,
            output,
            scheduler: PlaybackScheduler::new(created.sample_rate, finish_tolerance),
            cancel: cancel.clone(),
            last_state: PlaybackState::Idle,
            last_position: None,
        });
        shared.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Idle,
        });

        tokio::spawn(poll_loop(
            Arc::clone(&self.shared),
            Arc::clone(&self.inner),
            generation,
            cancel.clone(),
            created.queue_id,
        ));
        tokio::spawn(progress_loop(
            Arc::clone(&self.shared),
            Arc::clone(&self.inner),
            generation,
            cancel,
        ));

        match inner.turn.as_mut() {
            Some(turn) => self.append_locked(turn, text, end).await,
            None => Ok(()),
        }
    }

    async fn teardown(&self, inner: &mut PlayerInner) {
        let Some(mut turn) = inner.turn.take() else {
            return;
        };
        turn.cancel.cancel();
        match self.shared.delivery.cancel_queue(&turn.queue_id).await {
            Ok(_) | Err(QueueError::NotFound(_)) => {}
            Err(e) => {
                tracing::debug!(queue_id = %turn.queue_id, error = %e, "Cancel failed during teardown");
            }
        }
        turn.output.close();
        tracing::debug!(queue_id = %turn.queue_id, "Read-along turn torn down");
    }
}

// ── Background tasks ───────────────────────────────────────────────

async fn poll_loop(
    shared: Arc<Shared>,
    inner: Arc<Mutex<PlayerInner>>,
    generation: u64,
    cancel: CancellationToken,
    queue_id: QueueId,
) {
    loop {
        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            polled = shared.delivery.poll(&queue_id) => polled,
        };
        let result = match polled {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(queue_id = %queue_id, error = %e, "Poll failed, stopping poll loop");
                let mut guard = inner.lock().await;
                let Some(turn) = guard.turn.as_mut().filter(|t| t.generation == generation) else {
                    return;
                };
                if cancel.is_cancelled() {
                    return;
                }
                // Nothing more will arrive; what is scheduled plays out to `Finished`.
                shared.emit(PlaybackEvent::Error {
                    message: e.to_string(),
                });
                turn.scheduler.mark_all_received();
                turn.emit_state(&shared);
                return;
            }
        };
        let got_chunks = !result.chunks.is_empty();

        {
            let mut guard = inner.lock().await;
            let Some(turn) = guard.turn.as_mut().filter(|t| t.generation == generation) else {
                return;
            };

            for chunk in result.chunks {
                if let Err(e) = turn.scheduler.receive(chunk, turn.output.as_mut()) {
                    tracing::warn!(queue_id = %queue_id, error = %e, "Failed to schedule chunk");
                    shared.emit(PlaybackEvent::Error {
                        message: e.to_string(),
                    });
                }
            }

            if result.done {
                if result.status == SessionStatus::Error {
                    let message = result
                        .error
                        .unwrap_or_else(|| "speech generation failed".to_string());
                    tracing::warn!(queue_id = %queue_id, error = %message, "Speech generation failed");
                    shared.emit(PlaybackEvent::Error { message });
                }
                turn.scheduler.mark_all_received();
            }
            turn.emit_state(&shared);

            if result.done {
                return;
            }
        }

        let delay = if got_chunks {
            shared.config.poll_active
        } else {
            shared.config.poll_idle
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

async fn progress_loop(
    shared: Arc<Shared>,
    inner: Arc<Mutex<PlayerInner>>,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(shared.config.progress_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let mut guard = inner.lock().await;
        let Some(turn) = guard.turn.as_mut().filter(|t| t.generation == generation) else {
            return;
        };

        turn.scheduler.tick(turn.output.as_ref());
        let total = turn.text.chars().count();
        let finished = turn.scheduler.state() == PlaybackState::Finished;
        let chars = if finished {
            total
        } else {
            let raw = turn.scheduler.char_position(turn.output.as_ref());
            snap_to_word_end(&turn.text, raw)
        };

        if turn.last_position != Some(chars) {
            turn.last_position = Some(chars);
            shared.emit(PlaybackEvent::Position { chars, total });
        }
        turn.emit_state(&shared);

        if finished {
            return;
        }
    }
}
