//! Speech queue service: session registry and lifecycle operations.
//!
//! The registry is the only state shared between sessions. Membership
//! changes on create, cancel and post-delivery cleanup.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use readaloud_core::{
    AddTextAck, CancelAck, CreatedQueue, DeliveryPort, EndAck, PollResult, QueueError, QueueId,
    QueueInfo, Settings, SpeechSynthesizer, TtsStatusDto, VoiceInfo,
};

use crate::session::{Enqueue, QueueSession};
use crate::worker::{WorkerDeps, run_session};

type Registry = Arc<RwLock<HashMap<QueueId, Arc<QueueSession>>>>;

/// Queue service tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub min_tokens: usize,
    pub max_tokens: usize,
    /// How long a terminal, fully delivered session stays pollable.
    pub cleanup_grace: Duration,
    /// Voice used when `create_queue` gets an empty voice.
    pub default_voice: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::with_defaults())
    }
}

impl QueueConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_tokens: settings.min_tokens,
            max_tokens: settings.max_tokens,
            cleanup_grace: settings.cleanup_grace(),
            default_voice: settings.default_voice.clone(),
        }
    }
}

/// Fresh queue id: 12 lowercase hex characters.
pub fn new_queue_id() -> QueueId {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

/// Registry of streaming speech sessions.
pub struct TtsQueueService {
    backend: RwLock<Option<Arc<dyn SpeechSynthesizer>>>,
    sessions: Registry,
    config: QueueConfig,
}

impl TtsQueueService {
    /// Create a service with no backend loaded yet.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            backend: RwLock::new(None),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn with_backend(config: QueueConfig, backend: Arc<dyn SpeechSynthesizer>) -> Self {
        let service = Self::new(config);
        service.set_backend(Some(backend));
        service
    }

    /// Install or remove the synthesis backend. Running sessions keep the
    /// backend they started with.
    pub fn set_backend(&self, backend: Option<Arc<dyn SpeechSynthesizer>>) {
        *self.backend.write().unwrap_or_else(PoisonError::into_inner) = backend;
    }

    pub fn backend(&self) -> Option<Arc<dyn SpeechSynthesizer>> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn ready_backend(&self) -> Result<Arc<dyn SpeechSynthesizer>, QueueError> {
        match self.backend() {
            Some(backend) if backend.is_ready() => Ok(backend),
            Some(_) => Err(QueueError::ModelUnavailable(
                "TTS model is still loading".to_string(),
            )),
            None => Err(QueueError::ModelUnavailable(
                "TTS model not loaded".to_string(),
            )),
        }
    }

    fn get(&self, queue_id: &str) -> Result<Arc<QueueSession>, QueueError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(queue_id)
            .cloned()
            .ok_or_else(|| QueueError::NotFound(queue_id.to_string()))
    }

    pub fn active_queue_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // ── Lifecycle operations ───────────────────────────────────────

    /// Create a session and spawn its worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create_queue(&self, voice: &str) -> Result<CreatedQueue, QueueError> {
        let backend = self.ready_backend()?;
        let voice = if voice.trim().is_empty() {
            self.config.default_voice.clone()
        } else {
            voice.to_string()
        };
        let sample_rate = backend.sample_rate();
        let queue_id = new_queue_id();

        let (session, rx) = QueueSession::new(queue_id.clone(), voice, sample_rate);
        let session = Arc::new(session);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(queue_id.clone(), Arc::clone(&session));

        tracing::info!(queue_id = %queue_id, voice = %session.voice, sample_rate, "Speech queue created");

        let deps = WorkerDeps {
            backend,
            min_tokens: self.config.min_tokens,
            max_tokens: self.config.max_tokens,
        };
        tokio::spawn(run_session(session, rx, deps));

        Ok(CreatedQueue {
            queue_id,
            sample_rate,
        })
    }

    /// Enqueue a text fragment without blocking.
    pub fn add_text(&self, queue_id: &str, text: &str) -> Result<AddTextAck, QueueError> {
        let session = self.get(queue_id)?;
        match session.enqueue_text(text.to_string()) {
            Enqueue::Queued { depth } => Ok(AddTextAck {
                queued: true,
                queue_depth: depth,
            }),
            Enqueue::Ended => Err(QueueError::AlreadyEnded(queue_id.to_string())),
            Enqueue::WorkerGone => Err(QueueError::GenerationFailure(
                session
                    .error_message()
                    .unwrap_or_else(|| "speech worker stopped".to_string()),
            )),
        }
    }

    /// Enqueue the end marker. A second call reports `already_ended`.
    pub fn end_queue(&self, queue_id: &str) -> Result<EndAck, QueueError> {
        let session = self.get(queue_id)?;
        let sent = session.enqueue_end();
        if sent {
            tracing::debug!(queue_id = %queue_id, "End of text queued");
        }
        Ok(EndAck {
            ended: true,
            already_ended: !sent,
        })
    }

    /// Remove the session and stop its worker.
    pub fn cancel_queue(&self, queue_id: &str) -> Result<CancelAck, QueueError> {
        let session = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(queue_id)
            .ok_or_else(|| QueueError::NotFound(queue_id.to_string()))?;
        session.cancel();
        tracing::info!(queue_id = %queue_id, "Speech queue cancelled");
        Ok(CancelAck { cancelled: true })
    }

    /// Deliver every chunk not returned by an earlier poll.
    ///
    /// The first poll that observes `done` schedules the session for removal
    /// after the cleanup grace period.
    pub fn poll(&self, queue_id: &str) -> Result<PollResult, QueueError> {
        let session = self.get(queue_id)?;
        let drained = session.drain_undelivered();

        if drained.done && session.claim_cleanup() {
            self.schedule_cleanup(&session);
        }

        Ok(PollResult {
            chunks: drained.chunks,
            done: drained.done,
            status: drained.status,
            error: session.error_message(),
        })
    }

    fn schedule_cleanup(&self, session: &Arc<QueueSession>) {
        let sessions = Arc::clone(&self.sessions);
        let session = Arc::clone(session);
        let grace = self.config.cleanup_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut map = sessions.write().unwrap_or_else(PoisonError::into_inner);
            if map
                .get(&session.id)
                .is_some_and(|current| Arc::ptr_eq(current, &session))
            {
                map.remove(&session.id);
                tracing::debug!(queue_id = %session.id, "Speech queue cleaned up");
            }
        });
    }

    // ── Introspection ──────────────────────────────────────────────

    pub fn queue_info(&self, queue_id: &str) -> Result<QueueInfo, QueueError> {
        Ok(self.get(queue_id)?.info())
    }

    pub fn voices(&self) -> Vec<VoiceInfo> {
        self.backend()
            .map(|backend| backend.available_voices())
            .unwrap_or_default()
    }

    pub fn status(&self) -> TtsStatusDto {
        let backend = self.backend();
        TtsStatusDto {
            model_loaded: backend.as_ref().is_some_and(|b| b.is_ready()),
            sample_rate: backend.map(|b| b.sample_rate()),
            active_queues: self.active_queue_count(),
        }
    }

    /// Cancel every session. Used on server shutdown.
    pub fn shutdown(&self) {
        let drained: Vec<_> = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        for (_, session) in &drained {
            session.cancel();
        }
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "Cancelled speech queues on shutdown");
        }
    }
}

#[async_trait::async_trait]
impl DeliveryPort for TtsQueueService {
    async fn create_queue(&self, voice: &str) -> Result<CreatedQueue, QueueError> {
        Self::create_queue(self, voice)
    }

    async fn add_text(&self, queue_id: &str, text: &str) -> Result<AddTextAck, QueueError> {
        Self::add_text(self, queue_id, text)
    }

    async fn end_queue(&self, queue_id: &str) -> Result<EndAck, QueueError> {
        Self::end_queue(self, queue_id)
    }

    async fn cancel_queue(&self, queue_id: &str) -> Result<CancelAck, QueueError> {
        Self::cancel_queue(self, queue_id)
    }

    async fn poll(&self, queue_id: &str) -> Result<PollResult, QueueError> {
        Self::poll(self, queue_id)
    }
}
