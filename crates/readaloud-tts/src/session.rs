//! Per-session state shared by the worker task and the service.
//!
//! Only the worker appends chunks and moves the status out of `Active`;
//! cancellation is the one other writer and it also only ever leaves
//! `Active`. The chunk log is the only part behind a lock.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use readaloud_core::{AudioChunk, QueueId, QueueInfo, SessionStatus};

/// Item on a session's pending-text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    Text(String),
    /// End of text. Nothing is sent after it.
    End,
}

const ACTIVE: u8 = 0;
const COMPLETE: u8 = 1;
const ERROR: u8 = 2;

const fn decode_status(raw: u8) -> SessionStatus {
    match raw {
        COMPLETE => SessionStatus::Complete,
        ERROR => SessionStatus::Error,
        _ => SessionStatus::Active,
    }
}

#[derive(Debug, Default)]
struct ChunkLog {
    chunks: Vec<AudioChunk>,
    delivered: usize,
}

/// Chunks handed out by one poll.
#[derive(Debug)]
pub struct Drained {
    pub chunks: Vec<AudioChunk>,
    pub status: SessionStatus,
    /// Terminal and nothing left to deliver.
    pub done: bool,
}

#[derive(Debug)]
pub struct QueueSession {
    pub id: QueueId,
    pub voice: String,
    pub sample_rate: u32,
    pub created_at: DateTime<Utc>,
    status: AtomicU8,
    error_message: OnceLock<String>,
    /// `None` once the end marker was sent or the session was cancelled.
    sender: Mutex<Option<mpsc::UnboundedSender<QueueItem>>>,
    depth: AtomicUsize,
    log: Mutex<ChunkLog>,
    cancel: CancellationToken,
    cleanup_scheduled: AtomicBool,
}

/// Outcome of trying to enqueue text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued { depth: usize },
    Ended,
    WorkerGone,
}

impl QueueSession {
    pub fn new(
        id: QueueId,
        voice: String,
        sample_rate: u32,
    ) -> (Self, mpsc::UnboundedReceiver<QueueItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            id,
            voice,
            sample_rate,
            created_at: Utc::now(),
            status: AtomicU8::new(ACTIVE),
            error_message: OnceLock::new(),
            sender: Mutex::new(Some(tx)),
            depth: AtomicUsize::new(0),
            log: Mutex::new(ChunkLog::default()),
            cancel: CancellationToken::new(),
            cleanup_scheduled: AtomicBool::new(false),
        };
        (session, rx)
    }

    // ── Status ─────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        decode_status(self.status.load(Ordering::Acquire))
    }

    pub fn error_message(&self) -> Option<String> {
        match self.status() {
            SessionStatus::Error => self.error_message.get().cloned(),
            _ => None,
        }
    }

    fn leave_active(&self, to: u8) -> bool {
        self.status
            .compare_exchange(ACTIVE, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Active → Complete`. Returns false if already terminal.
    pub fn complete(&self) -> bool {
        self.leave_active(COMPLETE)
    }

    /// `Active → Error` with `message`. Returns false if already terminal.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let _ = self.error_message.set(message.into());
        self.leave_active(ERROR)
    }

    // ── Pending text ───────────────────────────────────────────────

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<QueueItem>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue_text(&self, text: String) -> Enqueue {
        let guard = self.sender();
        let Some(tx) = guard.as_ref() else {
            return Enqueue::Ended;
        };
        let depth = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        if tx.send(QueueItem::Text(text)).is_err() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            return Enqueue::WorkerGone;
        }
        Enqueue::Queued { depth }
    }

    /// Send the end marker once. Returns false if it was already sent.
    pub fn enqueue_end(&self) -> bool {
        let Some(tx) = self.sender().take() else {
            return false;
        };
        self.depth.fetch_add(1, Ordering::AcqRel);
        if tx.send(QueueItem::End).is_err() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
        }
        true
    }

    /// Called by the worker for each item it receives.
    pub fn item_taken(&self) {
        let _ = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| d.checked_sub(1));
    }

    pub fn queue_depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    // ── Cancellation ───────────────────────────────────────────────

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stop the worker at its next suspension point and mark the session
    /// `Complete` so concurrent pollers see it terminate.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.sender().take();
        self.complete();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ── Chunk log ──────────────────────────────────────────────────

    fn log(&self) -> MutexGuard<'_, ChunkLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a chunk unless the session was cancelled.
    pub fn append(&self, chunk: AudioChunk) -> bool {
        let mut log = self.log();
        if self.cancel.is_cancelled() {
            return false;
        }
        log.chunks.push(chunk);
        true
    }

    /// Hand out every chunk not delivered yet and advance the cursor.
    pub fn drain_undelivered(&self) -> Drained {
        let mut log = self.log();
        // Read under the lock: a terminal status implies every append
        // happened before it.
        let status = self.status();
        let chunks = log.chunks[log.delivered..].to_vec();
        log.delivered = log.chunks.len();
        Drained {
            chunks,
            status,
            done: status.is_terminal(),
        }
    }

    /// True the first time it is called.
    pub fn claim_cleanup(&self) -> bool {
        !self.cleanup_scheduled.swap(true, Ordering::AcqRel)
    }

    pub fn info(&self) -> QueueInfo {
        let (chunk_count, delivered_count) = {
            let log = self.log();
            (log.chunks.len(), log.delivered)
        };
        QueueInfo {
            queue_id: self.id.clone(),
            voice: self.voice.clone(),
            sample_rate: self.sample_rate,
            status: self.status(),
            error_message: self.error_message(),
            chunk_count,
            delivered_count,
            queue_depth: self.queue_depth(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
