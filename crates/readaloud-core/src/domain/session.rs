use serde::{Deserialize, Serialize};

use super::chunk::{AudioChunk, AudioChunkDto};

/// Opaque queue identifier.
pub type QueueId = String;

/// Session status. `Active` moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Complete,
    Error,
}

impl SessionStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/tts/queues`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQueueRequest {
    /// Voice id; the server default is used when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Body of `POST /api/tts/queues/{id}/text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTextRequest {
    pub text: String,
}

/// Result of `createQueue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedQueue {
    pub queue_id: QueueId,
    pub sample_rate: u32,
}

/// Acknowledgment of `addText`.
///
/// `queue_depth` counts items the worker has not picked up yet; callers may
/// use it to throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTextAck {
    pub queued: bool,
    pub queue_depth: usize,
}

/// Acknowledgment of `endQueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndAck {
    pub ended: bool,
    pub already_ended: bool,
}

/// Acknowledgment of `cancelQueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAck {
    pub cancelled: bool,
}

/// Result of `poll`: every chunk not yet delivered, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    pub chunks: Vec<AudioChunk>,
    pub done: bool,
    pub status: SessionStatus,
    pub error: Option<String>,
}

impl PollResult {
    #[must_use]
    pub fn to_dto(&self) -> PollResponseDto {
        PollResponseDto {
            chunks: self.chunks.iter().map(AudioChunk::to_dto).collect(),
            done: self.done,
            status: self.status,
            error: self.error.clone(),
        }
    }
}

/// Wire form of [`PollResult`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollResponseDto {
    pub chunks: Vec<AudioChunkDto>,
    pub done: bool,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PollResponseDto {
    pub fn into_result(self) -> Result<PollResult, base64::DecodeError> {
        let chunks = self
            .chunks
            .into_iter()
            .map(AudioChunkDto::into_chunk)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PollResult {
            chunks,
            done: self.done,
            status: self.status,
            error: self.error,
        })
    }
}

/// Snapshot of one session, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueInfo {
    pub queue_id: QueueId,
    pub voice: String,
    pub sample_rate: u32,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Chunks synthesized so far.
    pub chunk_count: usize,
    /// Chunks already handed out by `poll`.
    pub delivered_count: usize,
    /// Text items not yet picked up by the worker.
    pub queue_depth: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Backend readiness as reported by `GET /api/tts/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsStatusDto {
    pub model_loaded: bool,
    pub sample_rate: Option<u32>,
    pub active_queues: usize,
}
