//! Delivery port: queue lifecycle and pull-based polling.

use crate::domain::{AddTextAck, CancelAck, CreatedQueue, EndAck, PollResult};
use crate::error::QueueError;

/// Queue lifecycle operations, transport-agnostic.
///
/// Implemented in-process by the queue service and remotely by the HTTP
/// client; the player only talks to this trait.
#[async_trait::async_trait]
pub trait DeliveryPort: Send + Sync {
    /// Create a session for `voice`.
    async fn create_queue(&self, voice: &str) -> Result<CreatedQueue, QueueError>;

    /// Enqueue a text fragment.
    async fn add_text(&self, queue_id: &str, text: &str) -> Result<AddTextAck, QueueError>;

    /// Signal end of text. Idempotent.
    async fn end_queue(&self, queue_id: &str) -> Result<EndAck, QueueError>;

    /// Cancel and remove the session.
    async fn cancel_queue(&self, queue_id: &str) -> Result<CancelAck, QueueError>;

    /// Return every chunk not yet delivered.
    async fn poll(&self, queue_id: &str) -> Result<PollResult, QueueError>;
}
