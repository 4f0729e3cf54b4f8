//! Speech queue API route constants.
//!
//! Paths with a `{id}` segment use axum's capture syntax; clients build the
//! concrete path with [`queue_path`], which percent-encodes the id.

/// `POST` create a queue.
pub const QUEUES: &str = "/api/tts/queues";

/// `GET` queue snapshot, `DELETE` cancel a queue.
pub const QUEUE: &str = "/api/tts/queues/{id}";

/// `POST` append text.
pub const QUEUE_TEXT: &str = "/api/tts/queues/{id}/text";

/// `POST` end of text.
pub const QUEUE_END: &str = "/api/tts/queues/{id}/end";

/// `POST` fetch undelivered chunks.
pub const QUEUE_POLL: &str = "/api/tts/queues/{id}/poll";

/// `GET` available voices.
pub const VOICES: &str = "/api/tts/voices";

/// `GET` backend status.
pub const STATUS: &str = "/api/tts/status";

/// Substitute `queue_id` into one of the `{id}` route templates.
///
/// The id always stays a single path segment.
#[must_use]
pub fn queue_path(template: &str, queue_id: &str) -> String {
    template.replace("{id}", &urlencoding::encode(queue_id))
}
