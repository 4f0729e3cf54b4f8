//! Axum-specific error types and mappings.
//!
//! Maps [`QueueError`] to HTTP status codes and a JSON body whose `type`
//! field is the error's stable discriminant, so remote clients can rebuild
//! the original variant.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use readaloud_core::QueueError;
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A queue operation failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    /// Stable error type discriminant for client-side handling
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    error_type: Option<&'static str>,
}

fn queue_status(err: &QueueError) -> StatusCode {
    match err {
        QueueError::NotFound(_) => StatusCode::NOT_FOUND,
        QueueError::AlreadyEnded(_) => StatusCode::CONFLICT,
        QueueError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        QueueError::GenerationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        QueueError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

/// The variant's payload, without the display prefix.
fn queue_message(err: QueueError) -> String {
    match err {
        QueueError::NotFound(msg)
        | QueueError::AlreadyEnded(msg)
        | QueueError::ModelUnavailable(msg)
        | QueueError::GenerationFailure(msg)
        | QueueError::Transport(msg) => msg,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message, error_type) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::Queue(err) => {
                let status = queue_status(&err);
                let error_type = Some(err.type_code());
                (status, queue_message(err), error_type)
            }
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %message, "Request failed");
        }

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
            error_type,
        };

        (status, axum::Json(body)).into_response()
    }
}
