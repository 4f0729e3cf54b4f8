//! Axum handlers for the `/api/tts/*` endpoints.
//!
//! Each handler calls exactly one `TtsQueueService` method and returns the
//! result as JSON. Request bodies are the shared DTOs from
//! `readaloud_core`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use readaloud_core::{
    AddTextAck, AddTextRequest, CancelAck, CreateQueueRequest, CreatedQueue, EndAck,
    PollResponseDto, QueueInfo, TtsStatusDto, VoiceInfo,
};

use crate::error::HttpError;
use crate::state::AppState;

/// `POST /api/tts/queues`
///
/// The body is optional; an absent or empty voice selects the default.
pub async fn create_queue(
    State(state): State<AppState>,
    body: Option<Json<CreateQueueRequest>>,
) -> Result<(StatusCode, Json<CreatedQueue>), HttpError> {
    let voice = body.and_then(|Json(req)| req.voice).unwrap_or_default();
    let created = state.tts.create_queue(&voice)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /api/tts/queues/{id}/text`
pub async fn add_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AddTextRequest>, JsonRejection>,
) -> Result<Json<AddTextAck>, HttpError> {
    let Json(req) = body?;
    Ok(Json(state.tts.add_text(&id, &req.text)?))
}

/// `POST /api/tts/queues/{id}/end`
pub async fn end_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EndAck>, HttpError> {
    Ok(Json(state.tts.end_queue(&id)?))
}

/// `DELETE /api/tts/queues/{id}`
pub async fn cancel_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelAck>, HttpError> {
    Ok(Json(state.tts.cancel_queue(&id)?))
}

/// `GET /api/tts/queues/{id}`
pub async fn queue_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueueInfo>, HttpError> {
    Ok(Json(state.tts.queue_info(&id)?))
}

/// `POST /api/tts/queues/{id}/poll`
pub async fn poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PollResponseDto>, HttpError> {
    let result = state.tts.poll(&id)?;
    Ok(Json(result.to_dto()))
}

/// `GET /api/tts/voices`
pub async fn voices(State(state): State<AppState>) -> Json<Vec<VoiceInfo>> {
    Json(state.tts.voices())
}

/// `GET /api/tts/status`
pub async fn status(State(state): State<AppState>) -> Json<TtsStatusDto> {
    Json(state.tts.status())
}
