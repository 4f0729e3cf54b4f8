//! Domain types for streaming synthesis sessions.
//!
//! These are pure data types. Types that cross the delivery boundary derive
//! serde with camelCase field names; [`AudioChunk`] keeps raw PCM and has a
//! separate base64-carrying DTO.

mod chunk;
mod session;

pub use chunk::{AudioChunk, AudioChunkDto, TextChunk};
pub use session::{
    AddTextAck, AddTextRequest, CancelAck, CreateQueueRequest, CreatedQueue, EndAck,
    PollResponseDto, PollResult, QueueId, QueueInfo, SessionStatus, TtsStatusDto,
};
