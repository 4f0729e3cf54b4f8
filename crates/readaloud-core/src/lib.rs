//! Core domain for readaloud: streaming text-to-speech with read-along sync.
//!
//! This crate has no runtime or transport dependencies. It defines:
//!
//! - the domain types shared by the generation and playback sides
//!   ([`AudioChunk`], [`SessionStatus`], [`PollResult`], ...),
//! - the error taxonomy ([`QueueError`], [`VoiceError`]),
//! - the ports implemented by adapters ([`SpeechSynthesizer`],
//!   [`SpeechTokenizer`], [`DeliveryPort`]),
//! - the incremental [`TextChunker`] and its default [`RuleTokenizer`],
//! - application [`Settings`].

#![deny(unused_crate_dependencies)]

pub mod contracts;
pub mod domain;
pub mod error;
pub mod pcm;
pub mod ports;
pub mod settings;
pub mod text;

// Re-export commonly used types for convenience
pub use domain::{
    AddTextAck, AddTextRequest, AudioChunk, AudioChunkDto, CancelAck, CreateQueueRequest,
    CreatedQueue, EndAck, PollResponseDto, PollResult, QueueId, QueueInfo, SessionStatus,
    TextChunk, TtsStatusDto,
};
pub use error::{QueueError, VoiceError};
pub use ports::{
    DeliveryPort, SpeechSynthesizer, SpeechTokenizer, SynthesisRequest, Token, TokenId, TtsAudio,
    VoiceGender, VoiceInfo, VoicePrompt, trailing_frames_after_end,
};
pub use settings::{
    DEFAULT_MAX_TOKENS, DEFAULT_MIN_TOKENS, DEFAULT_PORT, Settings, SettingsError,
    SettingsUpdate, load_settings_file, validate_settings,
};
pub use text::{RuleTokenizer, TextChunker};
