//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the domain expects from infrastructure. They
//! use only domain types.
//!
//! - [`SpeechSynthesizer`]: the synthesis engine, treated as a black box
//! - [`SpeechTokenizer`]: the engine's own tokenizer, used for chunking
//! - [`DeliveryPort`]: queue lifecycle and polling, in-process or remote

pub mod delivery;
pub mod synthesis;
pub mod tokenizer;

pub use delivery::DeliveryPort;
pub use synthesis::{
    SpeechSynthesizer, SynthesisRequest, TtsAudio, VoiceGender, VoiceInfo, VoicePrompt,
    trailing_frames_after_end, voice_info,
};
pub use tokenizer::{SpeechTokenizer, Token, TokenId, is_sentence_end_text};
