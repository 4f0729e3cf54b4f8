//! Session worker: drains pending text, synthesizes, appends chunks.
//!
//! One task per session. The worker suspends on the pending-text channel
//! and on each synthesis call. Cancellation is observed while waiting for
//! text; an in-flight synthesis runs to completion and its result is
//! dropped.

use std::sync::Arc;

use tokio::sync::mpsc;

use readaloud_core::pcm::{duration_ms, f32_to_pcm16le};
use readaloud_core::{
    AudioChunk, SpeechSynthesizer, SynthesisRequest, TextChunk, TextChunker, VoiceError,
    VoicePrompt, trailing_frames_after_end,
};

use crate::session::{QueueItem, QueueSession};

/// Dependencies cloned into each worker.
#[derive(Clone)]
pub struct WorkerDeps {
    pub backend: Arc<dyn SpeechSynthesizer>,
    pub min_tokens: usize,
    pub max_tokens: usize,
}

/// Running offsets for the next chunk.
#[derive(Debug, Default)]
struct Cursor {
    index: u32,
    char_offset: usize,
}

enum Step {
    Appended,
    Cancelled,
}

/// Run one session until it is complete, failed or cancelled.
pub async fn run_session(
    session: Arc<QueueSession>,
    mut rx: mpsc::UnboundedReceiver<QueueItem>,
    deps: WorkerDeps,
) {
    let cancel = session.cancel_token().clone();

    let prompt = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        prepared = deps.backend.prepare_voice(&session.voice) => prepared,
    };
    let prompt = match prompt {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!(queue_id = %session.id, voice = %session.voice, error = %e, "Voice preparation failed");
            session.fail(e.to_string());
            return;
        }
    };

    let mut chunker = TextChunker::new(deps.backend.tokenizer(), deps.min_tokens, deps.max_tokens);
    let mut cursor = Cursor::default();

    loop {
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            item = rx.recv() => item,
        };
        let Some(item) = item else {
            tracing::debug!(
                queue_id = %session.id,
                dropped_tokens = chunker.buffered_token_count(),
                "Worker stopped before end of text"
            );
            chunker.clear();
            return;
        };
        session.item_taken();

        let (ready, finished) = match item {
            QueueItem::Text(text) => (chunker.add_text(&text), false),
            QueueItem::End => (chunker.flush(), true),
        };

        for chunk in ready {
            match synthesize_chunk(&session, &deps, &prompt, &chunk, &mut cursor).await {
                Ok(Step::Appended) => {}
                Ok(Step::Cancelled) => {
                    tracing::debug!(queue_id = %session.id, "Discarding chunk synthesized after cancel");
                    return;
                }
                Err(e) => {
                    tracing::error!(
                        queue_id = %session.id,
                        chunk_index = cursor.index,
                        error = %e,
                        "Speech generation failed"
                    );
                    session.fail(e.to_string());
                    return;
                }
            }
        }

        if finished {
            if session.complete() {
                tracing::info!(queue_id = %session.id, chunks = cursor.index, "Speech queue complete");
            }
            return;
        }
    }
}

async fn synthesize_chunk(
    session: &QueueSession,
    deps: &WorkerDeps,
    prompt: &VoicePrompt,
    chunk: &TextChunk,
    cursor: &mut Cursor,
) -> Result<Step, VoiceError> {
    let speech = chunk.speech_text();

    let (pcm, duration) = if speech.is_empty() {
        (Vec::new(), 0.0)
    } else {
        let request = SynthesisRequest {
            text: speech.to_string(),
            prompt: prompt.clone(),
            trailing_frames: trailing_frames_after_end(speech),
        };
        let audio = deps.backend.synthesize(request).await?;
        if audio.sample_rate != session.sample_rate {
            tracing::warn!(
                queue_id = %session.id,
                expected = session.sample_rate,
                actual = audio.sample_rate,
                "Backend returned audio at an unexpected sample rate"
            );
        }
        (
            f32_to_pcm16le(&audio.samples),
            duration_ms(audio.samples.len(), session.sample_rate),
        )
    };

    let char_start = cursor.char_offset;
    let char_end = char_start + chunk.char_len();
    let audio_chunk = AudioChunk {
        index: cursor.index,
        pcm,
        char_start,
        char_end,
        duration_ms: duration,
    };

    if !session.append(audio_chunk) {
        return Ok(Step::Cancelled);
    }

    tracing::debug!(
        queue_id = %session.id,
        chunk_index = cursor.index,
        char_start,
        char_end,
        duration_ms = duration,
        "Chunk ready"
    );

    cursor.index += 1;
    cursor.char_offset = char_end;
    Ok(Step::Appended)
}
