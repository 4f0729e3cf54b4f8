//! Integration tests for the read-along player.
//!
//! The player runs against the in-process queue service with a mock
//! synthesizer (100 ms of audio per word) and an output whose clock is
//! tokio's, so paused test time drives playback deterministically.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use readaloud_core::{
    QueueError, RuleTokenizer, SpeechSynthesizer, SpeechTokenizer, SynthesisRequest, TtsAudio,
    VoiceError, VoiceInfo, VoicePrompt,
};
use readaloud_playback::{
    AudioOutput, AudioOutputFactory, PlaybackError, PlaybackEvent, PlaybackState, PlayerConfig,
    ReadAlongPlayer,
};
use readaloud_tts::{QueueConfig, TtsQueueService};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

// ── Mock backend ───────────────────────────────────────────────────

const RATE: u32 = 1_000;
const SAMPLES_PER_WORD: usize = 100;

#[derive(Default)]
struct WordSynth {
    fail_on: Option<&'static str>,
}

#[async_trait]
impl SpeechSynthesizer for WordSynth {
    fn sample_rate(&self) -> u32 {
        RATE
    }

    fn tokenizer(&self) -> Arc<dyn SpeechTokenizer> {
        Arc::new(RuleTokenizer)
    }

    async fn prepare_voice(&self, voice: &str) -> Result<VoicePrompt, VoiceError> {
        Ok(VoicePrompt::new(voice, 0))
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<TtsAudio, VoiceError> {
        if self.fail_on.is_some_and(|word| request.text.contains(word)) {
            return Err(VoiceError::SynthesisError("decoder exploded".into()));
        }
        let words = request.text.split_whitespace().count();
        Ok(TtsAudio::from_samples(vec![0.1; words * SAMPLES_PER_WORD], RATE))
    }

    fn available_voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }
}

// ── Mock output ────────────────────────────────────────────────────

/// `(start_at, sample_count)` of every scheduled buffer, across outputs.
type ScheduleLog = Arc<Mutex<Vec<(f64, usize)>>>;

struct TokioClockOutput {
    accumulated: Duration,
    running_since: Option<Instant>,
    log: ScheduleLog,
}

impl AudioOutput for TokioClockOutput {
    fn current_time(&self) -> f64 {
        let running = self.running_since.map_or(Duration::ZERO, |since| since.elapsed());
        (self.accumulated + running).as_secs_f64()
    }

    fn schedule(&mut self, samples: Vec<f32>, start_at: f64) -> Result<(), PlaybackError> {
        self.log.lock().unwrap().push((start_at, samples.len()));
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.running_since.is_none()
    }

    fn suspend(&mut self) -> Result<(), PlaybackError> {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
        Ok(())
    }

    fn close(&mut self) {
        self.running_since = None;
    }
}

#[derive(Default)]
struct TokioClockFactory {
    log: ScheduleLog,
    opened: Mutex<usize>,
}

impl AudioOutputFactory for TokioClockFactory {
    fn open(
        &self,
        _sample_rate: u32,
        start_suspended: bool,
    ) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        *self.opened.lock().unwrap() += 1;
        let now = Instant::now();
        Ok(Box::new(TokioClockOutput {
            accumulated: Duration::ZERO,
            running_since: (!start_suspended).then_some(now),
            log: Arc::clone(&self.log),
        }))
    }
}

// ── Helpers ────────────────────────────────────────────────────────

struct Harness {
    service: Arc<TtsQueueService>,
    factory: Arc<TokioClockFactory>,
    player: ReadAlongPlayer,
    events: UnboundedReceiver<PlaybackEvent>,
}

fn harness(synth: WordSynth, start_suspended: bool) -> Harness {
    let config = QueueConfig {
        min_tokens: 2,
        max_tokens: 6,
        cleanup_grace: Duration::from_secs(60),
        default_voice: "af_sarah".into(),
    };
    let service = Arc::new(TtsQueueService::with_backend(config, Arc::new(synth)));
    let factory = Arc::new(TokioClockFactory::default());
    let player_config = PlayerConfig {
        start_suspended,
        ..PlayerConfig::default()
    };
    let (player, events) = ReadAlongPlayer::new(service.clone(), factory.clone(), player_config);
    Harness {
        service,
        factory,
        player,
        events,
    }
}

/// Collect events until `state` is reached.
async fn wait_for_state(
    events: &mut UnboundedReceiver<PlaybackEvent>,
    state: PlaybackState,
) -> Vec<PlaybackEvent> {
    let target = PlaybackEvent::StateChanged { state };
    tokio::time::timeout(Duration::from_secs(60), async {
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            let hit = event == target;
            seen.push(event);
            if hit {
                return seen;
            }
        }
        panic!("event channel closed before {state:?}");
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {state:?}"))
}

fn positions(events: &[PlaybackEvent]) -> Vec<(usize, usize)> {
    events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::Position { chars, total } => Some((*chars, *total)),
            _ => None,
        })
        .collect()
}

const LONG_TEXT: &str = "One two three four five six seven eight nine ten. \
    Eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty.";

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn streamed_text_plays_to_the_end() {
    let mut h = harness(WordSynth::default(), false);
    let first = "Hello there, my friend. ";
    let full = "Hello there, my friend. How are you doing today?";

    h.player.submit_text(first).await.unwrap();
    h.player.submit_text(full).await.unwrap();
    h.player.finish_text(full).await.unwrap();

    let seen = wait_for_state(&mut h.events, PlaybackState::Finished).await;
    assert!(seen.contains(&PlaybackEvent::StateChanged {
        state: PlaybackState::Playing
    }));

    let total = full.chars().count();
    let positions = positions(&seen);
    assert_eq!(positions.last(), Some(&(total, total)));
    for pair in positions.windows(2) {
        assert!(pair[0].0 <= pair[1].0, "position went backwards: {positions:?}");
    }
    for (chars, _) in &positions {
        let at_word_end =
            *chars == 0 || *chars == total || full.chars().nth(*chars).is_some_and(char::is_whitespace);
        assert!(at_word_end, "position {chars} is mid-word");
    }

    // Scheduled buffers never overlap.
    let log = h.factory.log.lock().unwrap().clone();
    assert!(log.len() >= 2);
    for pair in log.windows(2) {
        let end = pair[0].0 + pair[0].1 as f64 / f64::from(RATE);
        assert!(pair[1].0 + 1e-9 >= end, "overlapping schedule: {log:?}");
    }
    let audio: usize = log.iter().map(|(_, samples)| samples).sum();
    assert_eq!(audio, full.split_whitespace().count() * SAMPLES_PER_WORD);
}

#[tokio::test(start_paused = true)]
async fn unrelated_text_starts_a_new_turn() {
    let mut h = harness(WordSynth::default(), false);
    h.player.submit_text("First answer is here.").await.unwrap();
    let first_id = h.player.queue_id().await.unwrap();

    h.player.finish_text("Something else entirely.").await.unwrap();
    let second_id = h.player.queue_id().await.unwrap();
    assert_ne!(first_id, second_id);
    assert_eq!(*h.factory.opened.lock().unwrap(), 2);

    // The first queue was cancelled and removed.
    assert!(matches!(
        h.service.queue_info(&first_id),
        Err(QueueError::NotFound(_))
    ));

    wait_for_state(&mut h.events, PlaybackState::Finished).await;
    let total = "Something else entirely.".chars().count();
    assert_eq!(h.player.position().await, Some((total, total)));
}

#[tokio::test(start_paused = true)]
async fn repeated_final_text_is_ignored() {
    let h = harness(WordSynth::default(), false);
    h.player.finish_text("Just once, please.").await.unwrap();
    let id = h.player.queue_id().await.unwrap();

    h.player.finish_text("Just once, please.").await.unwrap();
    assert_eq!(h.player.queue_id().await, Some(id));
    assert_eq!(*h.factory.opened.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn suspended_output_waits_for_toggle() {
    let mut h = harness(WordSynth::default(), true);
    h.player.finish_text(LONG_TEXT).await.unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.player.state().await, Some(PlaybackState::Idle));
    assert!(h.factory.log.lock().unwrap().is_empty());

    h.player.toggle().await.unwrap();
    assert_eq!(h.player.state().await, Some(PlaybackState::Playing));
    assert!(!h.factory.log.lock().unwrap().is_empty());

    wait_for_state(&mut h.events, PlaybackState::Finished).await;
}

#[tokio::test(start_paused = true)]
async fn toggle_pauses_and_resumes() {
    let mut h = harness(WordSynth::default(), false);
    h.player.finish_text(LONG_TEXT).await.unwrap();
    wait_for_state(&mut h.events, PlaybackState::Playing).await;

    h.player.toggle().await.unwrap();
    assert_eq!(h.player.state().await, Some(PlaybackState::Paused));
    let paused_at = h.player.position().await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.player.position().await, paused_at);

    h.player.toggle().await.unwrap();
    assert_eq!(h.player.state().await, Some(PlaybackState::Playing));
    wait_for_state(&mut h.events, PlaybackState::Finished).await;
}

#[tokio::test(start_paused = true)]
async fn toggle_after_finish_restarts() {
    let mut h = harness(WordSynth::default(), false);
    h.player.finish_text("Play it again.").await.unwrap();
    let first_id = h.player.queue_id().await.unwrap();
    wait_for_state(&mut h.events, PlaybackState::Finished).await;

    h.player.toggle().await.unwrap();
    let second_id = h.player.queue_id().await.unwrap();
    assert_ne!(first_id, second_id);

    let seen = wait_for_state(&mut h.events, PlaybackState::Finished).await;
    let total = "Play it again.".chars().count();
    assert_eq!(positions(&seen).last(), Some(&(total, total)));
}

#[tokio::test(start_paused = true)]
async fn generation_failure_is_reported() {
    let mut h = harness(
        WordSynth {
            fail_on: Some("boom"),
        },
        false,
    );
    h.player
        .finish_text("These first words are fine. Then boom goes the model.")
        .await
        .unwrap();

    let seen = wait_for_state(&mut h.events, PlaybackState::Finished).await;
    assert!(seen.iter().any(|event| matches!(
        event,
        PlaybackEvent::Error { message } if message.contains("decoder exploded")
    )));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_the_queue() {
    let h = harness(WordSynth::default(), false);
    h.player.submit_text("Some text that never ends").await.unwrap();
    let id = h.player.queue_id().await.unwrap();

    h.player.shutdown().await;
    assert_eq!(h.player.state().await, None);
    assert!(matches!(
        h.service.queue_info(&id),
        Err(QueueError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn lost_queue_plays_out_what_arrived() {
    let mut h = harness(WordSynth::default(), false);
    h.player.submit_text(LONG_TEXT).await.unwrap();
    let id = h.player.queue_id().await.unwrap();
    wait_for_state(&mut h.events, PlaybackState::Playing).await;

    // The server forgets the queue mid-turn.
    h.service.cancel_queue(&id).unwrap();

    let seen = wait_for_state(&mut h.events, PlaybackState::Finished).await;
    assert!(seen.iter().any(|event| matches!(
        event,
        PlaybackEvent::Error { message } if message.contains(&id)
    )));
    assert_eq!(h.player.state().await, Some(PlaybackState::Finished));
}
