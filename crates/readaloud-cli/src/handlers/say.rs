//! Say command handler.
//!
//! Streams text to a server the way an incremental producer would (one
//! word at a time when a delay is given), plays the audio and draws a
//! read-along progress line.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use readaloud_core::Settings;
use readaloud_playback::{
    AudioOutputFactory, HttpDeliveryClient, PlaybackEvent, PlaybackState, PlayerConfig,
    ReadAlongPlayer, SpeakerFactory, VirtualFactory,
};

use crate::progress::ReadAlongProgress;

/// Options for one `say` invocation.
#[derive(Debug, Clone)]
pub struct SayOptions {
    pub server: String,
    pub voice: Option<String>,
    pub word_delay: Duration,
    pub silent: bool,
}

/// Prefixes of `text` ending at each word start, then the full text.
///
/// `"Hello big world"` gives `["Hello ", "Hello big ", "Hello big world"]`.
pub fn word_prefixes(text: &str) -> Vec<&str> {
    let mut prefixes = Vec::new();
    let mut in_space = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_space = true;
        } else if in_space {
            prefixes.push(&text[..i]);
            in_space = false;
        }
    }
    prefixes.push(text);
    prefixes
}

async fn stream_text(player: ReadAlongPlayer, text: String, word_delay: Duration) -> Result<()> {
    if !word_delay.is_zero() {
        for prefix in word_prefixes(&text) {
            player.submit_text(prefix).await?;
            tokio::time::sleep(word_delay).await;
        }
    }
    player.finish_text(&text).await?;
    Ok(())
}

/// Speak `text` and wait until playback finishes or Ctrl-C.
pub async fn execute(text: String, options: SayOptions, settings: &Settings) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Nothing to say");
    }

    let client = HttpDeliveryClient::new(options.server.as_str())?;
    let factory: Arc<dyn AudioOutputFactory> = if options.silent {
        Arc::new(VirtualFactory)
    } else {
        Arc::new(SpeakerFactory)
    };
    let mut config = PlayerConfig::from_settings(settings);
    if let Some(voice) = options.voice {
        config.voice = voice;
    }

    let (player, mut events) = ReadAlongPlayer::new(Arc::new(client), factory, config);
    let progress = ReadAlongProgress::new(&text);

    let mut feeder = tokio::spawn(stream_text(player.clone(), text, options.word_delay));
    let mut fed = false;
    let mut report = RunReport::default();

    loop {
        tokio::select! {
            joined = &mut feeder, if !fed => {
                fed = true;
                if let Err(e) = joined? {
                    progress.abandon();
                    player.shutdown().await;
                    return Err(e);
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if report.observe(&event, &progress) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                progress.abandon();
                player.shutdown().await;
                return Ok(());
            }
        }
    }

    progress.finish();
    player.shutdown().await;
    report.into_result()
}

/// Folds player events into the progress line and the run's outcome.
#[derive(Debug, Default)]
struct RunReport {
    failure: Option<String>,
}

impl RunReport {
    /// Apply one event. Returns true once playback has finished.
    fn observe(&mut self, event: &PlaybackEvent, progress: &ReadAlongProgress) -> bool {
        match event {
            PlaybackEvent::Position { chars, .. } => progress.set_position(*chars),
            PlaybackEvent::StateChanged {
                state: PlaybackState::Finished,
            } => return true,
            PlaybackEvent::StateChanged { state } => progress.set_state(*state),
            PlaybackEvent::Error { message } => {
                progress.warn(message);
                self.failure = Some(message.clone());
            }
        }
        false
    }

    fn into_result(self) -> Result<()> {
        match self.failure {
            Some(message) => bail!("Playback did not complete: {message}"),
            None => Ok(()),
        }
    }
}
