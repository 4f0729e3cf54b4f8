//! Settings domain types and validation.
//!
//! Pure data with serde support. The CLI loads an optional JSON file, applies
//! flag and environment overrides as a [`SettingsUpdate`], then validates.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default minimum tokens before a chunk may be emitted.
pub const DEFAULT_MIN_TOKENS: usize = 15;

/// Default target maximum tokens per chunk.
pub const DEFAULT_MAX_TOKENS: usize = 50;

/// Default port for the HTTP delivery endpoint.
pub const DEFAULT_PORT: u16 = 3109;

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Minimum tokens buffered before the chunker emits anything.
    pub min_tokens: usize,

    /// Target maximum tokens per chunk.
    pub max_tokens: usize,

    /// Seconds a finished, fully delivered session is kept for late polls.
    pub cleanup_grace_secs: u64,

    /// Voice used when a client does not name one.
    pub default_voice: String,

    pub host: String,
    pub port: u16,

    /// Directory of the synthesis model, if one should be loaded.
    pub model_dir: Option<PathBuf>,

    /// Poll interval while chunks keep arriving.
    pub poll_active_ms: u64,

    /// Poll interval when the last poll returned nothing.
    pub poll_idle_ms: u64,

    /// Read-along position sampling interval.
    pub progress_interval_ms: u64,

    /// Slack when deciding playback reached the end of scheduled audio.
    pub finish_tolerance_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            min_tokens: DEFAULT_MIN_TOKENS,
            max_tokens: DEFAULT_MAX_TOKENS,
            cleanup_grace_secs: 60,
            default_voice: "af_sarah".to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            model_dir: None,
            poll_active_ms: 30,
            poll_idle_ms: 80,
            progress_interval_ms: 50,
            finish_tolerance_ms: 50,
        }
    }

    #[must_use]
    pub const fn cleanup_grace(&self) -> Duration {
        Duration::from_secs(self.cleanup_grace_secs)
    }

    /// Socket address string for the HTTP server.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply an update, only touching fields that are `Some`.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(min) = other.min_tokens {
            self.min_tokens = min;
        }
        if let Some(max) = other.max_tokens {
            self.max_tokens = max;
        }
        if let Some(secs) = other.cleanup_grace_secs {
            self.cleanup_grace_secs = secs;
        }
        if let Some(ref voice) = other.default_voice {
            self.default_voice.clone_from(voice);
        }
        if let Some(ref host) = other.host {
            self.host.clone_from(host);
        }
        if let Some(port) = other.port {
            self.port = port;
        }
        if let Some(ref dir) = other.model_dir {
            self.model_dir.clone_from(dir);
        }
        if let Some(ms) = other.poll_active_ms {
            self.poll_active_ms = ms;
        }
        if let Some(ms) = other.poll_idle_ms {
            self.poll_idle_ms = ms;
        }
        if let Some(ms) = other.progress_interval_ms {
            self.progress_interval_ms = ms;
        }
        if let Some(ms) = other.finish_tolerance_ms {
            self.finish_tolerance_ms = ms;
        }
    }
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub min_tokens: Option<usize>,
    pub max_tokens: Option<usize>,
    pub cleanup_grace_secs: Option<u64>,
    pub default_voice: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model_dir: Option<Option<PathBuf>>,
    pub poll_active_ms: Option<u64>,
    pub poll_idle_ms: Option<u64>,
    pub progress_interval_ms: Option<u64>,
    pub finish_tolerance_ms: Option<u64>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("minTokens must be at least 1")]
    ZeroMinTokens,

    #[error("minTokens ({min}) must not exceed maxTokens ({max})")]
    MinAboveMax { min: usize, max: usize },

    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("Default voice cannot be empty")]
    EmptyVoice,

    #[error("Failed to read settings file {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Invalid settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.min_tokens == 0 {
        return Err(SettingsError::ZeroMinTokens);
    }
    if settings.min_tokens > settings.max_tokens {
        return Err(SettingsError::MinAboveMax {
            min: settings.min_tokens,
            max: settings.max_tokens,
        });
    }
    if settings.port < 1024 {
        return Err(SettingsError::InvalidPort(settings.port));
    }

    let intervals = [
        ("pollActiveMs", settings.poll_active_ms),
        ("pollIdleMs", settings.poll_idle_ms),
        ("progressIntervalMs", settings.progress_interval_ms),
    ];
    if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
        return Err(SettingsError::ZeroInterval(name));
    }

    if settings.default_voice.trim().is_empty() {
        return Err(SettingsError::EmptyVoice);
    }

    Ok(())
}

/// Load settings from a JSON file. Missing keys take their defaults.
pub fn load_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let settings: Settings = serde_json::from_str(&raw).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "Loaded settings file");
    Ok(settings)
}
