//! Settings layering: defaults, then the JSON file, then flags.

use std::path::Path;

use anyhow::{Context, Result};
use readaloud_core::{Settings, SettingsUpdate, load_settings_file, validate_settings};

/// Load settings from `path` (or defaults), apply `overrides` and validate.
pub fn resolve_settings(path: Option<&Path>, overrides: &SettingsUpdate) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => load_settings_file(path)?,
        None => Settings::with_defaults(),
    };
    settings.merge(overrides);
    validate_settings(&settings).context("Invalid settings")?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 4000, "minTokens": 5, "maxTokens": 20}}"#).unwrap();

        let overrides = SettingsUpdate {
            port: Some(5000),
            ..SettingsUpdate::default()
        };
        let settings = resolve_settings(Some(file.path()), &overrides).unwrap();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.min_tokens, 5);
        assert_eq!(settings.max_tokens, 20);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let overrides = SettingsUpdate {
            min_tokens: Some(80),
            max_tokens: Some(10),
            ..SettingsUpdate::default()
        };
        let err = resolve_settings(None, &overrides).unwrap_err();
        assert!(err.to_string().contains("Invalid settings"));
    }
}
