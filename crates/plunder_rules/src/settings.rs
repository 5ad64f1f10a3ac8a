//! # Looter Settings
//!
//! Flat, kebab-case settings document. JSON is the persisted format; TOML is
//! accepted for hand-written files (chosen by the `.toml` extension).
//!
//! Missing keys take their defaults, so an empty document is valid.

use std::fs;
use std::path::Path;
use std::time::Duration;

use plunder_shared::constants::{
    DEFAULT_ACTION_DELAY_MS, DEFAULT_MARK_COLOR, DEFAULT_MAX_OPEN_ATTEMPTS, DEFAULT_REFRESH_RATE_MS,
};
use plunder_shared::Hue;
use serde::{Deserialize, Serialize};

use crate::error::{LootError, LootResult};

/// Looter tuning and bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LooterSettings {
    /// Failed opens before a container is abandoned for the run.
    pub max_open_attempts: u32,
    /// Pause after every move (ms).
    pub action_delay: u64,
    /// Idle pause (ms).
    pub refresh_rate: u64,
    /// Take the first match across already-open containers instead of opening everything first.
    pub greedy_looting: bool,
    /// Tint drained containers.
    pub mark_after_finished: bool,
    /// Tint used for drained containers.
    pub mark_color: Hue,
    /// Profile file used last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_profile_filename: Option<String>,
    /// Profile name used last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_profile_name: Option<String>,
}

impl Default for LooterSettings {
    fn default() -> Self {
        Self {
            max_open_attempts: DEFAULT_MAX_OPEN_ATTEMPTS,
            action_delay: DEFAULT_ACTION_DELAY_MS,
            refresh_rate: DEFAULT_REFRESH_RATE_MS,
            greedy_looting: false,
            mark_after_finished: false,
            mark_color: DEFAULT_MARK_COLOR,
            last_profile_filename: None,
            last_profile_name: None,
        }
    }
}

impl LooterSettings {
    /// Pause after every move.
    #[inline]
    #[must_use]
    pub const fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay)
    }

    /// Idle pause.
    #[inline]
    #[must_use]
    pub const fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate)
    }

    /// Checks the values the looter relies on.
    ///
    /// # Errors
    ///
    /// [`LootError::InvalidConfig`] when `max-open-attempts` is zero.
    pub fn validate(&self) -> LootResult<()> {
        if self.max_open_attempts == 0 {
            return Err(LootError::InvalidConfig(
                "max-open-attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] or [`LootError::InvalidConfig`].
    pub fn from_json(text: &str) -> LootResult<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] or [`LootError::InvalidConfig`].
    pub fn from_toml(text: &str) -> LootResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads a settings file, TOML when the extension says so, JSON otherwise.
    ///
    /// # Errors
    ///
    /// [`LootError::Io`] when the file cannot be read, otherwise as the parsers.
    pub fn load(path: impl AsRef<Path>) -> LootResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LootError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if is_toml(path) {
            Self::from_toml(&text)
        } else {
            Self::from_json(&text)
        }
    }

    /// Writes the settings in the format matching the extension.
    ///
    /// # Errors
    ///
    /// [`LootError::Io`] when the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> LootResult<()> {
        let path = path.as_ref();
        let text = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        fs::write(path, text).map_err(|source| LootError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
