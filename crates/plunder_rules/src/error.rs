//! # Rules Error Types
//!
//! All errors that can occur while building, loading or saving rules.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the rules engine.
#[derive(Error, Debug)]
pub enum LootError {
    /// A rule referenced a preset that is not in the catalog.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// A user pattern is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A profile or settings document could not be (de)serialized.
    ///
    /// Unknown match tags end up here.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Settings failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading or writing a file failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for LootError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LootError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for LootError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for rules operations.
pub type LootResult<T> = Result<T, LootError>;
