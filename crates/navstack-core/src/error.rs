#![forbid(unsafe_code)]

//! Error types.
//!
//! The synchronizer itself never returns errors; every edge case resolves to
//! a no-op. These types exist for the collaborators around it: durable
//! storage, configuration loading, and decoding host state.

use std::fmt;

/// Failure reported by a [`crate::KeyValueStore`].
///
/// Callers in the runtime log these and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is not available in this environment (private mode, no window).
    Unavailable,
    /// The write did not fit.
    QuotaExceeded,
    /// The stored value could not be interpreted.
    Corrupt(String),
    /// Any other backend-specific failure.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "storage unavailable"),
            Self::QuotaExceeded => write!(f, "storage quota exceeded"),
            Self::Corrupt(detail) => write!(f, "stored value corrupt: {detail}"),
            Self::Backend(detail) => write!(f, "storage backend error: {detail}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Failure decoding host history state text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDecodeError {
    /// The state text was not valid JSON.
    InvalidJson(String),
}

impl fmt::Display for RecordDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(detail) => write!(f, "history state is not JSON: {detail}"),
        }
    }
}

impl std::error::Error for RecordDecodeError {}

/// Errors from loading a [`crate::ShellConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// The config parsed but failed validation.
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Invalid(problems) => {
                write!(f, "invalid config: {}", problems.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}
