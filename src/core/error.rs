//! Error types for the streaming core

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted world state that cannot be trusted (bad seed text, malformed
    /// file name, truncated or tampered chunk blob).
    #[error("Corrupt world data in {}: {reason}", path.display())]
    CorruptWorldData { path: PathBuf, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Streaming error: {0}")]
    Streaming(String),
}

impl Error {
    /// Shorthand for building a [`Error::CorruptWorldData`].
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptWorldData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True if this error describes untrustworthy persisted data.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Error::CorruptWorldData { .. })
    }
}
