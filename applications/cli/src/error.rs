//! Error types for the command-line host

use thiserror::Error;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Side or resolver error
    #[error(transparent)]
    Core(#[from] platter_core::CoreError),

    /// Playback session error
    #[error(transparent)]
    Playback(#[from] platter_playback::PlaybackError),

    /// Terminal output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
