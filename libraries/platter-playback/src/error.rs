//! Error types for playback management

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// The media engine refused to start playback
    #[error("Engine rejected playback: {0}")]
    EngineRejected(String),

    /// The media engine failed to apply a position
    #[error("Engine seek failed: {0}")]
    EngineSeek(String),

    /// The session task is no longer running
    #[error("Session closed")]
    SessionClosed,
}

impl PlaybackError {
    /// Create an engine rejection error
    pub fn engine_rejected(msg: impl Into<String>) -> Self {
        Self::EngineRejected(msg.into())
    }

    /// Create an engine seek error
    pub fn engine_seek(msg: impl Into<String>) -> Self {
        Self::EngineSeek(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
