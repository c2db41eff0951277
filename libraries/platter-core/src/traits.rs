/// Collaborator traits consumed by the playback core
use crate::error::Result;
use crate::types::{SideId, Track};
use async_trait::async_trait;

/// Turns a track's storage locator into a URL the media engine can load
///
/// Resolution is asynchronous and may fail. A failure only makes that one
/// track unplayable; it is never fatal to the session.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolve the track's locator to a playable URL
    ///
    /// # Errors
    /// Returns an error if the locator does not point at playable audio
    async fn resolve(&self, track: &Track) -> Result<String>;
}

/// Receives the "mark as played" notification for a side
///
/// Called at most once per playback session, on the first transition into
/// the playing state.
#[async_trait]
pub trait PlayedSink: Send + Sync {
    /// Record that the side started playing
    ///
    /// # Errors
    /// Returns an error if the play could not be recorded
    async fn mark_played(&self, side: &SideId) -> Result<()>;
}
