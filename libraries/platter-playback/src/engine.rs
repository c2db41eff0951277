//! Platform-agnostic media engine trait
//!
//! Abstracts the single media element that decodes and outputs one track at
//! a time (an HTML audio element in a webview, a decoder + output stream on
//! desktop, a simulated clock in tests).

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// The single underlying media engine
///
/// Only the playback controller touches it. Loading a source is
/// asynchronous: the engine reports [`EngineEvent::LoadedMetadata`] once the
/// new source can accept a position, and positions set before that point
/// are undefined on most engines.
pub trait MediaEngine: Send {
    /// Replace the current source
    ///
    /// `None` unloads the engine (the track has no playable source). Loading
    /// resets the local position to zero and pauses output until `play`.
    fn load(&mut self, url: Option<&str>);

    /// Start or resume output
    ///
    /// # Errors
    /// Returns [`PlaybackError::EngineRejected`](crate::PlaybackError) when the
    /// engine refuses (autoplay policy, corrupt or missing source).
    fn play(&mut self) -> Result<()>;

    /// Stop output, keeping the position
    fn pause(&mut self);

    /// Move to `seconds` from the start of the loaded track
    ///
    /// # Errors
    /// Returns an error if the engine cannot apply the position
    fn set_position(&mut self, seconds: f64) -> Result<()>;

    /// Current position within the loaded track
    ///
    /// Read on every time update, so it must reflect a position set by
    /// `set_position` immediately.
    fn position(&self) -> f64;
}

/// Notifications the engine reports back to the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Metadata for the loaded source is available; positions may be set
    LoadedMetadata,

    /// Periodic clock tick while output is running
    TimeUpdate {
        /// Position within the loaded track when the tick fired (seconds)
        position: f64,
    },

    /// The loaded track reached its natural end
    Ended,

    /// An asynchronous play request failed after `play` returned
    PlayFailed {
        /// Engine-provided reason
        reason: String,
    },
}
