//! Playback Events
//!
//! Event-based communication for UI synchronization. The controller and the
//! sequencer queue events as their state changes; the session drains them
//! after every input and re-publishes them to subscribers.
//! Events are emitted at key points:
//! - Play/pause transitions
//! - Track changes (auto-advance, cross-track seek, track-list change)
//! - Progress updates (engine clock ticks and seek drags)
//! - Start sequence transitions

use crate::sequencer::SequencerState;
use platter_core::{SideId, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// A new side was loaded
    SideLoaded {
        /// ID of the loaded side
        side_id: SideId,
        /// Number of tracks
        track_count: usize,
        /// Total duration in seconds
        total_duration: f64,
    },

    /// The track list changed and the timeline was rebuilt
    TimelineChanged {
        /// Number of tracks
        track_count: usize,
        /// Total duration in seconds
        total_duration: f64,
    },

    /// Play/pause state changed
    StateChanged {
        /// Whether audio is playing
        is_playing: bool,
    },

    /// The current track changed
    TrackChanged {
        /// New current index
        index: usize,
        /// ID of the new current track
        track_id: TrackId,
    },

    /// Global progress changed
    ProgressChanged {
        /// Seconds from the start of the side
        progress: f64,
        /// Total duration in seconds
        total_duration: f64,
    },

    /// A deferred seek was applied after metadata loaded
    SeekApplied {
        /// Track the seek landed in
        index: usize,
        /// Local offset applied
        offset: f64,
    },

    /// The last track ended
    SideFinished,

    /// First transition into playing for the loaded side
    SessionStarted {
        /// ID of the side that started playing
        side_id: SideId,
    },

    /// A track's source could not be resolved; it will stall if reached
    SourceUnavailable {
        /// Track index
        index: usize,
        /// Track ID
        track_id: TrackId,
        /// Resolver-provided reason
        reason: String,
    },

    /// The start sequencer changed state
    SequencerChanged {
        /// The new state
        state: SequencerState,
    },

    /// Non-fatal error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}
