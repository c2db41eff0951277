//! Platter - Side Playback
//!
//! Turns the independently encoded tracks of one vinyl side into a single
//! continuously seekable timeline, with a scripted start-button and
//! needle-drop sequence before the audio starts.
//!
//! This crate provides:
//! - Timeline building (cumulative track ranges, global ↔ local positions)
//! - A side-level playback controller (play/pause, two-phase seek, deferred
//!   seeks across tracks, auto-advance)
//! - The start sequencer (start sound → needle drop → play)
//! - A tokio session that drives all of the above from one task
//!
//! # Architecture
//!
//! The timeline, controller and sequencer are synchronous state machines
//! with no clock and no I/O. Platform code plugs in through traits:
//! [`MediaEngine`] for the single audio element and [`CuePlayer`] for the
//! sequence sounds. Source resolution and "mark as played" come from the
//! collaborator traits in `platter-core`.
//!
//! # Example: Timeline
//!
//! ```rust
//! use platter_playback::Timeline;
//!
//! let timeline = Timeline::build([180.0, 210.0]);
//! assert_eq!(timeline.total_duration(), 390.0);
//!
//! let target = timeline.resolve(200.0).unwrap();
//! assert_eq!((target.index, target.offset), (1, 20.0));
//! ```
//!
//! # Example: Session
//!
//! ```rust,no_run
//! use platter_core::{FileSourceResolver, LoggingPlayedSink, Side};
//! use platter_playback::{
//!     Cue, CuePlayer, MediaEngine, PlaybackConfig, PlayerSession, Result,
//! };
//! use std::sync::Arc;
//!
//! struct Silent;
//!
//! impl MediaEngine for Silent {
//!     fn load(&mut self, _url: Option<&str>) {}
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) {}
//!     fn set_position(&mut self, _seconds: f64) -> Result<()> { Ok(()) }
//!     fn position(&self) -> f64 { 0.0 }
//! }
//!
//! impl CuePlayer for Silent {
//!     fn play(&mut self, _cue: Cue) {}
//!     fn stop(&mut self, _cue: Cue) {}
//!     fn duration(&self, _cue: Cue) -> Option<f64> { None }
//! }
//!
//! # async fn run(side: Side) -> Result<()> {
//! let (session, task) = PlayerSession::spawn(
//!     Silent,
//!     Silent,
//!     Arc::new(FileSourceResolver::new()),
//!     Arc::new(LoggingPlayedSink::new()),
//!     PlaybackConfig::default(),
//! );
//!
//! session.load_side(side)?;
//! session.request_start()?;
//! session.shutdown()?;
//! task.await.ok();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cancel;
mod controller;
mod engine;
mod error;
pub mod events;
pub mod sequencer;
mod session;
pub mod timeline;
pub mod types;

// Public exports
pub use cancel::{Generation, Ticket};
pub use controller::{PlaybackController, SourceState};
pub use engine::{EngineEvent, MediaEngine};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use sequencer::{Cue, CuePlayer, SequencerState, StartSequencer, TimerRequest, Transport};
pub use session::{EngineEventSender, PlayerSession, SessionHandle};
pub use timeline::{SeekTarget, Timeline, TimelineEntry};
pub use types::{PlaybackConfig, PlaybackSnapshot};
