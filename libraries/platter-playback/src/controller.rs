//! Playback controller - side-level transport
//!
//! Owns the single media engine and presents a whole side as one seekable
//! timeline. Global positions are translated into (track, local offset)
//! pairs through the [`Timeline`], and the controller rolls the engine from
//! one track's source to the next as tracks end.

use crate::{
    cancel::{Generation, Ticket},
    engine::{EngineEvent, MediaEngine},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    sequencer::Transport,
    timeline::{SeekTarget, Timeline},
    types::PlaybackSnapshot,
};
use platter_core::{Side, SideId, Track, TrackId};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Resolution state of one track's playable source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceState {
    /// Resolution has not finished yet
    Pending,
    /// Playable URL
    Ready(String),
    /// Resolution failed; the track stalls if reached
    Unavailable(String),
}

impl SourceState {
    fn url(&self) -> Option<&str> {
        match self {
            SourceState::Ready(url) => Some(url),
            SourceState::Pending | SourceState::Unavailable(_) => None,
        }
    }
}

/// A local offset waiting for the target track's metadata
#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    ticket: Ticket,
    index: usize,
    offset: f64,
}

/// What the engine currently holds
#[derive(Debug, Clone)]
struct LoadedSource {
    index: usize,
    url: Option<String>,
    metadata_ready: bool,
}

/// Side-level playback controller
///
/// Single-threaded state machine: every input (transport call, engine
/// event, resolved source) is a method call, and every observable change is
/// queued as a [`PlaybackEvent`] for [`drain_events`](Self::drain_events).
pub struct PlaybackController<E: MediaEngine> {
    engine: E,

    // Side
    side_id: Option<SideId>,
    tracks: Vec<Track>,
    timeline: Timeline,
    sources: Vec<SourceState>,

    // State
    current_index: usize,
    is_playing: bool,
    progress: f64,
    is_seeking: bool,
    loaded: Option<LoadedSource>,

    // Deferred seek
    pending_seek: Option<PendingSeek>,
    seek_generation: Generation,

    // Whether SessionStarted was emitted for the loaded side
    session_started: bool,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<E: MediaEngine> PlaybackController<E> {
    /// Create a controller around the media engine
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            side_id: None,
            tracks: Vec::new(),
            timeline: Timeline::default(),
            sources: Vec::new(),
            current_index: 0,
            is_playing: false,
            progress: 0.0,
            is_seeking: false,
            loaded: None,
            pending_seek: None,
            seek_generation: Generation::new(),
            session_started: false,
            pending_events: Vec::new(),
        }
    }

    // ===== Side Loading =====

    /// Load a new side, starting a fresh playback session
    ///
    /// Playback stops, the position returns to the start of the first track
    /// and every source goes back to pending resolution.
    pub fn load_side(&mut self, side: Side) {
        if self.is_playing {
            self.engine.pause();
            self.is_playing = false;
            self.emit(PlaybackEvent::StateChanged { is_playing: false });
        }

        debug!(side = %side.id, tracks = side.tracks.len(), "loading side");

        self.side_id = Some(side.id.clone());
        self.session_started = false;
        self.timeline = Timeline::from_tracks(&side.tracks);
        self.sources = vec![SourceState::Pending; side.tracks.len()];
        self.tracks = side.tracks;
        self.current_index = 0;
        self.progress = 0.0;
        self.is_seeking = false;
        self.cancel_pending_seek();

        self.emit(PlaybackEvent::SideLoaded {
            side_id: side.id,
            track_count: self.tracks.len(),
            total_duration: self.timeline.total_duration(),
        });
        self.emit_track_changed();
        self.emit_progress();
        self.sync_engine();
    }

    /// Replace the track list of the loaded side
    ///
    /// Rebuilds the timeline and clamps the current index into bounds.
    /// Progress moves to the current track's start unless a seek is pending.
    /// Sources already resolved for an unchanged track (same id and locator)
    /// are kept.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        let previous_track = self.current_track().map(|t| t.id.clone());

        let mut known: HashMap<(TrackId, String), SourceState> = self
            .tracks
            .drain(..)
            .zip(self.sources.drain(..))
            .map(|(track, source)| ((track.id, track.locator), source))
            .collect();

        self.sources = tracks
            .iter()
            .map(|t| {
                known
                    .remove(&(t.id.clone(), t.locator.clone()))
                    .unwrap_or(SourceState::Pending)
            })
            .collect();
        self.timeline = Timeline::from_tracks(&tracks);
        self.tracks = tracks;

        self.current_index = self
            .current_index
            .min(self.tracks.len().saturating_sub(1));

        if self
            .pending_seek
            .is_some_and(|p| p.index >= self.tracks.len())
        {
            self.cancel_pending_seek();
        }

        debug!(
            tracks = self.tracks.len(),
            current = self.current_index,
            "track list changed"
        );

        self.emit(PlaybackEvent::TimelineChanged {
            track_count: self.tracks.len(),
            total_duration: self.timeline.total_duration(),
        });

        if self.current_track().map(|t| &t.id) != previous_track.as_ref() {
            self.emit_track_changed();
        }

        if self.pending_seek.is_none() {
            self.progress = self.timeline.start_of(self.current_index);
        } else {
            self.progress = self.timeline.clamp(self.progress);
        }
        self.emit_progress();

        if self.tracks.is_empty() && self.is_playing {
            self.engine.pause();
            self.is_playing = false;
            self.emit(PlaybackEvent::StateChanged { is_playing: false });
        }

        self.sync_engine();
    }

    /// Tracks whose sources still need resolving, with their indices
    pub fn unresolved_tracks(&self) -> Vec<(usize, Track)> {
        self.tracks
            .iter()
            .zip(&self.sources)
            .enumerate()
            .filter(|(_, (_, source))| **source == SourceState::Pending)
            .map(|(index, (track, _))| (index, track.clone()))
            .collect()
    }

    /// Record the outcome of resolving a track's source
    ///
    /// Ignored when the track at `index` is no longer `track_id` (the list
    /// changed while resolution was in flight).
    pub fn set_source(
        &mut self,
        index: usize,
        track_id: &TrackId,
        result: std::result::Result<String, String>,
    ) {
        if self.tracks.get(index).map(|t| &t.id) != Some(track_id) {
            debug!(index, track = %track_id, "dropping source for replaced track");
            return;
        }

        self.sources[index] = match result {
            Ok(url) => SourceState::Ready(url),
            Err(reason) => {
                warn!(index, track = %track_id, %reason, "track source unavailable");
                self.emit(PlaybackEvent::SourceUnavailable {
                    index,
                    track_id: track_id.clone(),
                    reason: reason.clone(),
                });
                SourceState::Unavailable(reason)
            }
        };

        if index == self.current_index {
            self.sync_engine();
        }
    }

    // ===== Playback Control =====

    /// Start or resume playback
    ///
    /// No-op when already playing or when there is nothing to play. If the
    /// current track's source is still resolving, output starts as soon as
    /// it arrives.
    ///
    /// # Errors
    /// Returns [`PlaybackError::EngineRejected`] when the engine refuses to
    /// start; the controller stays paused and does not retry.
    pub fn play(&mut self) -> Result<()> {
        if self.is_playing {
            return Ok(());
        }
        if self.timeline.is_empty() {
            debug!("play requested with nothing loaded");
            return Err(PlaybackError::NoTrackLoaded);
        }

        if self.loaded_url().is_some() {
            if let Err(e) = self.engine.play() {
                warn!(error = %e, index = self.current_index, "engine rejected playback");
                self.emit(PlaybackEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        }

        self.is_playing = true;
        self.emit(PlaybackEvent::StateChanged { is_playing: true });

        if !self.session_started {
            self.session_started = true;
            if let Some(side_id) = self.side_id.clone() {
                self.emit(PlaybackEvent::SessionStarted { side_id });
            }
        }

        Ok(())
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !self.is_playing {
            return;
        }
        self.engine.pause();
        self.is_playing = false;
        self.emit(PlaybackEvent::StateChanged { is_playing: false });
    }

    /// Stop output and unload the engine
    pub fn release(&mut self) {
        self.pause();
        self.cancel_pending_seek();
        if self.loaded.take().is_some() {
            self.engine.load(None);
        }
    }

    // ===== Seek =====

    /// Start a seek drag; engine clock ticks no longer move progress
    pub fn begin_seek(&mut self) {
        self.is_seeking = true;
    }

    /// Move the displayed progress during a drag
    ///
    /// Non-finite values become zero; others are clamped to the side.
    pub fn set_pending_progress(&mut self, value: f64) {
        self.progress = self.timeline.clamp(value);
        self.emit_progress();
    }

    /// Finish a seek drag at the displayed progress
    ///
    /// Applies immediately when the target is inside the loaded track and
    /// its metadata is available; otherwise switches tracks as needed and
    /// defers the offset until the engine reports metadata loaded. Returns
    /// the resolved target, or `None` for an empty timeline.
    pub fn commit_seek(&mut self) -> Option<SeekTarget> {
        self.is_seeking = false;

        let Some(target) = self.timeline.resolve(self.progress) else {
            debug!("seek committed on empty timeline");
            return None;
        };

        let ready_here = self
            .loaded
            .as_ref()
            .is_some_and(|l| l.index == target.index && l.metadata_ready && l.url.is_some());

        if target.index == self.current_index && ready_here {
            self.cancel_pending_seek();
            self.apply_position(target.offset);
            debug!(index = target.index, offset = target.offset, "seek applied");
            return Some(target);
        }

        let ticket = self.seek_generation.issue();
        self.pending_seek = Some(PendingSeek {
            ticket,
            index: target.index,
            offset: target.offset,
        });
        debug!(
            index = target.index,
            offset = target.offset,
            ticket = ticket.id(),
            "seek deferred until metadata loads"
        );

        if target.index != self.current_index {
            self.current_index = target.index;
            self.emit_track_changed();
            self.sync_engine();
        }

        Some(target)
    }

    /// Seek to a global position in one step
    pub fn seek_to(&mut self, global: f64) -> Option<SeekTarget> {
        self.begin_seek();
        self.set_pending_progress(global);
        self.commit_seek()
    }

    // ===== Engine Events =====

    /// Feed an engine notification into the controller
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LoadedMetadata => self.on_metadata_loaded(),
            EngineEvent::TimeUpdate { position } => self.on_time_update(position),
            EngineEvent::Ended => self.on_track_ended(),
            EngineEvent::PlayFailed { reason } => self.on_play_failed(reason),
        }
    }

    fn on_metadata_loaded(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        loaded.metadata_ready = true;
        let loaded_index = loaded.index;

        let Some(pending) = self.pending_seek.take() else {
            return;
        };

        if pending.index != loaded_index {
            self.pending_seek = Some(pending);
            return;
        }
        if !self.seek_generation.redeem(pending.ticket) {
            debug!(ticket = pending.ticket.id(), "dropping stale pending seek");
            return;
        }

        self.apply_position(pending.offset);
        if let Some(global) = self.timeline.global_position(pending.index, pending.offset) {
            self.progress = global;
        }
        self.emit(PlaybackEvent::SeekApplied {
            index: pending.index,
            offset: pending.offset,
        });
        self.emit_progress();
    }

    /// Engine clock tick
    ///
    /// The reported position may predate a seek the engine has already
    /// applied, so progress follows the engine's current position instead.
    fn on_time_update(&mut self, reported: f64) {
        if self.is_seeking || !self.is_playing || self.pending_seek.is_some() {
            return;
        }
        if !self.current_metadata_ready() {
            return;
        }

        let position = self.engine.position();
        if (position - reported).abs() > f64::EPSILON {
            trace!(reported, position, "time update behind engine position");
        }

        let start = self.timeline.start_of(self.current_index);
        let local = if position.is_finite() { position } else { 0.0 };
        self.progress = self.timeline.clamp(start + local);
        self.emit_progress();
    }

    fn on_track_ended(&mut self) {
        if self.timeline.is_empty() {
            return;
        }
        // Only a source that reported metadata can end; anything else is
        // left over from a source that has since been replaced
        if !self.current_metadata_ready() {
            debug!(index = self.current_index, "ignoring end of replaced source");
            return;
        }

        self.cancel_pending_seek();

        if self.current_index + 1 < self.timeline.len() {
            self.current_index += 1;
            debug!(index = self.current_index, "advancing to next track");
            self.emit_track_changed();
            // A drag in progress owns the displayed position
            if !self.is_seeking {
                self.progress = self.timeline.start_of(self.current_index);
                self.emit_progress();
            }
            self.sync_engine();
        } else {
            debug!("side finished");
            self.engine.pause();
            let was_playing = self.is_playing;
            self.is_playing = false;
            if was_playing {
                self.emit(PlaybackEvent::StateChanged { is_playing: false });
            }
            if !self.is_seeking {
                self.progress = self.timeline.total_duration();
                self.emit_progress();
            }
            self.emit(PlaybackEvent::SideFinished);
        }
    }

    fn on_play_failed(&mut self, reason: String) {
        warn!(%reason, index = self.current_index, "engine playback failed");
        self.emit(PlaybackEvent::Error {
            message: PlaybackError::engine_rejected(reason).to_string(),
        });
        if self.is_playing {
            self.is_playing = false;
            self.emit(PlaybackEvent::StateChanged { is_playing: false });
        }
    }

    // ===== Internal =====

    /// Make the engine hold the current track's source
    ///
    /// Reloads only when the index or URL differs from what is loaded, and
    /// resumes output on the new source while playing.
    fn sync_engine(&mut self) {
        if self.tracks.is_empty() {
            if self.loaded.take().is_some() {
                self.engine.load(None);
            }
            return;
        }

        let desired = self
            .sources
            .get(self.current_index)
            .and_then(SourceState::url)
            .map(str::to_owned);

        let up_to_date = self
            .loaded
            .as_ref()
            .is_some_and(|l| l.index == self.current_index && l.url == desired);
        if up_to_date {
            return;
        }

        debug!(index = self.current_index, url = ?desired, "loading source");
        self.engine.load(desired.as_deref());
        self.loaded = Some(LoadedSource {
            index: self.current_index,
            url: desired.clone(),
            metadata_ready: false,
        });

        if self.is_playing && desired.is_some() {
            if let Err(e) = self.engine.play() {
                warn!(error = %e, index = self.current_index, "engine rejected playback");
                self.is_playing = false;
                self.emit(PlaybackEvent::Error {
                    message: e.to_string(),
                });
                self.emit(PlaybackEvent::StateChanged { is_playing: false });
            }
        }
    }

    fn apply_position(&mut self, offset: f64) {
        if let Err(e) = self.engine.set_position(offset) {
            warn!(error = %e, offset, "engine could not apply position");
            self.emit(PlaybackEvent::Error {
                message: e.to_string(),
            });
        }
    }

    fn cancel_pending_seek(&mut self) {
        if let Some(pending) = self.pending_seek.take() {
            debug!(ticket = pending.ticket.id(), "pending seek cancelled");
        }
        self.seek_generation.cancel();
    }

    fn current_metadata_ready(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|l| l.index == self.current_index && l.metadata_ready)
    }

    fn loaded_url(&self) -> Option<&str> {
        self.loaded
            .as_ref()
            .filter(|l| l.index == self.current_index)
            .and_then(|l| l.url.as_deref())
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn emit_progress(&mut self) {
        self.emit(PlaybackEvent::ProgressChanged {
            progress: self.progress,
            total_duration: self.timeline.total_duration(),
        });
    }

    fn emit_track_changed(&mut self) {
        if let Some(track) = self.tracks.get(self.current_index) {
            let track_id = track.id.clone();
            self.emit(PlaybackEvent::TrackChanged {
                index: self.current_index,
                track_id,
            });
        }
    }

    // ===== State Queries =====

    /// Seconds from the start of the side
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Total side duration in seconds
    pub fn total_duration(&self) -> f64 {
        self.timeline.total_duration()
    }

    /// Zero-based current track index
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current track, if any
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    /// Number of tracks on the side
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Whether audio is playing
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether a seek drag is in progress
    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }

    /// The deferred seek, if one is waiting for metadata
    pub fn pending_seek(&self) -> Option<SeekTarget> {
        self.pending_seek.map(|p| SeekTarget {
            index: p.index,
            offset: p.offset,
        })
    }

    /// Source state of the track at `index`
    pub fn source_state(&self, index: usize) -> Option<&SourceState> {
        self.sources.get(index)
    }

    /// The side timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// ID of the loaded side
    pub fn side_id(&self) -> Option<&SideId> {
        self.side_id.as_ref()
    }

    /// Transport state for presentation
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            progress: self.progress,
            total_duration: self.timeline.total_duration(),
            current_index: self.current_index,
            track_count: self.tracks.len(),
            is_playing: self.is_playing,
            is_seeking: self.is_seeking,
            is_sequencing: false,
        }
    }

    /// Borrow the engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Whether events are waiting to be drained
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }
}

impl<E: MediaEngine> Transport for PlaybackController<E> {
    fn is_playing(&self) -> bool {
        self.is_playing
    }

    fn play(&mut self) {
        // Rejections are already logged and queued as an Error event
        if let Err(e) = PlaybackController::play(self) {
            debug!(error = %e, "start sequence could not start playback");
        }
    }

    fn pause(&mut self) {
        PlaybackController::pause(self);
    }
}
