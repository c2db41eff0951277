//! Simulated playback backend
//!
//! The CLI has no audio output. Instead a clock task advances a virtual
//! position for the loaded source and reports engine events exactly as a
//! real media element would: metadata shortly after a load, periodic time
//! updates while playing, and the natural end of the track.

use async_trait::async_trait;
use platter_core::{SourceResolver, Track};
use platter_playback::{
    Cue, CuePlayer, EngineEvent, EngineEventSender, MediaEngine, PlaybackError, Result,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Track durations by resolved URL
///
/// The simulated engine only ever sees URLs, so the resolver records each
/// track's authoritative duration under the URL it produced.
#[derive(Debug, Clone, Default)]
pub struct DurationIndex(Arc<Mutex<HashMap<String, f64>>>);

impl DurationIndex {
    fn insert(&self, url: String, duration: f64) {
        if let Ok(mut map) = self.0.lock() {
            map.insert(url, duration);
        }
    }

    fn get(&self, url: &str) -> Option<f64> {
        self.0.lock().ok().and_then(|map| map.get(url).copied())
    }
}

/// Resolver decorator that feeds the [`DurationIndex`]
pub struct IndexingResolver<R> {
    inner: R,
    index: DurationIndex,
}

impl<R: SourceResolver> IndexingResolver<R> {
    pub fn new(inner: R, index: DurationIndex) -> Self {
        Self { inner, index }
    }
}

#[async_trait]
impl<R: SourceResolver> SourceResolver for IndexingResolver<R> {
    async fn resolve(&self, track: &Track) -> platter_core::Result<String> {
        let url = self.inner.resolve(track).await?;
        self.index.insert(url.clone(), track.duration);
        Ok(url)
    }
}

#[derive(Debug, Default)]
struct ClockState {
    url: Option<String>,
    duration: f64,
    position: f64,
    playing: bool,
    metadata_pending: bool,
    ended: bool,
}

/// Media engine backed by a virtual clock
pub struct SimulatedEngine {
    state: Arc<Mutex<ClockState>>,
    durations: DurationIndex,
}

impl SimulatedEngine {
    pub fn new(durations: DurationIndex) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState::default())),
            durations,
        }
    }

    /// Handle for driving this engine's clock after the engine moves
    /// into a session
    pub fn clock(&self) -> SimulatedClock {
        SimulatedClock {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClockState>> {
        self.state
            .lock()
            .map_err(|_| PlaybackError::engine_rejected("simulated clock poisoned"))
    }
}

/// Virtual clock of a [`SimulatedEngine`]
pub struct SimulatedClock {
    state: Arc<Mutex<ClockState>>,
}

impl SimulatedClock {
    /// Start the task that ticks the clock and reports engine events
    ///
    /// The task ends once the session stops accepting events.
    pub fn spawn(self, events: EngineEventSender, tick: Duration, speed: f64) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let step = tick.as_secs_f64() * speed;

            loop {
                interval.tick().await;

                let pending = match self.state.lock() {
                    Ok(mut clock) => advance(&mut clock, step),
                    Err(_) => break,
                };

                for event in pending {
                    if events.send(event).is_err() {
                        debug!("session gone, stopping simulated clock");
                        return;
                    }
                }
            }
        })
    }
}

/// One clock tick: the events the engine reports for it
fn advance(clock: &mut ClockState, step: f64) -> Vec<EngineEvent> {
    let mut events = Vec::new();

    if clock.metadata_pending {
        clock.metadata_pending = false;
        events.push(EngineEvent::LoadedMetadata);
    }

    if clock.playing && !clock.ended {
        clock.position = (clock.position + step).min(clock.duration);
        events.push(EngineEvent::TimeUpdate {
            position: clock.position,
        });

        if clock.position >= clock.duration {
            clock.playing = false;
            clock.ended = true;
            events.push(EngineEvent::Ended);
        }
    }

    events
}

impl MediaEngine for SimulatedEngine {
    fn load(&mut self, url: Option<&str>) {
        let duration = url.and_then(|u| self.durations.get(u)).unwrap_or(0.0);
        if let Ok(mut clock) = self.state.lock() {
            *clock = ClockState {
                url: url.map(str::to_owned),
                duration,
                metadata_pending: url.is_some(),
                ..ClockState::default()
            };
        }
        debug!(?url, duration, "simulated engine loaded");
    }

    fn play(&mut self) -> Result<()> {
        let mut clock = self.lock()?;
        if clock.url.is_none() {
            return Err(PlaybackError::engine_rejected("no source loaded"));
        }
        clock.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        if let Ok(mut clock) = self.state.lock() {
            clock.playing = false;
        }
    }

    fn set_position(&mut self, seconds: f64) -> Result<()> {
        let mut clock = self.lock()?;
        if clock.url.is_none() {
            return Err(PlaybackError::engine_seek("no source loaded"));
        }
        clock.position = seconds.clamp(0.0, clock.duration);
        clock.ended = false;
        Ok(())
    }

    fn position(&self) -> f64 {
        self.state.lock().map_or(0.0, |clock| clock.position)
    }
}

/// Cue player that logs instead of making sound
#[derive(Debug, Default)]
pub struct LoggingCuePlayer {
    start_secs: Option<f64>,
    needle_secs: Option<f64>,
}

impl LoggingCuePlayer {
    pub fn new(start_secs: Option<f64>, needle_secs: Option<f64>) -> Self {
        Self {
            start_secs,
            needle_secs,
        }
    }
}

impl CuePlayer for LoggingCuePlayer {
    fn play(&mut self, cue: Cue) {
        match cue {
            Cue::StartButton => info!("*click*"),
            Cue::NeedleDrop => info!("*needle drops*"),
        }
    }

    fn stop(&mut self, cue: Cue) {
        debug!(?cue, "cue stopped");
    }

    fn duration(&self, cue: Cue) -> Option<f64> {
        let secs = match cue {
            Cue::StartButton => self.start_secs,
            Cue::NeedleDrop => self.needle_secs,
        };
        if secs.is_some_and(|s| !s.is_finite() || s <= 0.0) {
            warn!(?cue, ?secs, "ignoring unusable cue length");
            return None;
        }
        secs
    }
}
