//! Player session
//!
//! Runs the controller and the start sequencer on one tokio task. Every input
//! (transport request, engine notification, resolved source, sequencer timer)
//! is serialized through the task's select loop, so the synchronous state
//! machines never see concurrent calls.
//!
//! ```text
//! SessionHandle ──commands──┐
//! EngineEventSender ──events─┼──> session task ──> broadcast<PlaybackEvent>
//! resolver task ──sources────┘          │      └─> watch<PlaybackSnapshot>
//!                                       └─> PlayedSink (spawned)
//! ```

use crate::{
    cancel::{Generation, Ticket},
    controller::PlaybackController,
    engine::{EngineEvent, MediaEngine},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    sequencer::{CuePlayer, StartSequencer, TimerRequest},
    types::{PlaybackConfig, PlaybackSnapshot},
};
use platter_core::{PlayedSink, Side, SideId, SourceResolver, Track, TrackId};
use std::sync::Arc;
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, error, info};

/// Commands accepted by the session task
#[derive(Debug)]
enum SessionCommand {
    LoadSide(Side),
    SetTracks(Vec<Track>),
    RequestStart,
    RequestStop,
    BeginSeek,
    UpdateSeek(f64),
    CommitSeek,
    Shutdown,
}

/// Outcome of resolving one track's source
#[derive(Debug)]
struct ResolvedSource {
    ticket: Ticket,
    index: usize,
    track_id: TrackId,
    result: std::result::Result<String, String>,
}

/// Sender the media engine implementation uses to report its events
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineEventSender {
    /// Report an engine event to the session
    ///
    /// # Errors
    /// Returns [`PlaybackError::SessionClosed`] once the session has ended
    pub fn send(&self, event: EngineEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| PlaybackError::SessionClosed)
    }
}

/// Cloneable handle to a running session
///
/// The session ends on [`shutdown`](Self::shutdown) or once every handle is
/// dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    engine_events: EngineEventSender,
    events: broadcast::Sender<PlaybackEvent>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
}

impl SessionHandle {
    /// Load a side, starting a fresh playback session
    pub fn load_side(&self, side: Side) -> Result<()> {
        self.send(SessionCommand::LoadSide(side))
    }

    /// Replace the track list of the loaded side
    pub fn set_tracks(&self, tracks: Vec<Track>) -> Result<()> {
        self.send(SessionCommand::SetTracks(tracks))
    }

    /// Press "Start"
    pub fn request_start(&self) -> Result<()> {
        self.send(SessionCommand::RequestStart)
    }

    /// Press "Pause"
    pub fn request_stop(&self) -> Result<()> {
        self.send(SessionCommand::RequestStop)
    }

    /// Start dragging the seek bar
    pub fn begin_seek(&self) -> Result<()> {
        self.send(SessionCommand::BeginSeek)
    }

    /// Move the seek bar to a global position
    pub fn update_seek(&self, progress: f64) -> Result<()> {
        self.send(SessionCommand::UpdateSeek(progress))
    }

    /// Release the seek bar
    pub fn commit_seek(&self) -> Result<()> {
        self.send(SessionCommand::CommitSeek)
    }

    /// Seek to a global position in one step
    pub fn seek_to(&self, progress: f64) -> Result<()> {
        self.begin_seek()?;
        self.update_seek(progress)?;
        self.commit_seek()
    }

    /// Stop the sequence, release the engine and end the session task
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown)
    }

    /// Sender for the media engine implementation
    pub fn engine_events(&self) -> EngineEventSender {
        self.engine_events.clone()
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Receiver for the latest snapshot
    pub fn snapshot(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::SessionClosed)
    }
}

/// Entry point for starting a session
pub struct PlayerSession;

impl PlayerSession {
    /// Spawn the session task on the current tokio runtime
    pub fn spawn<E, C>(
        engine: E,
        cues: C,
        resolver: Arc<dyn SourceResolver>,
        sink: Arc<dyn PlayedSink>,
        config: PlaybackConfig,
    ) -> (SessionHandle, JoinHandle<()>)
    where
        E: MediaEngine + 'static,
        C: CuePlayer + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::default());

        let actor = SessionActor {
            controller: PlaybackController::new(engine),
            sequencer: StartSequencer::new(&config),
            cues,
            resolver,
            sink,
            config,
            resolution: Generation::new(),
            resolution_task: None,
            resolved_tx,
            timer: None,
            events: events_tx.clone(),
            snapshot: snapshot_tx,
        };

        let join = tokio::spawn(actor.run(command_rx, engine_rx, resolved_rx));

        let handle = SessionHandle {
            commands: command_tx,
            engine_events: EngineEventSender { tx: engine_tx },
            events: events_tx,
            snapshot: snapshot_rx,
        };

        (handle, join)
    }
}

struct SessionActor<E: MediaEngine, C: CuePlayer> {
    controller: PlaybackController<E>,
    sequencer: StartSequencer,
    cues: C,
    resolver: Arc<dyn SourceResolver>,
    sink: Arc<dyn PlayedSink>,
    config: PlaybackConfig,

    // Source resolution batches
    resolution: Generation,
    resolution_task: Option<JoinHandle<()>>,
    resolved_tx: mpsc::UnboundedSender<ResolvedSource>,

    // Armed sequencer timer
    timer: Option<(Ticket, Instant)>,

    events: broadcast::Sender<PlaybackEvent>,
    snapshot: watch::Sender<PlaybackSnapshot>,
}

impl<E: MediaEngine + 'static, C: CuePlayer + 'static> SessionActor<E, C> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut engine_events: mpsc::UnboundedReceiver<EngineEvent>,
        mut resolved: mpsc::UnboundedReceiver<ResolvedSource>,
    ) {
        debug!("player session started");

        loop {
            let deadline = self.timer.map(|(_, at)| at);

            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = engine_events.recv() => {
                    self.controller.handle_engine_event(event);
                }
                Some(source) = resolved.recv() => self.on_source_resolved(source),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_timer();
                }
            }

            self.publish();
        }

        self.sequencer.teardown(&mut self.cues);
        self.timer = None;
        self.abort_resolution();
        self.controller.release();
        self.publish();

        debug!("player session ended");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::LoadSide(side) => {
                // A fresh side gets a fresh start sequence
                self.sequencer.teardown(&mut self.cues);
                self.publish_sequencer_events();
                self.sequencer = StartSequencer::new(&self.config);
                self.timer = None;

                info!(side = %side.id, title = %side.title, "loading side");
                self.controller.load_side(side);
                self.resolve_sources();
            }
            SessionCommand::SetTracks(tracks) => {
                self.controller.set_tracks(tracks);
                self.resolve_sources();
            }
            SessionCommand::RequestStart => {
                let request = self
                    .sequencer
                    .request_start(&mut self.controller, &mut self.cues);
                self.arm(request);
            }
            SessionCommand::RequestStop => {
                self.sequencer
                    .request_stop(&mut self.controller, &mut self.cues);
                self.timer = None;
            }
            SessionCommand::BeginSeek => self.controller.begin_seek(),
            SessionCommand::UpdateSeek(progress) => self.controller.set_pending_progress(progress),
            SessionCommand::CommitSeek => {
                self.controller.commit_seek();
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn on_timer(&mut self) {
        let Some((ticket, _)) = self.timer.take() else {
            return;
        };
        let next = self
            .sequencer
            .on_timer(ticket, &mut self.controller, &mut self.cues);
        self.arm(next);
    }

    fn arm(&mut self, request: Option<TimerRequest>) {
        if let Some(request) = request {
            self.timer = Some((request.ticket, Instant::now() + request.delay));
        }
    }

    /// Resolve every pending source in a background task
    ///
    /// Supersedes any batch still in flight.
    fn resolve_sources(&mut self) {
        self.abort_resolution();

        let pending = self.controller.unresolved_tracks();
        if pending.is_empty() {
            return;
        }

        let ticket = self.resolution.issue();
        let resolver = Arc::clone(&self.resolver);
        let tx = self.resolved_tx.clone();
        debug!(ticket = ticket.id(), tracks = pending.len(), "resolving sources");

        self.resolution_task = Some(tokio::spawn(async move {
            for (index, track) in pending {
                let result = resolver.resolve(&track).await.map_err(|e| e.to_string());
                let source = ResolvedSource {
                    ticket,
                    index,
                    track_id: track.id,
                    result,
                };
                if tx.send(source).is_err() {
                    break;
                }
            }
        }));
    }

    fn abort_resolution(&mut self) {
        self.resolution.cancel();
        if let Some(task) = self.resolution_task.take() {
            task.abort();
        }
    }

    fn on_source_resolved(&mut self, source: ResolvedSource) {
        if !self.resolution.is_current(source.ticket) {
            debug!(
                ticket = source.ticket.id(),
                index = source.index,
                "dropping source from superseded track list"
            );
            return;
        }
        self.controller
            .set_source(source.index, &source.track_id, source.result);
    }

    fn report_played(&self, side_id: SideId) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.mark_played(&side_id).await {
                error!(side = %side_id, error = %e, "failed to mark side as played");
            }
        });
    }

    fn publish_sequencer_events(&mut self) {
        for event in self.sequencer.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }

    /// Re-publish queued events and refresh the snapshot
    fn publish(&mut self) {
        for event in self.controller.drain_events() {
            if let PlaybackEvent::SessionStarted { side_id } = &event {
                self.report_played(side_id.clone());
            }
            let _ = self.events.send(event);
        }
        self.publish_sequencer_events();

        let snapshot = PlaybackSnapshot {
            is_sequencing: self.sequencer.is_sequencing(),
            ..self.controller.snapshot()
        };
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
