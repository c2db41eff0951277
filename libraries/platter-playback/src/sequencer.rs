//! Start sequencer
//!
//! Reproduces dropping the needle on a record before audio starts: the
//! start-button sound, a pause for its length, the needle-drop sound,
//! another pause, then the actual `play()`. Once the needle has dropped in a
//! session, later starts only click the button and play immediately.
//!
//! The sequencer owns no clock. Each transition that needs a delay returns a
//! [`TimerRequest`]; the host arms a timer and hands the ticket back through
//! [`StartSequencer::on_timer`]. Stop and teardown invalidate the ticket, so a
//! timer that fires late can never start playback.

use crate::{
    cancel::{Generation, Ticket},
    events::PlaybackEvent,
    types::PlaybackConfig,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// Not sequencing
    Idle,
    /// Start-button sound playing, needle drop scheduled
    AwaitingStartSound,
    /// Needle-drop sound playing, audio start scheduled
    AwaitingNeedleDrop,
}

/// Sounds used by the start sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Mechanical start-button click
    StartButton,
    /// Stylus landing in the groove
    NeedleDrop,
}

/// Plays the sequence sounds
pub trait CuePlayer: Send {
    /// Start playing a cue from the beginning
    fn play(&mut self, cue: Cue);

    /// Stop a cue if it is playing
    fn stop(&mut self, cue: Cue);

    /// Length of the cue in seconds, if known
    ///
    /// Zero, negative and non-finite values are treated as unknown.
    fn duration(&self, cue: Cue) -> Option<f64>;
}

/// The play/pause entry points the sequencer drives
pub trait Transport {
    /// Whether audio is already playing
    fn is_playing(&self) -> bool;

    /// Start audio
    fn play(&mut self);

    /// Stop audio
    fn pause(&mut self);
}

/// A delay the host must schedule, identified by its ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    /// Ticket to pass back to [`StartSequencer::on_timer`]
    pub ticket: Ticket,
    /// How long to wait
    pub delay: Duration,
}

/// Start/needle-drop state machine
pub struct StartSequencer {
    state: SequencerState,
    has_dropped_needle_once: bool,
    timer: Generation,
    start_fallback: Duration,
    needle_fallback: Duration,
    click_on_stop: bool,
    pending_events: Vec<PlaybackEvent>,
}

impl StartSequencer {
    /// Create an idle sequencer
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            state: SequencerState::Idle,
            has_dropped_needle_once: false,
            timer: Generation::new(),
            start_fallback: config.start_cue_fallback(),
            needle_fallback: config.needle_drop_fallback(),
            click_on_stop: config.click_on_stop,
            pending_events: Vec::new(),
        }
    }

    /// Handle the "Start" button
    ///
    /// Ignored while a sequence runs or audio already plays.
    pub fn request_start(
        &mut self,
        transport: &mut dyn Transport,
        cues: &mut dyn CuePlayer,
    ) -> Option<TimerRequest> {
        if self.state != SequencerState::Idle {
            debug!(state = ?self.state, "start ignored while sequencing");
            return None;
        }
        if transport.is_playing() {
            debug!("start ignored while playing");
            return None;
        }

        cues.play(Cue::StartButton);

        if self.has_dropped_needle_once {
            transport.play();
            return None;
        }

        let delay = cue_delay(cues.duration(Cue::StartButton), self.start_fallback);
        let ticket = self.timer.issue();
        self.set_state(SequencerState::AwaitingStartSound);
        debug!(ticket = ticket.id(), ?delay, "start sound playing");

        Some(TimerRequest { ticket, delay })
    }

    /// Handle the "Pause" button
    ///
    /// Cancels any scheduled transition before pausing, from every state.
    pub fn request_stop(&mut self, transport: &mut dyn Transport, cues: &mut dyn CuePlayer) {
        self.cancel(cues);

        if self.click_on_stop {
            cues.play(Cue::StartButton);
        }

        transport.pause();
        self.set_state(SequencerState::Idle);
    }

    /// A scheduled timer fired
    ///
    /// Stale tickets (cancelled or superseded) are ignored.
    pub fn on_timer(
        &mut self,
        ticket: Ticket,
        transport: &mut dyn Transport,
        cues: &mut dyn CuePlayer,
    ) -> Option<TimerRequest> {
        if !self.timer.redeem(ticket) {
            debug!(ticket = ticket.id(), "ignoring stale sequencer timer");
            return None;
        }

        match self.state {
            SequencerState::AwaitingStartSound => {
                cues.play(Cue::NeedleDrop);
                self.has_dropped_needle_once = true;

                let delay = cue_delay(cues.duration(Cue::NeedleDrop), self.needle_fallback);
                let next = self.timer.issue();
                self.set_state(SequencerState::AwaitingNeedleDrop);
                debug!(ticket = next.id(), ?delay, "needle dropped");

                Some(TimerRequest {
                    ticket: next,
                    delay,
                })
            }
            SequencerState::AwaitingNeedleDrop => {
                self.set_state(SequencerState::Idle);
                transport.play();
                None
            }
            SequencerState::Idle => None,
        }
    }

    /// Release everything on teardown
    ///
    /// Same cancellation as a stop, without the click or a transport call.
    pub fn teardown(&mut self, cues: &mut dyn CuePlayer) {
        self.cancel(cues);
        self.set_state(SequencerState::Idle);
    }

    fn cancel(&mut self, cues: &mut dyn CuePlayer) {
        if let Some(ticket) = self.timer.cancel() {
            debug!(ticket = ticket.id(), "sequencer timer cancelled");
        }
        cues.stop(Cue::StartButton);
        cues.stop(Cue::NeedleDrop);
    }

    fn set_state(&mut self, state: SequencerState) {
        if self.state != state {
            self.state = state;
            self.pending_events
                .push(PlaybackEvent::SequencerChanged { state });
        }
    }

    /// Current state
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Whether a sequence is running
    pub fn is_sequencing(&self) -> bool {
        self.state != SequencerState::Idle
    }

    /// Whether the needle-drop sound has played in this session
    pub fn has_dropped_needle_once(&self) -> bool {
        self.has_dropped_needle_once
    }

    /// Whether a timer is scheduled
    pub fn has_outstanding_timer(&self) -> bool {
        self.timer.is_pending()
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

/// Cue length as a delay, or the fallback when unknown or unusable
fn cue_delay(seconds: Option<f64>, fallback: Duration) -> Duration {
    match seconds {
        Some(s) if s.is_finite() && s > 0.0 => Duration::try_from_secs_f64(s).unwrap_or(fallback),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeTransport {
        playing: bool,
        plays: usize,
        pauses: usize,
    }

    impl Transport for FakeTransport {
        fn is_playing(&self) -> bool {
            self.playing
        }

        fn play(&mut self) {
            self.playing = true;
            self.plays += 1;
        }

        fn pause(&mut self) {
            self.playing = false;
            self.pauses += 1;
        }
    }

    #[derive(Default)]
    struct FakeCues {
        played: Vec<Cue>,
        stopped: Vec<Cue>,
        start_len: Option<f64>,
        needle_len: Option<f64>,
    }

    impl CuePlayer for FakeCues {
        fn play(&mut self, cue: Cue) {
            self.played.push(cue);
        }

        fn stop(&mut self, cue: Cue) {
            self.stopped.push(cue);
        }

        fn duration(&self, cue: Cue) -> Option<f64> {
            match cue {
                Cue::StartButton => self.start_len,
                Cue::NeedleDrop => self.needle_len,
            }
        }
    }

    fn sequencer() -> StartSequencer {
        StartSequencer::new(&PlaybackConfig::default())
    }

    #[test]
    fn first_start_runs_full_sequence() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues::default();

        let first = seq.request_start(&mut transport, &mut cues).unwrap();
        assert_eq!(first.delay, Duration::from_millis(250));
        assert_eq!(seq.state(), SequencerState::AwaitingStartSound);
        assert_eq!(cues.played, vec![Cue::StartButton]);

        let second = seq.on_timer(first.ticket, &mut transport, &mut cues).unwrap();
        assert_eq!(second.delay, Duration::from_millis(900));
        assert_eq!(seq.state(), SequencerState::AwaitingNeedleDrop);
        assert_eq!(cues.played, vec![Cue::StartButton, Cue::NeedleDrop]);
        assert!(seq.has_dropped_needle_once());
        assert_eq!(transport.plays, 0);

        assert!(seq.on_timer(second.ticket, &mut transport, &mut cues).is_none());
        assert_eq!(seq.state(), SequencerState::Idle);
        assert_eq!(transport.plays, 1);
    }

    #[test]
    fn later_starts_skip_the_needle_drop() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues::default();

        let first = seq.request_start(&mut transport, &mut cues).unwrap();
        let second = seq.on_timer(first.ticket, &mut transport, &mut cues).unwrap();
        seq.on_timer(second.ticket, &mut transport, &mut cues);
        seq.request_stop(&mut transport, &mut cues);

        assert!(seq.request_start(&mut transport, &mut cues).is_none());
        assert_eq!(transport.plays, 2);
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[test]
    fn reentrant_start_is_ignored() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues::default();

        let first = seq.request_start(&mut transport, &mut cues).unwrap();
        assert!(seq.request_start(&mut transport, &mut cues).is_none());

        let second = seq.on_timer(first.ticket, &mut transport, &mut cues).unwrap();
        assert!(seq.request_start(&mut transport, &mut cues).is_none());
        seq.on_timer(second.ticket, &mut transport, &mut cues);

        assert_eq!(transport.plays, 1);
    }

    #[test]
    fn start_while_playing_is_ignored() {
        let mut seq = sequencer();
        let mut transport = FakeTransport {
            playing: true,
            ..Default::default()
        };
        let mut cues = FakeCues::default();

        assert!(seq.request_start(&mut transport, &mut cues).is_none());
        assert!(cues.played.is_empty());
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[test]
    fn stop_during_start_sound_cancels_everything() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues::default();

        let first = seq.request_start(&mut transport, &mut cues).unwrap();
        seq.request_stop(&mut transport, &mut cues);

        assert!(!seq.has_outstanding_timer());
        assert!(seq.on_timer(first.ticket, &mut transport, &mut cues).is_none());
        assert_eq!(transport.plays, 0);
        assert_eq!(transport.pauses, 1);
        assert!(cues.stopped.contains(&Cue::StartButton));
        assert!(cues.stopped.contains(&Cue::NeedleDrop));
        assert!(!seq.has_dropped_needle_once());
    }

    #[test]
    fn stop_during_needle_drop_prevents_late_play() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues::default();

        let first = seq.request_start(&mut transport, &mut cues).unwrap();
        let second = seq.on_timer(first.ticket, &mut transport, &mut cues).unwrap();
        seq.request_stop(&mut transport, &mut cues);

        assert!(seq.on_timer(second.ticket, &mut transport, &mut cues).is_none());
        assert_eq!(transport.plays, 0);
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[test]
    fn stop_clicks_unless_disabled() {
        let mut transport = FakeTransport::default();

        let mut cues = FakeCues::default();
        sequencer().request_stop(&mut transport, &mut cues);
        assert_eq!(cues.played, vec![Cue::StartButton]);

        let config = PlaybackConfig {
            click_on_stop: false,
            ..Default::default()
        };
        let mut cues = FakeCues::default();
        StartSequencer::new(&config).request_stop(&mut transport, &mut cues);
        assert!(cues.played.is_empty());
    }

    #[test]
    fn teardown_cancels_without_transport() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues::default();

        let first = seq.request_start(&mut transport, &mut cues).unwrap();
        seq.teardown(&mut cues);

        assert!(seq.on_timer(first.ticket, &mut transport, &mut cues).is_none());
        assert_eq!(transport.plays, 0);
        assert_eq!(transport.pauses, 0);
        assert_eq!(cues.played, vec![Cue::StartButton]);
    }

    #[test]
    fn reported_cue_lengths_are_used() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues {
            start_len: Some(0.4),
            needle_len: Some(1.5),
            ..Default::default()
        };

        let first = seq.request_start(&mut transport, &mut cues).unwrap();
        assert_eq!(first.delay, Duration::from_millis(400));
        let second = seq.on_timer(first.ticket, &mut transport, &mut cues).unwrap();
        assert_eq!(second.delay, Duration::from_millis(1500));
    }

    #[test]
    fn unusable_cue_lengths_fall_back() {
        let fallback = Duration::from_millis(250);

        assert_eq!(cue_delay(None, fallback), fallback);
        assert_eq!(cue_delay(Some(0.0), fallback), fallback);
        assert_eq!(cue_delay(Some(-1.0), fallback), fallback);
        assert_eq!(cue_delay(Some(f64::NAN), fallback), fallback);
        assert_eq!(cue_delay(Some(f64::INFINITY), fallback), fallback);
        assert_eq!(cue_delay(Some(1e300), fallback), fallback);
    }

    #[test]
    fn state_changes_are_reported() {
        let mut seq = sequencer();
        let mut transport = FakeTransport::default();
        let mut cues = FakeCues::default();

        seq.request_start(&mut transport, &mut cues);
        seq.request_stop(&mut transport, &mut cues);

        assert_eq!(
            seq.drain_events(),
            vec![
                PlaybackEvent::SequencerChanged {
                    state: SequencerState::AwaitingStartSound
                },
                PlaybackEvent::SequencerChanged {
                    state: SequencerState::Idle
                },
            ]
        );
    }
}
