//! Property-based tests for the timeline and seek resolution
//!
//! Uses proptest to verify invariants across many random track lists.

use platter_core::{Side, Track};
use platter_playback::{EngineEvent, MediaEngine, PlaybackController, Result, Timeline};
use proptest::prelude::*;

// ===== Helpers =====

fn arbitrary_durations() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            1 => Just(0.0),
            8 => 0.5f64..900.0,
        ],
        0..30,
    )
}

fn non_empty_durations() -> impl Strategy<Value = Vec<f64>> {
    arbitrary_durations().prop_filter("needs a playable side", |d| {
        d.iter().sum::<f64>() > 0.0
    })
}

/// Engine that accepts everything and remembers nothing
struct NullEngine;

impl MediaEngine for NullEngine {
    fn load(&mut self, _url: Option<&str>) {}

    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn set_position(&mut self, _seconds: f64) -> Result<()> {
        Ok(())
    }

    fn position(&self) -> f64 {
        0.0
    }
}

fn loaded_controller(durations: &[f64]) -> PlaybackController<NullEngine> {
    let side = durations
        .iter()
        .enumerate()
        .fold(Side::new("Side", "Artist"), |side, (i, d)| {
            side.with_track(Track::new(format!("T{i}"), *d, format!("/m/{i}.flac")))
        });

    let mut controller = PlaybackController::new(NullEngine);
    controller.load_side(side);
    for (index, track) in controller.unresolved_tracks() {
        controller.set_source(index, &track.id, Ok(format!("file:///m/{index}.flac")));
    }
    controller.handle_engine_event(EngineEvent::LoadedMetadata);
    controller
}

// ===== Property Tests =====

proptest! {
    /// Property: entries are contiguous, start at zero and end at the total
    #[test]
    fn entries_are_contiguous(durations in arbitrary_durations()) {
        let timeline = Timeline::build(durations.iter().copied());
        let entries = timeline.entries();

        prop_assert_eq!(entries.len(), durations.len());

        if let Some(first) = entries.first() {
            prop_assert_eq!(first.start, 0.0);
        }
        for pair in entries.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        for entry in entries {
            prop_assert!(entry.end >= entry.start);
            prop_assert!((entry.end - entry.start - entry.duration).abs() < 1e-9);
        }

        let last_end = entries.last().map_or(0.0, |e| e.end);
        prop_assert_eq!(last_end, timeline.total_duration());

        let sum: f64 = durations.iter().sum();
        prop_assert!((timeline.total_duration() - sum).abs() < 1e-6);
    }

    /// Property: every position in [0, total] resolves to exactly one entry
    #[test]
    fn every_position_resolves_once(
        durations in non_empty_durations(),
        fraction in 0.0f64..=1.0,
    ) {
        let timeline = Timeline::build(durations.iter().copied());
        let total = timeline.total_duration();
        let global = total * fraction;

        let containing = timeline
            .entries()
            .iter()
            .filter(|e| e.contains(global))
            .count();

        if global < total {
            prop_assert_eq!(containing, 1);
        } else {
            prop_assert_eq!(containing, 0);
            let target = timeline.resolve(global).unwrap();
            prop_assert_eq!(target.index, timeline.len() - 1);
        }
    }

    /// Property: resolving then mapping back returns the same position
    #[test]
    fn resolve_inverts_global_position(
        durations in non_empty_durations(),
        fraction in 0.0f64..=1.0,
    ) {
        let timeline = Timeline::build(durations.iter().copied());
        let global = timeline.total_duration() * fraction;

        let target = timeline.resolve(global).unwrap();
        let entry = timeline.get(target.index).unwrap();
        prop_assert!(target.offset >= 0.0 && target.offset <= entry.duration);

        let back = timeline.global_position(target.index, target.offset).unwrap();
        prop_assert!((back - global).abs() < 1e-6);
    }

    /// Property: zero-width entries are never the target of an interior seek
    #[test]
    fn zero_width_entries_are_skipped(
        durations in non_empty_durations(),
        fraction in 0.0f64..1.0,
    ) {
        let timeline = Timeline::build(durations.iter().copied());
        let global = timeline.total_duration() * fraction;
        prop_assume!(global < timeline.total_duration());

        let target = timeline.resolve(global).unwrap();
        prop_assert!(timeline.get(target.index).unwrap().duration > 0.0);
    }

    /// Property: out-of-range and non-finite seeks are clamped
    #[test]
    fn wild_seek_values_are_clamped(
        durations in non_empty_durations(),
        value in prop_oneof![
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            -1e9f64..1e9,
        ],
    ) {
        let timeline = Timeline::build(durations.iter().copied());
        let clamped = timeline.clamp(value);

        prop_assert!(clamped.is_finite());
        prop_assert!(clamped >= 0.0 && clamped <= timeline.total_duration());
        if !value.is_finite() {
            prop_assert_eq!(clamped, 0.0);
        }
    }

    /// Property: any seek sequence keeps the controller in bounds
    #[test]
    fn controller_stays_in_bounds_across_seeks(
        durations in non_empty_durations(),
        seeks in prop::collection::vec(-100.0f64..20_000.0, 1..20),
    ) {
        let mut controller = loaded_controller(&durations);

        for value in seeks {
            controller.seek_to(value);
            controller.handle_engine_event(EngineEvent::LoadedMetadata);

            prop_assert!(controller.current_index() < controller.track_count());
            prop_assert!(controller.progress() >= 0.0);
            prop_assert!(controller.progress() <= controller.total_duration());
            prop_assert!(controller.pending_seek().is_none());
        }
    }

    /// Property: natural ends walk the side one track at a time, then stop
    #[test]
    fn track_ends_advance_by_one(durations in non_empty_durations()) {
        let mut controller = loaded_controller(&durations);
        controller.play().unwrap();

        for expected in 1..durations.len() {
            controller.handle_engine_event(EngineEvent::Ended);
            controller.handle_engine_event(EngineEvent::LoadedMetadata);
            prop_assert_eq!(controller.current_index(), expected);
            prop_assert_eq!(controller.progress(), controller.timeline().start_of(expected));
            prop_assert!(controller.is_playing());
        }

        controller.handle_engine_event(EngineEvent::Ended);
        prop_assert!(!controller.is_playing());
        prop_assert_eq!(controller.progress(), controller.total_duration());
    }
}
