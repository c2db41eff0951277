//! Side timeline
//!
//! Maps the ordered tracks of a side onto one continuous time axis. Each
//! track owns the half-open range `[start, end)`; ranges are contiguous,
//! start at zero and end at the side's total duration.

use platter_core::Track;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Range a single track occupies on the side's time axis (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Track index within the side
    pub index: usize,
    /// Cumulative duration of all earlier tracks
    pub start: f64,
    /// `start + duration`
    pub end: f64,
    /// Track duration
    pub duration: f64,
}

impl TimelineEntry {
    /// Whether `global` falls inside `[start, end)`
    ///
    /// Always false for zero-width entries.
    pub fn contains(&self, global: f64) -> bool {
        global >= self.start && global < self.end
    }
}

/// Where a global position lands: which track, and how far into it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekTarget {
    /// Track index
    pub index: usize,
    /// Offset from the start of the track, within `[0, duration]`
    pub offset: f64,
}

/// Cumulative range table for one track list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    total_duration: f64,
}

impl Timeline {
    /// Build the table from durations in play order
    ///
    /// Negative or non-finite durations are treated as zero.
    pub fn build<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut cumulative = 0.0;
        let entries = durations
            .into_iter()
            .enumerate()
            .map(|(index, duration)| {
                let duration = sanitize_duration(index, duration);
                let start = cumulative;
                cumulative += duration;
                TimelineEntry {
                    index,
                    start,
                    end: cumulative,
                    duration,
                }
            })
            .collect();

        Self {
            entries,
            total_duration: cumulative,
        }
    }

    /// Build the table from a track list
    pub fn from_tracks(tracks: &[Track]) -> Self {
        Self::build(tracks.iter().map(|t| t.duration))
    }

    /// All entries in play order
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Entry for a track index
    pub fn get(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there is nothing to play
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all durations
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Start of the track at `index`, or zero when out of range
    pub fn start_of(&self, index: usize) -> f64 {
        self.entries.get(index).map_or(0.0, |e| e.start)
    }

    /// Clamp a global position into `[0, total_duration]`
    ///
    /// Non-finite input becomes zero.
    pub fn clamp(&self, global: f64) -> f64 {
        if global.is_finite() {
            global.clamp(0.0, self.total_duration)
        } else {
            0.0
        }
    }

    /// The entry owning `global`
    ///
    /// The first entry whose `[start, end)` contains the position; the last
    /// entry when none does (the exact end of the side). `None` only for an
    /// empty timeline.
    pub fn entry_at(&self, global: f64) -> Option<&TimelineEntry> {
        self.entries
            .iter()
            .find(|e| e.contains(global))
            .or_else(|| self.entries.last())
    }

    /// Resolve a global position to a track and local offset
    ///
    /// The position is clamped first, and the offset is clamped into the
    /// owning entry's duration.
    pub fn resolve(&self, global: f64) -> Option<SeekTarget> {
        let global = self.clamp(global);
        let entry = self.entry_at(global)?;
        let offset = (global - entry.start).clamp(0.0, entry.duration);
        Some(SeekTarget {
            index: entry.index,
            offset,
        })
    }

    /// Global position of `local` seconds into track `index`
    pub fn global_position(&self, index: usize, local: f64) -> Option<f64> {
        let entry = self.entries.get(index)?;
        let local = if local.is_finite() { local } else { 0.0 };
        Some(entry.start + local.clamp(0.0, entry.duration))
    }
}

fn sanitize_duration(index: usize, duration: f64) -> f64 {
    if duration.is_finite() && duration >= 0.0 {
        duration
    } else {
        warn!(index, duration, "invalid track duration, treating as zero");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_track_side() {
        let timeline = Timeline::build([180.0, 210.0]);

        assert_eq!(
            timeline.entries(),
            &[
                TimelineEntry { index: 0, start: 0.0, end: 180.0, duration: 180.0 },
                TimelineEntry { index: 1, start: 180.0, end: 390.0, duration: 210.0 },
            ]
        );
        assert_eq!(timeline.total_duration(), 390.0);
    }

    #[test]
    fn resolve_inside_second_track() {
        let timeline = Timeline::build([180.0, 210.0]);
        assert_eq!(
            timeline.resolve(200.0),
            Some(SeekTarget { index: 1, offset: 20.0 })
        );
    }

    #[test]
    fn resolve_exact_end_falls_back_to_last_entry() {
        let timeline = Timeline::build([180.0, 210.0]);
        assert_eq!(
            timeline.resolve(390.0),
            Some(SeekTarget { index: 1, offset: 210.0 })
        );
    }

    #[test]
    fn resolve_boundary_belongs_to_next_track() {
        let timeline = Timeline::build([180.0, 210.0]);
        assert_eq!(
            timeline.resolve(180.0),
            Some(SeekTarget { index: 1, offset: 0.0 })
        );
    }

    #[test]
    fn resolve_clamps_out_of_range_and_nan() {
        let timeline = Timeline::build([180.0, 210.0]);

        assert_eq!(timeline.resolve(-5.0), Some(SeekTarget { index: 0, offset: 0.0 }));
        assert_eq!(timeline.resolve(f64::NAN), Some(SeekTarget { index: 0, offset: 0.0 }));
        assert_eq!(
            timeline.resolve(10_000.0),
            Some(SeekTarget { index: 1, offset: 210.0 })
        );
    }

    #[test]
    fn zero_width_track_is_skipped_but_addressable() {
        let timeline = Timeline::build([10.0, 0.0, 5.0]);

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.get(1).unwrap().start, 10.0);
        assert_eq!(timeline.get(1).unwrap().end, 10.0);
        assert_eq!(timeline.resolve(10.0), Some(SeekTarget { index: 2, offset: 0.0 }));
    }

    #[test]
    fn empty_timeline_has_nothing_to_resolve() {
        let timeline = Timeline::build(Vec::new());

        assert!(timeline.is_empty());
        assert_eq!(timeline.total_duration(), 0.0);
        assert_eq!(timeline.resolve(0.0), None);
        assert_eq!(timeline.start_of(0), 0.0);
    }

    #[test]
    fn invalid_durations_become_zero() {
        let timeline = Timeline::build([5.0, -3.0, f64::INFINITY, 2.0]);

        assert_eq!(timeline.total_duration(), 7.0);
        assert_eq!(timeline.get(1).unwrap().duration, 0.0);
        assert_eq!(timeline.get(2).unwrap().duration, 0.0);
        assert_eq!(timeline.get(3).unwrap().start, 5.0);
    }

    #[test]
    fn global_position_is_inverse_of_resolve() {
        let timeline = Timeline::build([180.0, 210.0]);

        assert_eq!(timeline.global_position(1, 20.0), Some(200.0));
        assert_eq!(timeline.global_position(0, 999.0), Some(180.0));
        assert_eq!(timeline.global_position(2, 0.0), None);
    }
}
