//! Terminal output

use platter_core::Side;
use platter_playback::{PlaybackEvent, SequencerState, Timeline};
use std::fmt::Write;

/// Format seconds as `m:ss`, or `h:mm:ss` past the hour
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// The side's timeline as a plain-text table
pub fn timeline_table(side: &Side, timeline: &Timeline) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", side.artist, side.title);
    let _ = writeln!(out, "{:>3}  {:>8}  {:>8}  {:>8}  title", "#", "start", "end", "length");

    for (entry, track) in timeline.entries().iter().zip(&side.tracks) {
        let _ = writeln!(
            out,
            "{:>3}  {:>8}  {:>8}  {:>8}  {}",
            entry.index + 1,
            format_time(entry.start),
            format_time(entry.end),
            format_time(entry.duration),
            track.title
        );
    }

    let _ = writeln!(out, "total {}", format_time(timeline.total_duration()));
    out
}

/// One line for an event, or `None` for events not worth printing
///
/// Progress ticks are dropped unless `progress` is set.
pub fn describe(event: &PlaybackEvent, side: &Side, progress: bool) -> Option<String> {
    let line = match event {
        PlaybackEvent::SideLoaded {
            track_count,
            total_duration,
            ..
        } => format!(
            "loaded \"{}\" ({track_count} tracks, {})",
            side.title,
            format_time(*total_duration)
        ),
        PlaybackEvent::TimelineChanged {
            track_count,
            total_duration,
        } => format!(
            "track list changed ({track_count} tracks, {})",
            format_time(*total_duration)
        ),
        PlaybackEvent::StateChanged { is_playing: true } => "playing".to_owned(),
        PlaybackEvent::StateChanged { is_playing: false } => "paused".to_owned(),
        PlaybackEvent::TrackChanged { index, .. } => {
            let title = side.tracks.get(*index).map_or("?", |t| t.title.as_str());
            format!("track {}: {title}", index + 1)
        }
        PlaybackEvent::ProgressChanged {
            progress: position,
            total_duration,
        } => {
            if !progress {
                return None;
            }
            format!("{} / {}", format_time(*position), format_time(*total_duration))
        }
        PlaybackEvent::SeekApplied { index, offset } => {
            format!("seeked to {} into track {}", format_time(*offset), index + 1)
        }
        PlaybackEvent::SideFinished => "side finished".to_owned(),
        PlaybackEvent::SessionStarted { side_id } => format!("session started for {side_id}"),
        PlaybackEvent::SourceUnavailable { index, reason, .. } => {
            format!("track {} unavailable: {reason}", index + 1)
        }
        PlaybackEvent::SequencerChanged { state } => match state {
            SequencerState::Idle => return None,
            SequencerState::AwaitingStartSound => "start button pressed".to_owned(),
            SequencerState::AwaitingNeedleDrop => "needle dropping".to_owned(),
        },
        PlaybackEvent::Error { message } => format!("error: {message}"),
    };

    Some(line)
}
