/// Side and track domain types
use super::ids::{SideId, TrackId};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One track of a side
///
/// The duration is authoritative: it comes from the library and is never
/// recomputed from the decoded media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    #[serde(default = "TrackId::generate")]
    pub id: TrackId,

    /// Zero-based ordinal position within the side
    #[serde(default)]
    pub position: u32,

    /// Track title
    #[serde(default)]
    pub title: String,

    /// Duration in seconds
    pub duration: f64,

    /// Opaque storage locator, turned into a playable URL by a `SourceResolver`
    pub locator: String,
}

impl Track {
    /// Create a new track with a generated id
    pub fn new(title: impl Into<String>, duration: f64, locator: impl Into<String>) -> Self {
        Self {
            id: TrackId::generate(),
            position: 0,
            title: title.into(),
            duration,
            locator: locator.into(),
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<TrackId>) -> Self {
        self.id = id.into();
        self
    }
}

/// The ordered tracks of one playable unit (an album or disc side)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    /// Unique side identifier
    #[serde(default = "SideId::generate")]
    pub id: SideId,

    /// Album title
    #[serde(default)]
    pub title: String,

    /// Album artist
    #[serde(default)]
    pub artist: String,

    /// Tracks in play order
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Side {
    /// Create an empty side
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: SideId::generate(),
            title: title.into(),
            artist: artist.into(),
            tracks: Vec::new(),
        }
    }

    /// Append a track, assigning the next ordinal position
    pub fn with_track(mut self, mut track: Track) -> Self {
        track.position = self.tracks.len() as u32;
        self.tracks.push(track);
        self
    }

    /// Sum of all track durations in seconds
    pub fn total_duration(&self) -> f64 {
        self.tracks.iter().map(|t| t.duration).sum()
    }

    /// Load a side description from a JSON file
    ///
    /// Tracks are sorted by their `position` field so that files listing
    /// them out of order still play in the intended order.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::not_found("side file", path.display().to_string())
            } else {
                CoreError::Io(e)
            }
        })?;
        let mut side: Side = serde_json::from_str(&raw)?;

        if side.tracks.is_empty() {
            return Err(CoreError::invalid_input(format!(
                "{} has no tracks",
                path.display()
            )));
        }

        side.tracks.sort_by_key(|t| t.position);
        Ok(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn with_track_assigns_positions() {
        let side = Side::new("A", "B")
            .with_track(Track::new("one", 180.0, "/a.mp3"))
            .with_track(Track::new("two", 210.0, "/b.mp3"));

        assert_eq!(side.tracks[0].position, 0);
        assert_eq!(side.tracks[1].position, 1);
        assert_eq!(side.total_duration(), 390.0);
    }

    #[test]
    fn from_json_file_sorts_by_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "id": "side-1",
                "title": "Blue Train",
                "artist": "John Coltrane",
                "tracks": [
                    {{"id": "t2", "position": 1, "duration": 10.0, "locator": "/b.flac"}},
                    {{"id": "t1", "position": 0, "duration": 5.5, "locator": "/a.flac"}}
                ]
            }}"#
        )
        .unwrap();

        let side = Side::from_json_file(file.path()).unwrap();
        assert_eq!(side.id.as_str(), "side-1");
        assert_eq!(side.tracks[0].id.as_str(), "t1");
        assert_eq!(side.tracks[1].id.as_str(), "t2");
    }

    #[test]
    fn from_json_file_rejects_empty_side() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": "Nothing", "tracks": []}}"#).unwrap();

        let err = Side::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn from_json_file_reports_missing_file() {
        let err = Side::from_json_file(Path::new("/nonexistent/side.json")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
