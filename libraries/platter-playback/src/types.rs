//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Start-button sound length used when the cue player cannot report one
    /// (default: 250ms)
    pub start_cue_fallback_ms: u64,

    /// Needle-drop sound length used when the cue player cannot report one
    /// (default: 900ms)
    pub needle_drop_fallback_ms: u64,

    /// Play the start-button click when a stop is requested (default: true)
    pub click_on_stop: bool,

    /// Buffer size of the event broadcast channel (default: 256)
    pub event_capacity: usize,
}

impl PlaybackConfig {
    /// Start-button fallback as a `Duration`
    pub fn start_cue_fallback(&self) -> Duration {
        Duration::from_millis(self.start_cue_fallback_ms)
    }

    /// Needle-drop fallback as a `Duration`
    pub fn needle_drop_fallback(&self) -> Duration {
        Duration::from_millis(self.needle_drop_fallback_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_cue_fallback_ms: 250,
            needle_drop_fallback_ms: 900,
            click_on_stop: true,
            event_capacity: 256,
        }
    }
}

/// Everything the presentation layer needs to render the transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Seconds from the start of the side
    pub progress: f64,

    /// Total side duration in seconds
    pub total_duration: f64,

    /// Zero-based current track index
    pub current_index: usize,

    /// Number of tracks on the side
    pub track_count: usize,

    /// Whether audio is playing
    pub is_playing: bool,

    /// Whether a seek drag is in progress
    pub is_seeking: bool,

    /// Whether the start sequence is running
    pub is_sequencing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.start_cue_fallback(), Duration::from_millis(250));
        assert_eq!(config.needle_drop_fallback(), Duration::from_millis(900));
        assert!(config.click_on_stop);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"needle_drop_fallback_ms": 1200}"#).unwrap();
        assert_eq!(config.needle_drop_fallback_ms, 1200);
        assert_eq!(config.start_cue_fallback_ms, 250);
    }
}
