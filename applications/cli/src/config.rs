/// CLI configuration
use crate::error::{CliError, Result};
use platter_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "platter.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlatterConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Directory relative locators are resolved against.
    /// Defaults to the directory holding the side file.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Clock tick of the simulated engine
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Playback speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Reported start-button sound length (seconds); unset uses the fallback
    #[serde(default)]
    pub start_cue_secs: Option<f64>,

    /// Reported needle-drop sound length (seconds); unset uses the fallback
    #[serde(default)]
    pub needle_drop_secs: Option<f64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            speed: default_speed(),
            start_cue_secs: None,
            needle_drop_secs: None,
        }
    }
}

impl PlatterConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `platter.toml` in the working
    /// directory is used when present. `PLATTER_`-prefixed variables override
    /// both, with `__` separating sections
    /// (`PLATTER_SIMULATION__SPEED=4`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with PLATTER_)
        settings = settings.add_source(
            config::Environment::with_prefix("PLATTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.event_capacity == 0 {
            return Err(CliError::config("playback.event_capacity must be at least 1"));
        }

        if self.playback.start_cue_fallback_ms == 0 || self.playback.needle_drop_fallback_ms == 0
        {
            return Err(CliError::config("cue fallbacks must be longer than 0 ms"));
        }

        if self.simulation.tick_ms == 0 {
            return Err(CliError::config("simulation.tick_ms must be at least 1"));
        }

        if !self.simulation.speed.is_finite() || self.simulation.speed <= 0.0 {
            return Err(CliError::config(format!(
                "simulation.speed must be positive, got {}",
                self.simulation.speed
            )));
        }

        if let Some(root) = &self.library.root {
            if !root.is_dir() {
                return Err(CliError::config(format!(
                    "library root is not a directory: {}",
                    root.display()
                )));
            }
        }

        Ok(())
    }
}

// Default values
fn default_tick_ms() -> u64 {
    250
}

fn default_speed() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = PlatterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.tick_ms, 250);
        assert_eq!(config.playback.start_cue_fallback_ms, 250);
    }

    #[test]
    fn loads_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[playback]\nneedle_drop_fallback_ms = 1200\n\n[simulation]\nspeed = 8.0"
        )
        .unwrap();

        let config = PlatterConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.playback.needle_drop_fallback_ms, 1200);
        assert_eq!(config.playback.start_cue_fallback_ms, 250);
        assert_eq!(config.simulation.speed, 8.0);
        assert_eq!(config.simulation.tick_ms, 250);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = PlatterConfig::load(Some(Path::new("/nonexistent/platter.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn rejects_bad_speed() {
        let mut config = PlatterConfig::default();
        config.simulation.speed = 0.0;
        assert!(config.validate().is_err());

        config.simulation.speed = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_missing_root() {
        let mut config = PlatterConfig::default();
        config.library.root = Some(PathBuf::from("/nonexistent/library"));
        assert!(config.validate().is_err());
    }
}
