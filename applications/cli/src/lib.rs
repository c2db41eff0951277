//! Platter command-line host
//!
//! Runs a side through a playback session backed by a simulated engine, so
//! the timeline, seek and start-sequence behavior can be exercised without
//! audio hardware.

pub mod config;
pub mod error;
pub mod render;
pub mod sim;

pub use config::PlatterConfig;
pub use error::{CliError, Result};
