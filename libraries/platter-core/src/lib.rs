//! Platter Core
//!
//! Domain types, collaborator traits, and error handling shared by the
//! playback library and its hosts.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Side`, `Track` and their identifiers
//! - **Collaborator Traits**: `SourceResolver` (locator → playable URL) and
//!   `PlayedSink` (the one-shot "mark as played" notification)
//! - **Adapters**: a filesystem resolver and a logging sink
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use platter_core::types::{Side, Track};
//!
//! let side = Side::new("Kind of Blue", "Miles Davis")
//!     .with_track(Track::new("So What", 562.0, "/music/kob/01.flac"))
//!     .with_track(Track::new("Freddie Freeloader", 589.0, "/music/kob/02.flac"));
//!
//! assert_eq!(side.tracks.len(), 2);
//! assert_eq!(side.tracks[1].position, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod resolver;
pub mod sink;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use resolver::FileSourceResolver;
pub use sink::LoggingPlayedSink;
pub use traits::{PlayedSink, SourceResolver};
pub use types::{Side, SideId, Track, TrackId};
