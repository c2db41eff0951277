//! Logging played sink
//!
//! Records every side that started playing and logs it. Hosts without a
//! library database use it directly; tests use `played()` to check that the
//! notification fired exactly once.

use crate::error::{CoreError, Result};
use crate::traits::PlayedSink;
use crate::types::SideId;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// `PlayedSink` that keeps an in-memory record
#[derive(Debug, Default)]
pub struct LoggingPlayedSink {
    played: Mutex<Vec<SideId>>,
}

impl LoggingPlayedSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Sides marked as played, in notification order
    pub fn played(&self) -> Vec<SideId> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PlayedSink for LoggingPlayedSink {
    async fn mark_played(&self, side: &SideId) -> Result<()> {
        self.played
            .lock()
            .map_err(|_| CoreError::Sink("played list poisoned".to_string()))?
            .push(side.clone());
        info!(side = %side, "side marked as played");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sides_in_order() {
        let sink = LoggingPlayedSink::new();
        sink.mark_played(&SideId::new("a")).await.unwrap();
        sink.mark_played(&SideId::new("b")).await.unwrap();

        assert_eq!(sink.played(), vec![SideId::new("a"), SideId::new("b")]);
    }
}
