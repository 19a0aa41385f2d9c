//! Historical statistics per fuel price sensor.
//!
//! Samples come from an external [`HistoryStore`]. Each sensor owns a
//! [`HistoryTracker`] that is refreshed after every published snapshot,
//! independently of the refresh path and of other sensors.

mod memory;
mod stats;

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

pub use memory::MemoryHistoryStore;
pub use stats::{compute_stats, HistoricalStats, WindowStats, LONG_WINDOW_DAYS, SHORT_WINDOW_DAYS};

use crate::shutdown::ShutdownFlag;

/// States the recorder writes when a sensor has no usable value.
const UNUSABLE_STATES: [&str; 3] = ["", "unknown", "unavailable"];

/// One recorded state change of a sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySample {
    pub state: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl HistorySample {
    /// The numeric value of the state, if it has one.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let state = self.state.as_deref()?.trim();
        if UNUSABLE_STATES.contains(&state) {
            return None;
        }
        state.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Read access to recorded sensor states.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Samples for `entity_id` with `start <= changed_at <= end`, oldest
    /// first. An entity with no history yields `Ok(vec![])`.
    async fn samples(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistorySample>, HistoryError>;

    /// Offers the sensor's current state. Stores that are filled by an
    /// external recorder ignore it.
    fn observe(&self, _entity_id: &str, _state: Option<String>, _at: DateTime<Utc>) {}
}

/// Result of one [`HistoryTracker::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryUpdate {
    Updated,
    /// Shutdown had begun; nothing was queried.
    Aborted,
    /// The store failed; previous statistics were kept.
    Failed,
}

#[derive(Debug)]
pub struct HistoryTracker {
    entity_id: String,
    stats: Mutex<HistoricalStats>,
}

impl HistoryTracker {
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            stats: Mutex::new(HistoricalStats::default()),
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    #[must_use]
    pub fn stats(&self) -> HistoricalStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queries the last 14 days of samples and recomputes the statistics.
    pub async fn update(
        &self,
        store: &dyn HistoryStore,
        now: DateTime<Utc>,
        shutdown: &ShutdownFlag,
    ) -> HistoryUpdate {
        if shutdown.is_raised() {
            tracing::debug!(entity_id = %self.entity_id, "history: shutting down, skipped");
            return HistoryUpdate::Aborted;
        }

        let start = now - TimeDelta::days(LONG_WINDOW_DAYS);
        let samples = match store.samples(&self.entity_id, start, now).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(
                    entity_id = %self.entity_id,
                    error = %e,
                    "history: query failed, keeping previous statistics"
                );
                return HistoryUpdate::Failed;
            }
        };
        if shutdown.is_raised() {
            tracing::debug!(entity_id = %self.entity_id, "history: shutting down, result dropped");
            return HistoryUpdate::Aborted;
        }

        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        *stats = compute_stats(*stats, &samples, now);
        tracing::debug!(
            entity_id = %self.entity_id,
            samples = samples.len(),
            "history: statistics updated"
        );
        HistoryUpdate::Updated
    }
}
