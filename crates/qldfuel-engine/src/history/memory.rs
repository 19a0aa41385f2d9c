use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use super::{HistoryError, HistorySample, HistoryStore, LONG_WINDOW_DAYS};

/// In-process history, used when no database is configured and in tests.
///
/// Like a state recorder it stores changes only: observing the same state
/// twice in a row records one sample. Samples older than the long window
/// are pruned on write.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    samples: RwLock<HashMap<String, Vec<HistorySample>>>,
}

impl MemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample unconditionally, keeping each entity's samples in
    /// time order.
    pub fn insert(&self, entity_id: &str, state: Option<&str>, changed_at: DateTime<Utc>) {
        let mut all = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        let entity = all.entry(entity_id.to_string()).or_default();
        let at = entity.partition_point(|s| s.changed_at <= changed_at);
        entity.insert(
            at,
            HistorySample {
                state: state.map(str::to_string),
                changed_at,
            },
        );
    }

    #[must_use]
    pub fn sample_count(&self, entity_id: &str) -> usize {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn samples(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistorySample>, HistoryError> {
        let all = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        Ok(all
            .get(entity_id)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.changed_at >= start && s.changed_at <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn observe(&self, entity_id: &str, state: Option<String>, at: DateTime<Utc>) {
        let mut all = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        let entity = all.entry(entity_id.to_string()).or_default();

        let horizon = at - TimeDelta::days(LONG_WINDOW_DAYS);
        entity.retain(|s| s.changed_at >= horizon);

        if entity.last().is_some_and(|last| last.state == state) {
            return;
        }
        entity.push(HistorySample {
            state,
            changed_at: at,
        });
    }
}
