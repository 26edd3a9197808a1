use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::types::LoadedDatasets;

/// Holds the loaded datasets for a bounded window. Expiry is checked by the
/// caller on every render; nothing here triggers reloads on its own.
pub struct SessionCache {
    ttl: Duration,
    entry: Option<SessionEntry>,
}

struct SessionEntry {
    datasets: Arc<LoadedDatasets>,
    loaded_at: DateTime<Utc>,
    expires_at: Instant,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Returns the datasets if they were stored within the TTL window.
    pub fn fresh(&self) -> Option<Arc<LoadedDatasets>> {
        let entry = self.entry.as_ref()?;
        if Instant::now() < entry.expires_at {
            Some(entry.datasets.clone())
        } else {
            None
        }
    }

    pub fn store(&mut self, datasets: LoadedDatasets) -> Arc<LoadedDatasets> {
        let datasets = Arc::new(datasets);
        self.entry = Some(SessionEntry {
            datasets: datasets.clone(),
            loaded_at: Utc::now(),
            expires_at: Instant::now() + self.ttl,
        });
        datasets
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|entry| entry.loaded_at)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let loaded_at = self.loaded_at()?;
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::zero());
        Some(loaded_at + ttl)
    }

    /// Current datasets regardless of freshness, for read-only surfaces
    /// that must not trigger a reload.
    pub fn current(&self) -> Option<Arc<LoadedDatasets>> {
        self.entry.as_ref().map(|entry| entry.datasets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LoadOrigin, LoadOutcome, RecordSet};

    fn datasets() -> LoadedDatasets {
        let outcome = LoadOutcome {
            records: RecordSet::empty(),
            origin: LoadOrigin::Empty,
            warnings: Vec::new(),
        };
        LoadedDatasets {
            registry: outcome.clone(),
            franchise: outcome.clone(),
            plants: outcome,
        }
    }

    #[test]
    fn empty_cache_is_never_fresh() {
        let cache = SessionCache::new(Duration::from_secs(60));
        assert!(cache.fresh().is_none());
        assert!(cache.current().is_none());
    }

    #[test]
    fn stored_datasets_stay_fresh_within_ttl() {
        let mut cache = SessionCache::new(Duration::from_secs(60));
        cache.store(datasets());
        assert!(cache.fresh().is_some());
        assert!(cache.loaded_at().is_some());
        assert!(cache.expires_at().unwrap() > cache.loaded_at().unwrap());
    }

    #[test]
    fn zero_ttl_expires_immediately_but_current_still_serves() {
        let mut cache = SessionCache::new(Duration::ZERO);
        cache.store(datasets());
        assert!(cache.fresh().is_none());
        assert!(cache.current().is_some());
    }
}
