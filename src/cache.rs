use crate::app::ports::KeyValueStore;
use crate::constants::{CACHE_KEY, DEFAULT_CACHE_TTL_SECS, LAST_UPDATE_KEY};
use crate::error::CacheError;
use crate::types::AggregationSnapshot;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Persisted record under `CACHE_KEY`
#[derive(Debug, Serialize, Deserialize)]
struct CachedRecord {
    data: AggregationSnapshot,
    /// Milliseconds since the Unix epoch when the snapshot was stored
    timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Last successful snapshot plus the time it was stored.
///
/// Freshness only decides whether a refresh should run; a stale snapshot is
/// still returned by `get`. Unreadable persisted data counts as a miss.
pub struct AggregationCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl AggregationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: std::time::Duration) -> Self {
        let ttl = Duration::from_std(ttl)
            .unwrap_or_else(|_| Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64));
        Self { store, ttl }
    }

    async fn read_record(&self) -> Result<Option<CachedRecord>, CacheError> {
        let raw = self
            .store
            .get(CACHE_KEY)
            .await
            .map_err(|e| CacheError::Read(e.to_string()))?;
        match raw {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CacheError::Read(format!("corrupt cache record: {e}"))),
        }
    }

    /// Reads the stored record, downgrading read errors to a miss
    async fn load(&self) -> Option<CachedRecord> {
        match self.read_record().await {
            Ok(record) => record,
            Err(e) => {
                warn!("Treating cache as empty: {}", e);
                crate::observability::metrics::cache::read_error();
                None
            }
        }
    }

    /// The last stored snapshot, fresh or not
    pub async fn get(&self) -> Option<AggregationSnapshot> {
        self.load().await.map(|record| record.data)
    }

    pub async fn put(&self, snapshot: &AggregationSnapshot) -> Result<(), CacheError> {
        self.put_at(snapshot, Utc::now()).await
    }

    /// Replace the stored snapshot and its timestamp in one write
    pub async fn put_at(
        &self,
        snapshot: &AggregationSnapshot,
        stored_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let record = CachedRecord {
            data: snapshot.clone(),
            timestamp: stored_at.timestamp_millis(),
        };
        let json = serde_json::to_string(&record).map_err(|e| CacheError::Write(e.to_string()))?;
        self.store
            .set_many(&[(CACHE_KEY, json), (LAST_UPDATE_KEY, stored_at.to_rfc3339())])
            .await
            .map_err(|e| CacheError::Write(e.to_string()))?;
        debug!("Cached snapshot with {} regions", snapshot.regions.len());
        Ok(())
    }

    pub async fn state(&self) -> CacheState {
        self.state_at(Utc::now()).await
    }

    pub async fn state_at(&self, now: DateTime<Utc>) -> CacheState {
        match self.load().await {
            None => CacheState::Empty,
            Some(record) => match Utc.timestamp_millis_opt(record.timestamp).single() {
                Some(stored_at) if now - stored_at <= self.ttl => CacheState::Fresh,
                _ => CacheState::Stale,
            },
        }
    }

    pub async fn should_refresh(&self) -> bool {
        self.should_refresh_at(Utc::now()).await
    }

    pub async fn should_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now).await != CacheState::Fresh
    }

    /// Time of the last successful store, for UI display
    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get(LAST_UPDATE_KEY).await.ok().flatten()?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use std::collections::BTreeMap;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    fn cache_with_store() -> (AggregationCache, InMemoryStore) {
        let store = InMemoryStore::new();
        let cache = AggregationCache::new(
            Arc::new(store.clone()),
            std::time::Duration::from_secs(120),
        );
        (cache, store)
    }

    fn snapshot() -> AggregationSnapshot {
        AggregationSnapshot::new(BTreeMap::new(), t0())
    }

    #[tokio::test]
    async fn test_empty_cache_needs_refresh() {
        let (cache, _) = cache_with_store();
        assert_eq!(cache.get().await, None);
        assert_eq!(cache.state_at(t0()).await, CacheState::Empty);
        assert!(cache.should_refresh_at(t0()).await);
        assert_eq!(cache.last_update().await, None);
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let (cache, _) = cache_with_store();
        cache.put_at(&snapshot(), t0()).await.unwrap();

        assert!(!cache.should_refresh_at(t0() + Duration::seconds(90)).await);
        assert!(!cache.should_refresh_at(t0() + Duration::seconds(120)).await);
        assert!(cache.should_refresh_at(t0() + Duration::seconds(130)).await);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_still_served() {
        let (cache, _) = cache_with_store();
        cache.put_at(&snapshot(), t0()).await.unwrap();

        assert_eq!(cache.state_at(t0() + Duration::hours(5)).await, CacheState::Stale);
        assert_eq!(cache.get().await, Some(snapshot()));
        assert_eq!(cache.last_update().await, Some(t0()));
    }

    #[tokio::test]
    async fn test_corrupt_record_is_a_miss() {
        let (cache, store) = cache_with_store();
        store.set(CACHE_KEY, "{not json").await.unwrap();

        assert_eq!(cache.get().await, None);
        assert!(cache.should_refresh().await);
    }

    #[tokio::test]
    async fn test_persisted_layout() {
        let (cache, store) = cache_with_store();
        cache.put_at(&snapshot(), t0()).await.unwrap();

        let raw = store.get(CACHE_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["timestamp"].as_i64(), Some(t0().timestamp_millis()));
        assert!(value["data"]["regions"].is_object());
        assert!(store.get(LAST_UPDATE_KEY).await.unwrap().is_some());
    }
}
