use crate::cache::{AggregationCache, CacheState};
use crate::constants::{DEFAULT_ADAPTER_TIMEOUT_SECS, DEFAULT_PROBE_TIMEOUT_SECS};
use crate::error::{AdapterError, AggregatorError, Result};
use crate::observability::metrics;
use crate::pipeline::{ObservationNormalizer, Reconciler};
use crate::types::{
    AggregationSnapshot, OutageStatus, RawObservation, RegionKey, RegionState, SourceAdapter, SourceHealth,
};
use chrono::{DateTime, Local, Utc};
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Comment carried by the built-in snapshot
pub const FALLBACK_COMMENT: &str = "Дані тимчасово недоступні";
pub const FALLBACK_SCHEDULE: &str = "Немає відключень";

/// Built-in snapshot served when no source answered and nothing is cached.
/// Never persisted.
pub fn fallback_snapshot(now: DateTime<Utc>) -> AggregationSnapshot {
    let kyiv = RegionState {
        region_key: RegionKey::new("kyiv"),
        display_name: "Київ та область".to_string(),
        status: OutageStatus::HasPower,
        sources: BTreeSet::new(),
        schedules: vec![FALLBACK_SCHEDULE.to_string()],
        cities: vec!["Київ".to_string(), "Бровари".to_string(), "Ірпінь".to_string()],
        comments: vec![
            FALLBACK_COMMENT.to_string(),
            format!("Останнє оновлення: {}", now.with_timezone(&Local).format("%H:%M:%S")),
        ],
        last_update: now,
    };
    let mut regions = BTreeMap::new();
    regions.insert(kyiv.region_key.clone(), kyiv);
    AggregationSnapshot {
        regions,
        generated_at: now,
        fallback: true,
    }
}

/// Runs aggregation cycles over a fixed set of adapters.
///
/// Cycles are single-flight: concurrent `refresh` calls queue on one lock, and
/// a caller that waited finds the snapshot the previous cycle just cached.
pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cache: AggregationCache,
    normalizer: ObservationNormalizer,
    reconciler: Reconciler,
    adapter_timeout: Duration,
    probe_timeout: Duration,
    refresh_lock: Mutex<()>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, cache: AggregationCache) -> Self {
        Self {
            adapters,
            cache,
            normalizer: ObservationNormalizer::new(),
            reconciler: Reconciler::new(),
            adapter_timeout: Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Default bound for adapters without their own timeout
    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.source_id()).collect()
    }

    pub fn cache(&self) -> &AggregationCache {
        &self.cache
    }

    /// Last cached snapshot without touching the network
    pub async fn get_cached(&self) -> Option<AggregationSnapshot> {
        self.cache.get().await
    }

    /// Fresh snapshot, cached snapshot or built-in fallback. Never fails.
    pub async fn refresh(&self, force: bool) -> AggregationSnapshot {
        match self.try_refresh(force).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("{}; serving built-in fallback snapshot", e);
                metrics::aggregation::fallback_served();
                fallback_snapshot(Utc::now())
            }
        }
    }

    /// Like `refresh`, but reports `NoSourcesAvailable` instead of
    /// substituting the fallback snapshot.
    pub async fn try_refresh(&self, force: bool) -> Result<AggregationSnapshot> {
        let _guard = self.refresh_lock.lock().await;

        if !force && self.cache.state().await == CacheState::Fresh {
            if let Some(cached) = self.cache.get().await {
                debug!("Cache is fresh, skipping refresh");
                metrics::aggregation::cache_hit();
                return Ok(cached);
            }
        }

        let cycle_id = Uuid::new_v4();
        let span = info_span!("refresh_cycle", cycle_id = %cycle_id, force);
        self.run_cycle().instrument(span).await
    }

    async fn run_cycle(&self) -> Result<AggregationSnapshot> {
        metrics::aggregation::refresh_cycle();
        let started = Instant::now();

        let results = join_all(self.adapters.iter().map(|adapter| self.fetch_one(adapter.as_ref()))).await;
        let succeeded = results.iter().filter(|r| r.is_some()).count();
        let raw: Vec<RawObservation> = results.into_iter().flatten().flatten().collect();

        let normalized = self.normalizer.normalize_batch(&raw);
        let regions = self.reconciler.merge(&normalized);

        if succeeded == 0 || regions.is_empty() {
            warn!(
                "No usable source data ({} of {} adapters succeeded)",
                succeeded,
                self.adapters.len()
            );
            return match self.cache.get().await {
                Some(cached) => {
                    info!("Serving last cached snapshot from {}", cached.generated_at);
                    Ok(cached)
                }
                None => Err(AggregatorError::NoSourcesAvailable),
            };
        }

        let snapshot = AggregationSnapshot::new(regions, Utc::now());
        metrics::aggregation::snapshot_regions(snapshot.regions.len());

        if let Err(e) = self.cache.put(&snapshot).await {
            error!("Failed to cache snapshot: {}", e);
            metrics::cache::write_error();
        }

        info!(
            "Refresh finished: {} regions from {}/{} sources in {:?}",
            snapshot.regions.len(),
            succeeded,
            self.adapters.len(),
            started.elapsed()
        );
        Ok(snapshot)
    }

    /// One adapter's observations, or `None` when it failed or timed out
    async fn fetch_one(&self, adapter: &dyn SourceAdapter) -> Option<Vec<RawObservation>> {
        let source_id = adapter.source_id();
        let timeout = adapter.timeout().unwrap_or(self.adapter_timeout);
        let started = Instant::now();

        let result = match tokio::time::timeout(timeout, adapter.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout {
                source_id: source_id.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        };
        metrics::sources::fetch_duration(source_id, started.elapsed().as_secs_f64());

        match result {
            Ok(observations) => {
                debug!("{} returned {} observations", source_id, observations.len());
                metrics::sources::fetch_success(source_id, observations.len());
                Some(observations)
            }
            Err(e) => {
                warn!("Source {} failed: {}", source_id, e);
                metrics::sources::fetch_error(source_id, e.kind());
                None
            }
        }
    }

    /// Probe every adapter concurrently; a probe that errors or exceeds the
    /// probe timeout counts as unreachable.
    pub async fn check_health(&self) -> Vec<SourceHealth> {
        let probes = self.adapters.iter().map(|adapter| async move {
            let reachable = matches!(
                tokio::time::timeout(self.probe_timeout, adapter.probe()).await,
                Ok(Ok(true))
            );
            if !reachable {
                debug!("Source {} unreachable", adapter.source_id());
                metrics::health::probe_unreachable(adapter.source_id());
            }
            SourceHealth {
                source_id: adapter.source_id().to_string(),
                reachable,
            }
        });
        join_all(probes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::storage::InMemoryStore;
    use crate::types::{AdapterResult, StatusVocabulary};

    struct StaticAdapter {
        id: &'static str,
        region: &'static str,
        status: &'static str,
    }

    #[async_trait::async_trait]
    impl SourceAdapter for StaticAdapter {
        fn source_id(&self) -> &str {
            self.id
        }

        fn display_name(&self) -> &str {
            self.id
        }

        async fn fetch(&self) -> AdapterResult<Vec<RawObservation>> {
            if self.region.is_empty() {
                return Err(AdapterError::fetch(self.id, "connection refused"));
            }
            Ok(vec![RawObservation::new(
                self.id,
                self.region,
                self.status,
                StatusVocabulary::Canonical,
                Utc::now(),
            )])
        }

        async fn probe(&self) -> AdapterResult<bool> {
            Ok(!self.region.is_empty())
        }
    }

    fn aggregator(adapters: Vec<Arc<dyn SourceAdapter>>) -> Aggregator {
        let cache = AggregationCache::new(Arc::new(InMemoryStore::new()), Duration::from_secs(120));
        Aggregator::new(adapters, cache)
    }

    #[test]
    fn test_fallback_snapshot_shape() {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 18, 5, 9).unwrap().with_timezone(&Utc);
        let snapshot = fallback_snapshot(now);
        assert!(snapshot.fallback);
        assert_eq!(snapshot.generated_at, now);
        let kyiv = snapshot.region("kyiv").unwrap();
        assert_eq!(kyiv.display_name, "Київ та область");
        assert_eq!(kyiv.status, OutageStatus::HasPower);
        assert_eq!(kyiv.cities, vec!["Київ", "Бровари", "Ірпінь"]);
        assert_eq!(kyiv.schedule_summary(), "Немає відключень");
        assert_eq!(
            kyiv.comment_summary(),
            "Дані тимчасово недоступні. Останнє оновлення: 18:05:09"
        );
    }

    #[tokio::test]
    async fn test_refresh_merges_and_caches() {
        let agg = aggregator(vec![
            Arc::new(StaticAdapter { id: "a", region: "Kyiv", status: "no_power" }),
            Arc::new(StaticAdapter { id: "b", region: "Київ", status: "has_power" }),
        ]);
        let snapshot = agg.refresh(false).await;
        assert!(!snapshot.fallback);
        let kyiv = snapshot.region("kyiv").unwrap();
        assert_eq!(kyiv.status, OutageStatus::NoPower);
        assert_eq!(kyiv.sources.iter().map(String::as_str).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(agg.get_cached().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_try_refresh_reports_no_sources() {
        let agg = aggregator(vec![Arc::new(StaticAdapter { id: "a", region: "", status: "" })]);
        let err = agg.try_refresh(false).await.unwrap_err();
        assert!(matches!(err, AggregatorError::NoSourcesAvailable));
        assert!(agg.refresh(false).await.fallback);
        assert_eq!(agg.get_cached().await, None);
    }

    #[tokio::test]
    async fn test_check_health_lists_every_adapter() {
        let agg = aggregator(vec![
            Arc::new(StaticAdapter { id: "up", region: "Lviv", status: "has_power" }),
            Arc::new(StaticAdapter { id: "down", region: "", status: "" }),
        ]);
        let health = agg.check_health().await;
        assert_eq!(
            health,
            vec![
                SourceHealth { source_id: "up".into(), reachable: true },
                SourceHealth { source_id: "down".into(), reachable: false },
            ]
        );
    }
}
