//! Metrics for the aggregation engine.
//!
//! Records through the `metrics` facade; `init` installs the Prometheus
//! recorder whose handle renders the `/metrics` endpoint. Without a recorder
//! every call is a no-op, which is what tests and the one-shot CLI rely on.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Sources
    SourceFetchSuccess,
    SourceFetchError,
    SourceFetchDuration,
    SourceObservations,

    // Aggregation
    RefreshCycles,
    RefreshCacheHits,
    RefreshFallbackServed,
    SnapshotRegions,

    // Cache
    CacheReadErrors,
    CacheWriteErrors,

    // Health
    HealthProbeUnreachable,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourceFetchSuccess => "outages_source_fetch_success_total",
            MetricName::SourceFetchError => "outages_source_fetch_error_total",
            MetricName::SourceFetchDuration => "outages_source_fetch_duration_seconds",
            MetricName::SourceObservations => "outages_source_observations",
            MetricName::RefreshCycles => "outages_refresh_cycles_total",
            MetricName::RefreshCacheHits => "outages_refresh_cache_hits_total",
            MetricName::RefreshFallbackServed => "outages_refresh_fallback_served_total",
            MetricName::SnapshotRegions => "outages_snapshot_regions",
            MetricName::CacheReadErrors => "outages_cache_read_errors_total",
            MetricName::CacheWriteErrors => "outages_cache_write_errors_total",
            MetricName::HealthProbeUnreachable => "outages_health_probe_unreachable_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the global Prometheus recorder
pub fn init() -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    Ok(handle)
}

pub mod sources {
    use super::MetricName;

    pub fn fetch_success(source_id: &str, observations: usize) {
        ::metrics::counter!(MetricName::SourceFetchSuccess.as_str(), "source" => source_id.to_string())
            .increment(1);
        ::metrics::histogram!(MetricName::SourceObservations.as_str(), "source" => source_id.to_string())
            .record(observations as f64);
    }

    pub fn fetch_error(source_id: &str, kind: &'static str) {
        ::metrics::counter!(
            MetricName::SourceFetchError.as_str(),
            "source" => source_id.to_string(),
            "kind" => kind
        )
        .increment(1);
    }

    pub fn fetch_duration(source_id: &str, secs: f64) {
        ::metrics::histogram!(MetricName::SourceFetchDuration.as_str(), "source" => source_id.to_string())
            .record(secs);
    }
}

pub mod aggregation {
    use super::MetricName;

    pub fn refresh_cycle() {
        ::metrics::counter!(MetricName::RefreshCycles.as_str()).increment(1);
    }

    pub fn cache_hit() {
        ::metrics::counter!(MetricName::RefreshCacheHits.as_str()).increment(1);
    }

    pub fn fallback_served() {
        ::metrics::counter!(MetricName::RefreshFallbackServed.as_str()).increment(1);
    }

    pub fn snapshot_regions(count: usize) {
        ::metrics::gauge!(MetricName::SnapshotRegions.as_str()).set(count as f64);
    }
}

pub mod cache {
    use super::MetricName;

    pub fn read_error() {
        ::metrics::counter!(MetricName::CacheReadErrors.as_str()).increment(1);
    }

    pub fn write_error() {
        ::metrics::counter!(MetricName::CacheWriteErrors.as_str()).increment(1);
    }
}

pub mod health {
    use super::MetricName;

    pub fn probe_unreachable(source_id: &str) {
        ::metrics::counter!(MetricName::HealthProbeUnreachable.as_str(), "source" => source_id.to_string())
            .increment(1);
    }
}
