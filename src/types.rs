use crate::error::AdapterError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Which rule table interprets an observation's raw status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusVocabulary {
    /// Free-text Ukrainian/Russian/English phrases ("немає світла", "за графіком")
    FreeText,
    /// Traffic-light colour names ("червона", "yellow")
    ColorCode,
    /// Boolean outage flag rendered as text ("true"/"false")
    BooleanFlag,
    /// Already speaks our codes ("no_power", "has_power", ...)
    Canonical,
}

/// One claim about one region, exactly as a source reported it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub source_id: String,
    pub region_name_raw: String,
    pub status_raw: String,
    pub vocabulary: StatusVocabulary,
    pub schedule_raw: Option<String>,
    pub affected_areas_raw: Vec<String>,
    pub estimated_restoration: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl RawObservation {
    pub fn new(
        source_id: &str,
        region_name_raw: impl Into<String>,
        status_raw: impl Into<String>,
        vocabulary: StatusVocabulary,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            region_name_raw: region_name_raw.into(),
            status_raw: status_raw.into(),
            vocabulary,
            schedule_raw: None,
            affected_areas_raw: Vec::new(),
            estimated_restoration: None,
            observed_at,
        }
    }

    pub fn with_schedule(mut self, schedule: Option<String>) -> Self {
        self.schedule_raw = schedule;
        self
    }

    pub fn with_areas(mut self, areas: Vec<String>) -> Self {
        self.affected_areas_raw = areas;
        self
    }

    pub fn with_restoration(mut self, restoration: Option<String>) -> Self {
        self.estimated_restoration = restoration;
        self
    }
}

/// Stable canonical identifier of an oblast-level region
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outage status. Variant order is the conflict-resolution priority:
/// `NoPower > Scheduled > Possible > HasPower > Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutageStatus {
    Unknown,
    HasPower,
    Possible,
    Scheduled,
    NoPower,
}

impl OutageStatus {
    pub const ALL: [OutageStatus; 5] = [
        OutageStatus::NoPower,
        OutageStatus::Scheduled,
        OutageStatus::Possible,
        OutageStatus::HasPower,
        OutageStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutageStatus::NoPower => "no_power",
            OutageStatus::Scheduled => "scheduled",
            OutageStatus::Possible => "possible",
            OutageStatus::HasPower => "has_power",
            OutageStatus::Unknown => "unknown",
        }
    }

    /// Label shown by the map front end
    pub fn label(&self) -> &'static str {
        match self {
            OutageStatus::NoPower => "Немає світла",
            OutageStatus::Scheduled => "За графіком",
            OutageStatus::Possible => "Можливі відключення",
            OutageStatus::HasPower => "Є світло",
            OutageStatus::Unknown => "Невідомий статус",
        }
    }

    /// Region fill colour used by the map front end
    pub fn color_hex(&self) -> &'static str {
        match self {
            OutageStatus::NoPower => "#ef4444",
            OutageStatus::Scheduled => "#3b82f6",
            OutageStatus::Possible => "#f59e0b",
            OutageStatus::HasPower => "#10b981",
            OutageStatus::Unknown => "#94a3b8",
        }
    }
}

impl fmt::Display for OutageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An observation after region and status canonicalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedObservation {
    pub source_id: String,
    pub region_key: RegionKey,
    pub display_name: String,
    pub status: OutageStatus,
    pub schedule: Option<String>,
    pub cities: Vec<String>,
    pub estimated_restoration: Option<String>,
    pub observed_at: DateTime<Utc>,
}

pub const NO_SCHEDULE_TEXT: &str = "Немає інформації";
pub const DEFAULT_COMMENT_TEXT: &str = "Дані оновлено";

/// Reconciled view of one region for one aggregation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionState {
    pub region_key: RegionKey,
    pub display_name: String,
    pub status: OutageStatus,
    pub sources: BTreeSet<String>,
    pub schedules: Vec<String>,
    pub cities: Vec<String>,
    pub comments: Vec<String>,
    pub last_update: DateTime<Utc>,
}

impl RegionState {
    pub fn schedule_summary(&self) -> String {
        if self.schedules.is_empty() {
            NO_SCHEDULE_TEXT.to_string()
        } else {
            self.schedules.join("; ")
        }
    }

    pub fn comment_summary(&self) -> String {
        if self.comments.is_empty() {
            DEFAULT_COMMENT_TEXT.to_string()
        } else {
            self.comments.join(". ")
        }
    }
}

/// One complete aggregation result. Superseded by the next cycle, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSnapshot {
    pub regions: BTreeMap<RegionKey, RegionState>,
    pub generated_at: DateTime<Utc>,
    /// Set only on the built-in snapshot served when nothing live or cached exists
    #[serde(default)]
    pub fallback: bool,
}

impl AggregationSnapshot {
    pub fn new(regions: BTreeMap<RegionKey, RegionState>, generated_at: DateTime<Utc>) -> Self {
        Self {
            regions,
            generated_at,
            fallback: false,
        }
    }

    pub fn region(&self, key: &str) -> Option<&RegionState> {
        self.regions.get(&RegionKey::new(key))
    }

    /// Number of regions per status, every status present (zero when unused)
    pub fn status_counts(&self) -> BTreeMap<OutageStatus, usize> {
        let mut counts: BTreeMap<OutageStatus, usize> =
            OutageStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for state in self.regions.values() {
            *counts.entry(state.status).or_insert(0) += 1;
        }
        counts
    }
}

/// Reachability of one source, as reported by `check_health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source_id: String,
    pub reachable: bool,
}

/// Core trait that all outage sources must implement
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique identifier for this source
    fn source_id(&self) -> &str;

    /// Human-readable source name
    fn display_name(&self) -> &str;

    /// Fetch and parse the current outage claims of this source.
    /// Any internal fallback path runs here, before an error is returned.
    async fn fetch(&self) -> AdapterResult<Vec<RawObservation>>;

    /// Per-source timeout override; `None` uses the aggregator default
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Lightweight reachability check
    async fn probe(&self) -> AdapterResult<bool>;
}
