use super::{flag_text, get_ok, parse_timestamp, probe_url};
use crate::app::ports::HttpClientPort;
use crate::error::AdapterError;
use crate::pipeline::normalize::status_rules::is_canonical_code;
use crate::types::{AdapterResult, RawObservation, SourceAdapter, StatusVocabulary};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// A regional oblenergo JSON feed. Feeds disagree on field names, so items are
/// read leniently and the feed's home region fills in a missing region name.
pub struct RegionalFeedAdapter {
    source_id: String,
    name: String,
    home_region: String,
    url: String,
    health_url: String,
    timeout: Duration,
    http: Arc<dyn HttpClientPort>,
}

impl RegionalFeedAdapter {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        source_id: &str,
        name: &str,
        home_region: &str,
        url: String,
        health_url: String,
        timeout: Duration,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            name: name.to_string(),
            home_region: home_region.to_string(),
            url,
            health_url,
            timeout,
            http,
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for RegionalFeedAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> AdapterResult<Vec<RawObservation>> {
        let resp = get_ok(self.http.as_ref(), &self.source_id, &self.url, Some("application/json")).await?;
        let observations = parse_feed(&resp.bytes, &self.source_id, &self.home_region, Utc::now())?;
        info!("Parsed {} entries from {}", observations.len(), self.name);
        Ok(observations)
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn probe(&self) -> AdapterResult<bool> {
        probe_url(self.http.as_ref(), &self.source_id, &self.health_url).await
    }
}

fn first_str(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn string_list(item: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_array))
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn feed_items(payload: Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => ["outages", "data"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }),
        _ => None,
    }
}

/// Status vocabulary is decided per item: our own codes are `Canonical`,
/// other text is `FreeText`, and an item with only `has_outage` is a
/// `BooleanFlag`.
fn item_status(item: &Value) -> (String, StatusVocabulary) {
    if let Some(status) = first_str(item, &["status"]) {
        let vocabulary = if is_canonical_code(&status) {
            StatusVocabulary::Canonical
        } else {
            StatusVocabulary::FreeText
        };
        return (status, vocabulary);
    }
    match item.get("has_outage") {
        Some(flag) if !flag.is_null() => (flag_text(flag), StatusVocabulary::BooleanFlag),
        _ => (String::new(), StatusVocabulary::FreeText),
    }
}

pub fn parse_feed(
    bytes: &[u8],
    source_id: &str,
    home_region: &str,
    fetched_at: DateTime<Utc>,
) -> AdapterResult<Vec<RawObservation>> {
    let payload: Value =
        serde_json::from_slice(bytes).map_err(|e| AdapterError::parse(source_id, e.to_string()))?;
    let items = feed_items(payload)
        .ok_or_else(|| AdapterError::parse(source_id, "expected an array or {outages|data: [...]}"))?;

    let observations: Vec<RawObservation> = items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| {
            let region = first_str(item, &["region", "name", "oblast"])
                .unwrap_or_else(|| home_region.to_string());
            let (status, vocabulary) = item_status(item);
            let observed_at = parse_timestamp(
                first_str(item, &["last_updated", "updated_at"]).as_deref(),
                fetched_at,
            );
            RawObservation::new(source_id, region, status, vocabulary, observed_at)
                .with_schedule(first_str(item, &["queue", "schedule", "group"]))
                .with_areas(string_list(item, &["cities", "settlements"]))
                .with_restoration(first_str(item, &["restoration_time", "restoration"]))
        })
        .collect();

    if observations.is_empty() {
        return Err(AdapterError::parse(source_id, "feed has no entries"));
    }
    Ok(observations)
}
