use super::{ensure_success, flag_text, get_ok, parse_timestamp, probe_url};
use crate::app::ports::HttpClientPort;
use crate::constants::{DTEK_NAME, DTEK_SOURCE};
use crate::error::AdapterError;
use crate::types::{AdapterResult, RawObservation, SourceAdapter, StatusVocabulary};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

static EMBEDDED_DATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)var\s+outageData\s*=\s*(\{.*?\});").expect("outageData pattern is valid")
});

#[derive(Debug, Deserialize)]
struct DtekPayload {
    #[serde(default)]
    regions: BTreeMap<String, Value>,
}

/// Regions are decoded one at a time so a single odd entry costs only itself
#[derive(Debug, Deserialize)]
struct DtekRegion {
    name: Option<String>,
    #[serde(default)]
    has_outage: Value,
    schedule: Option<String>,
    cities: Option<Vec<String>>,
    restoration_time: Option<String>,
    last_updated: Option<String>,
}

/// DTEK outage API, with the interactive map page as a second path
pub struct DtekAdapter {
    http: Arc<dyn HttpClientPort>,
    url: String,
    fallback_url: String,
    health_url: String,
}

impl DtekAdapter {
    pub fn new(http: Arc<dyn HttpClientPort>, url: String, fallback_url: String, health_url: String) -> Self {
        Self {
            http,
            url,
            fallback_url,
            health_url,
        }
    }

    async fn fetch_api(&self) -> AdapterResult<Vec<RawObservation>> {
        let resp = self
            .http
            .get(&self.url, Some("application/json"))
            .await
            .map_err(|e| AdapterError::fetch(DTEK_SOURCE, e))?;
        let resp = ensure_success(DTEK_SOURCE, &self.url, resp)?;
        parse_api_payload(&resp.bytes, Utc::now())
    }

    async fn fetch_map_page(&self) -> AdapterResult<Vec<RawObservation>> {
        let resp = get_ok(self.http.as_ref(), DTEK_SOURCE, &self.fallback_url, None).await?;
        let json = extract_embedded_data(&resp.text())?;
        parse_api_payload(json.as_bytes(), Utc::now())
    }
}

#[async_trait::async_trait]
impl SourceAdapter for DtekAdapter {
    fn source_id(&self) -> &str {
        DTEK_SOURCE
    }

    fn display_name(&self) -> &str {
        DTEK_NAME
    }

    #[instrument(skip(self), fields(source = DTEK_SOURCE))]
    async fn fetch(&self) -> AdapterResult<Vec<RawObservation>> {
        let observations = match self.fetch_api().await {
            Ok(observations) => observations,
            Err(e) => {
                warn!("DTEK API unavailable ({}), trying interactive map page", e);
                self.fetch_map_page().await?
            }
        };
        info!("Parsed {} regions from DTEK", observations.len());
        Ok(observations)
    }

    async fn probe(&self) -> AdapterResult<bool> {
        probe_url(self.http.as_ref(), DTEK_SOURCE, &self.health_url).await
    }
}

/// Pull the `var outageData = {...};` object out of the map page scripts
pub fn extract_embedded_data(html: &str) -> AdapterResult<String> {
    EMBEDDED_DATA_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AdapterError::parse(DTEK_SOURCE, "outageData not found in map page"))
}

/// `{"regions": {"<id>": {"name", "has_outage", "schedule", "cities",
/// "restoration_time", "last_updated"}}}`. The region id stands in for a
/// missing name.
pub fn parse_api_payload(bytes: &[u8], fetched_at: DateTime<Utc>) -> AdapterResult<Vec<RawObservation>> {
    let payload: DtekPayload =
        serde_json::from_slice(bytes).map_err(|e| AdapterError::parse(DTEK_SOURCE, e.to_string()))?;

    let observations: Vec<RawObservation> = payload
        .regions
        .into_iter()
        .filter_map(|(region_id, value)| match serde_json::from_value::<DtekRegion>(value) {
            Ok(region) => Some((region_id, region)),
            Err(e) => {
                debug!("Skipping DTEK region {}: {}", region_id, e);
                None
            }
        })
        .map(|(region_id, region)| {
            let name = region
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(region_id);
            let flag = flag_text(&region.has_outage);
            let observed_at = parse_timestamp(region.last_updated.as_deref(), fetched_at);
            RawObservation::new(DTEK_SOURCE, name, flag, StatusVocabulary::BooleanFlag, observed_at)
                .with_schedule(region.schedule)
                .with_areas(region.cities.unwrap_or_default())
                .with_restoration(region.restoration_time)
        })
        .collect();

    if observations.is_empty() {
        return Err(AdapterError::parse(DTEK_SOURCE, "payload has no regions"));
    }
    Ok(observations)
}
