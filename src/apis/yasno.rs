use super::{ensure_success, get_ok, non_empty, probe_url, selector};
use crate::app::ports::HttpClientPort;
use crate::constants::{YASNO_NAME, YASNO_SOURCE};
use crate::error::AdapterError;
use crate::types::{AdapterResult, RawObservation, SourceAdapter, StatusVocabulary};
use chrono::{DateTime, Utc};
use scraper::Html;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YasnoPayload {
    Wrapped { outages: Vec<Value> },
    Bare(Vec<Value>),
}

/// Items are decoded one at a time; one that does not fit is skipped
#[derive(Debug, Deserialize)]
struct YasnoItem {
    #[serde(default)]
    region: String,
    status: Option<String>,
    #[serde(alias = "group")]
    schedule: Option<String>,
    cities: Option<Vec<String>>,
    #[serde(alias = "restoration_time")]
    restoration: Option<String>,
}

/// Yasno status API (colour-coded), with the schedule table page as a second path
pub struct YasnoAdapter {
    http: Arc<dyn HttpClientPort>,
    url: String,
    fallback_url: String,
    health_url: String,
}

impl YasnoAdapter {
    pub fn new(http: Arc<dyn HttpClientPort>, url: String, fallback_url: String, health_url: String) -> Self {
        Self {
            http,
            url,
            fallback_url,
            health_url,
        }
    }

    async fn fetch_api(&self) -> AdapterResult<Vec<RawObservation>> {
        let body = json!({ "action": "get_outages", "region": "all" });
        let resp = self
            .http
            .post_json(&self.url, &body)
            .await
            .map_err(|e| AdapterError::fetch(YASNO_SOURCE, e))?;
        let resp = ensure_success(YASNO_SOURCE, &self.url, resp)?;
        parse_api_payload(&resp.bytes, Utc::now())
    }

    async fn fetch_schedule_page(&self) -> AdapterResult<Vec<RawObservation>> {
        let resp = get_ok(self.http.as_ref(), YASNO_SOURCE, &self.fallback_url, None).await?;
        parse_schedule_table(&resp.text(), Utc::now())
    }
}

#[async_trait::async_trait]
impl SourceAdapter for YasnoAdapter {
    fn source_id(&self) -> &str {
        YASNO_SOURCE
    }

    fn display_name(&self) -> &str {
        YASNO_NAME
    }

    #[instrument(skip(self), fields(source = YASNO_SOURCE))]
    async fn fetch(&self) -> AdapterResult<Vec<RawObservation>> {
        let observations = match self.fetch_api().await {
            Ok(observations) => observations,
            Err(e) => {
                warn!("Yasno API unavailable ({}), scraping schedule page", e);
                self.fetch_schedule_page().await?
            }
        };
        info!("Parsed {} regions from Yasno", observations.len());
        Ok(observations)
    }

    async fn probe(&self) -> AdapterResult<bool> {
        probe_url(self.http.as_ref(), YASNO_SOURCE, &self.health_url).await
    }
}

/// `{"outages": [...]}` or a bare array of `{region, status, schedule|group,
/// cities, restoration|restoration_time}`
pub fn parse_api_payload(bytes: &[u8], observed_at: DateTime<Utc>) -> AdapterResult<Vec<RawObservation>> {
    let payload: YasnoPayload =
        serde_json::from_slice(bytes).map_err(|e| AdapterError::parse(YASNO_SOURCE, e.to_string()))?;
    let items = match payload {
        YasnoPayload::Wrapped { outages } => outages,
        YasnoPayload::Bare(items) => items,
    };

    let observations: Vec<RawObservation> = items
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<YasnoItem>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Skipping Yasno item: {}", e);
                None
            }
        })
        .filter(|item| !item.region.trim().is_empty())
        .map(|item| {
            RawObservation::new(
                YASNO_SOURCE,
                item.region,
                item.status.unwrap_or_default(),
                StatusVocabulary::ColorCode,
                observed_at,
            )
            .with_schedule(item.schedule)
            .with_areas(item.cities.unwrap_or_default())
            .with_restoration(item.restoration)
        })
        .collect();

    if observations.is_empty() {
        return Err(AdapterError::parse(YASNO_SOURCE, "payload has no outages"));
    }
    Ok(observations)
}

/// Rows of `.outage-table` with at least three cells: region, colour, schedule
pub fn parse_schedule_table(html: &str, observed_at: DateTime<Utc>) -> AdapterResult<Vec<RawObservation>> {
    let document = Html::parse_document(html);
    let row_sel = selector(YASNO_SOURCE, ".outage-table tr")?;
    let cell_sel = selector(YASNO_SOURCE, "td")?;

    let mut observations = Vec::new();
    for row in document.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 3 || cells[0].is_empty() {
            continue;
        }
        observations.push(
            RawObservation::new(
                YASNO_SOURCE,
                cells[0].clone(),
                cells[1].clone(),
                StatusVocabulary::ColorCode,
                observed_at,
            )
            .with_schedule(non_empty(cells[2].clone())),
        );
    }

    if observations.is_empty() {
        return Err(AdapterError::parse(YASNO_SOURCE, "schedule table has no rows"));
    }
    Ok(observations)
}
