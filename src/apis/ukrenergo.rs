use super::{get_ok, non_empty, probe_url, selector, split_areas};
use crate::app::ports::HttpClientPort;
use crate::constants::{UKRENERGO_NAME, UKRENERGO_SOURCE};
use crate::error::AdapterError;
use crate::types::{AdapterResult, RawObservation, SourceAdapter, StatusVocabulary};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{info, instrument};

/// National grid operator's dispatch page (HTML)
pub struct UkrenergoAdapter {
    http: Arc<dyn HttpClientPort>,
    url: String,
    health_url: String,
}

impl UkrenergoAdapter {
    pub fn new(http: Arc<dyn HttpClientPort>, url: String, health_url: String) -> Self {
        Self { http, url, health_url }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for UkrenergoAdapter {
    fn source_id(&self) -> &str {
        UKRENERGO_SOURCE
    }

    fn display_name(&self) -> &str {
        UKRENERGO_NAME
    }

    #[instrument(skip(self), fields(source = UKRENERGO_SOURCE))]
    async fn fetch(&self) -> AdapterResult<Vec<RawObservation>> {
        let resp = get_ok(self.http.as_ref(), UKRENERGO_SOURCE, &self.url, None).await?;
        let observations = parse_dispatch_page(&resp.text(), Utc::now())?;
        info!("Parsed {} regions from Ukrenergo", observations.len());
        Ok(observations)
    }

    async fn probe(&self) -> AdapterResult<bool> {
        probe_url(self.http.as_ref(), UKRENERGO_SOURCE, &self.health_url).await
    }
}

fn child_text(node: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    node.select(sel)
        .next()
        .and_then(|el| non_empty(el.text().collect::<String>()))
}

/// Region blocks are `.region-outage` or `.outage-item` nodes holding
/// `.region-name`, `.status`, `.schedule` and a comma-separated
/// `.affected-areas`. Blocks without a region name are skipped.
pub fn parse_dispatch_page(html: &str, observed_at: DateTime<Utc>) -> AdapterResult<Vec<RawObservation>> {
    let document = Html::parse_document(html);
    let block_sel = selector(UKRENERGO_SOURCE, ".region-outage, .outage-item")?;
    let name_sel = selector(UKRENERGO_SOURCE, ".region-name")?;
    let status_sel = selector(UKRENERGO_SOURCE, ".status")?;
    let schedule_sel = selector(UKRENERGO_SOURCE, ".schedule")?;
    let areas_sel = selector(UKRENERGO_SOURCE, ".affected-areas")?;

    let mut observations = Vec::new();
    for block in document.select(&block_sel) {
        let Some(region) = child_text(&block, &name_sel) else {
            continue;
        };
        let status = child_text(&block, &status_sel).unwrap_or_default();
        let areas = child_text(&block, &areas_sel)
            .map(|text| split_areas(&text))
            .unwrap_or_default();

        observations.push(
            RawObservation::new(UKRENERGO_SOURCE, region, status, StatusVocabulary::FreeText, observed_at)
                .with_schedule(child_text(&block, &schedule_sel))
                .with_areas(areas),
        );
    }

    if observations.is_empty() {
        return Err(AdapterError::parse(UKRENERGO_SOURCE, "no region entries found on dispatch page"));
    }
    Ok(observations)
}
