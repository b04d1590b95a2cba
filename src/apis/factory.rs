use super::{DtekAdapter, RegionalFeedAdapter, UkrenergoAdapter, YasnoAdapter};
use crate::app::ports::HttpClientPort;
use crate::config::{Config, SourceConfig};
use crate::constants::*;
use crate::types::{AdapterResult, RawObservation, SourceAdapter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Region reported by a regional feed whose items carry no region name
fn home_region(source_id: &str) -> Option<&'static str> {
    match source_id {
        KYIVOBLENERGO_SOURCE => Some("Київська область"),
        KHARKIVOBLENERGO_SOURCE => Some("Харківська область"),
        LVIVOBLENERGO_SOURCE => Some("Львівська область"),
        _ => None,
    }
}

fn url_or(configured: &Option<String>, default: &str) -> String {
    configured.clone().unwrap_or_else(|| default.to_string())
}

/// Applies a configured per-source timeout to an adapter that has none of its own
struct WithTimeout {
    inner: Arc<dyn SourceAdapter>,
    timeout: Duration,
}

#[async_trait::async_trait]
impl SourceAdapter for WithTimeout {
    fn source_id(&self) -> &str {
        self.inner.source_id()
    }

    fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    async fn fetch(&self) -> AdapterResult<Vec<RawObservation>> {
        self.inner.fetch().await
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn probe(&self) -> AdapterResult<bool> {
        self.inner.probe().await
    }
}

fn create_adapter(source: &SourceConfig, http: Arc<dyn HttpClientPort>) -> Option<Arc<dyn SourceAdapter>> {
    let adapter: Arc<dyn SourceAdapter> = match source.source_id.as_str() {
        UKRENERGO_SOURCE => Arc::new(UkrenergoAdapter::new(
            http,
            url_or(&source.url, UKRENERGO_URL),
            url_or(&source.health_url, UKRENERGO_HEALTH_URL),
        )),
        DTEK_SOURCE => Arc::new(DtekAdapter::new(
            http,
            url_or(&source.url, DTEK_URL),
            url_or(&source.fallback_url, DTEK_FALLBACK_URL),
            url_or(&source.health_url, DTEK_HEALTH_URL),
        )),
        YASNO_SOURCE => Arc::new(YasnoAdapter::new(
            http,
            url_or(&source.url, YASNO_URL),
            url_or(&source.fallback_url, YASNO_FALLBACK_URL),
            url_or(&source.health_url, YASNO_HEALTH_URL),
        )),
        id @ (KYIVOBLENERGO_SOURCE | KHARKIVOBLENERGO_SOURCE | LVIVOBLENERGO_SOURCE) => {
            let (name, default_url) = match id {
                KYIVOBLENERGO_SOURCE => (KYIVOBLENERGO_NAME, KYIVOBLENERGO_URL),
                KHARKIVOBLENERGO_SOURCE => (KHARKIVOBLENERGO_NAME, KHARKIVOBLENERGO_URL),
                _ => (LVIVOBLENERGO_NAME, LVIVOBLENERGO_URL),
            };
            let url = url_or(&source.url, default_url);
            let health_url = source.health_url.clone().unwrap_or_else(|| url.clone());
            let timeout = Duration::from_secs(source.timeout_seconds.unwrap_or(REGIONAL_FEED_TIMEOUT_SECS));
            // The regional adapter already carries its timeout
            return Some(Arc::new(RegionalFeedAdapter::new(
                http,
                id,
                name,
                home_region(id).unwrap_or_default(),
                url,
                health_url,
                timeout,
            )));
        }
        other => {
            warn!("Unknown source '{}' skipped", other);
            return None;
        }
    };

    Some(match source.timeout_seconds {
        Some(secs) => Arc::new(WithTimeout {
            inner: adapter,
            timeout: Duration::from_secs(secs),
        }),
        None => adapter,
    })
}

/// Build the enabled adapters in configuration order
pub fn build_adapters(config: &Config, http: Arc<dyn HttpClientPort>) -> Vec<Arc<dyn SourceAdapter>> {
    let adapters: Vec<Arc<dyn SourceAdapter>> = config
        .enabled_sources()
        .filter_map(|source| create_adapter(source, http.clone()))
        .collect();
    debug!(
        "Built adapters: {:?}",
        adapters.iter().map(|a| a.source_id()).collect::<Vec<_>>()
    );
    adapters
}
