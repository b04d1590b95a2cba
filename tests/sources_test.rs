use outage_aggregator::aggregator::Aggregator;
use outage_aggregator::apis::build_adapters;
use outage_aggregator::app::ports::{HttpClientPort, HttpResponse};
use outage_aggregator::cache::AggregationCache;
use outage_aggregator::config::Config;
use outage_aggregator::storage::InMemoryStore;
use outage_aggregator::types::OutageStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const UKRENERGO_PAGE: &str = r#"
<html><body>
  <div class="region-outage">
    <span class="region-name">Київська область</span>
    <span class="status">Відключення за графіком</span>
    <span class="schedule">2 черга</span>
    <span class="affected-areas">Бровари, Ірпінь</span>
  </div>
  <div class="region-outage">
    <span class="region-name">Одеська обл.</span>
    <span class="status">Є світло</span>
  </div>
</body></html>
"#;

const DTEK_MAP_PAGE: &str = r#"
<script>
  var outageData = {"regions": {"kyiv": {"name": "Київ", "has_outage": true, "restoration_time": "21:00", "cities": ["Київ"]}}};
</script>
"#;

const YASNO_API: &str = r#"{"outages": [{"region": "Odesa", "status": "yellow", "group": "1.2"}]}"#;

/// Serves canned bodies by URL; anything else is a 503
struct CannedHttp {
    pages: HashMap<&'static str, &'static str>,
}

impl CannedHttp {
    fn response(&self, url: &str) -> HttpResponse {
        match self.pages.get(url) {
            Some(body) => HttpResponse {
                status: 200,
                bytes: body.as_bytes().to_vec(),
            },
            None => HttpResponse {
                status: 503,
                bytes: Vec::new(),
            },
        }
    }
}

#[async_trait::async_trait]
impl HttpClientPort for CannedHttp {
    async fn get(&self, url: &str, _accept: Option<&str>) -> Result<HttpResponse, String> {
        Ok(self.response(url))
    }

    async fn post_json(&self, url: &str, _body: &serde_json::Value) -> Result<HttpResponse, String> {
        Ok(self.response(url))
    }

    async fn head(&self, url: &str) -> Result<u16, String> {
        Ok(self.response(url).status)
    }
}

fn config() -> Config {
    Config::from_toml(
        r#"
        [[sources]]
        source_id = "ukrenergo"
        url = "http://ukrenergo.test/dispatch"
        health_url = "http://ukrenergo.test/dispatch"

        [[sources]]
        source_id = "dtek"
        url = "http://dtek.test/api"
        fallback_url = "http://dtek.test/map"
        health_url = "http://dtek.test/down"

        [[sources]]
        source_id = "yasno"
        url = "http://yasno.test/api"

        [[sources]]
        source_id = "lvivoblenergo"
        url = "http://lviv.test/feed"
        "#,
    )
    .unwrap()
}

fn aggregator() -> Aggregator {
    let http = Arc::new(CannedHttp {
        pages: HashMap::from([
            ("http://ukrenergo.test/dispatch", UKRENERGO_PAGE),
            ("http://dtek.test/map", DTEK_MAP_PAGE),
            ("http://yasno.test/api", YASNO_API),
        ]),
    });
    let adapters = build_adapters(&config(), http);
    let cache = AggregationCache::new(Arc::new(InMemoryStore::new()), Duration::from_secs(120));
    Aggregator::new(adapters, cache).with_probe_timeout(Duration::from_millis(200))
}

#[tokio::test]
async fn test_sources_reconcile_across_vocabularies() {
    let snapshot = aggregator().refresh(true).await;
    assert!(!snapshot.fallback);
    assert_eq!(snapshot.regions.len(), 2);

    // Ukrenergo "за графіком" vs the DTEK map page flag: the outage wins
    let kyiv = snapshot.region("kyiv").unwrap();
    assert_eq!(kyiv.status, OutageStatus::NoPower);
    assert_eq!(
        kyiv.sources.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["dtek", "ukrenergo"]
    );
    assert_eq!(kyiv.schedule_summary(), "2 черга");
    assert_eq!(kyiv.cities, vec!["Бровари", "Ірпінь", "Київ"]);
    assert_eq!(kyiv.comment_summary(), "Відновлення: 21:00");

    // Ukrenergo "є світло" vs Yasno yellow
    let odesa = snapshot.region("odesa").unwrap();
    assert_eq!(odesa.status, OutageStatus::Possible);
    assert_eq!(odesa.schedules, vec!["1.2"]);
}

#[tokio::test]
async fn test_health_reflects_head_status() {
    let health = aggregator().check_health().await;
    let reachable: Vec<(&str, bool)> = health
        .iter()
        .map(|h| (h.source_id.as_str(), h.reachable))
        .collect();
    assert_eq!(
        reachable,
        vec![
            ("ukrenergo", true),
            ("dtek", false),
            ("yasno", false),
            ("lvivoblenergo", false),
        ]
    );
}
