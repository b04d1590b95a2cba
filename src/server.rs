use crate::aggregator::Aggregator;
use crate::types::{AggregationSnapshot, OutageStatus, RegionState};
use axum::{
    extract::Query,
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use chrono::{DateTime, Utc};
use hyper::Server;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    pub force: bool,
}

/// One region as the map front end draws it
#[derive(Debug, Serialize)]
pub struct RegionView {
    #[serde(flatten)]
    pub state: RegionState,
    pub status_label: &'static str,
    pub status_color: &'static str,
    pub schedule_summary: String,
    pub comment_summary: String,
}

impl From<&RegionState> for RegionView {
    fn from(state: &RegionState) -> Self {
        Self {
            status_label: state.status.label(),
            status_color: state.status.color_hex(),
            schedule_summary: state.schedule_summary(),
            comment_summary: state.comment_summary(),
            state: state.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutagesResponse {
    pub generated_at: DateTime<Utc>,
    pub fallback: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub statistics: BTreeMap<OutageStatus, usize>,
    pub regions: Vec<RegionView>,
}

impl OutagesResponse {
    pub fn new(snapshot: &AggregationSnapshot, last_update: Option<DateTime<Utc>>) -> Self {
        Self {
            generated_at: snapshot.generated_at,
            fallback: snapshot.fallback,
            last_update,
            statistics: snapshot.status_counts(),
            regions: snapshot.regions.values().map(RegionView::from).collect(),
        }
    }
}

async fn health(Extension(aggregator): Extension<Arc<Aggregator>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "outage-aggregator",
        "version": env!("CARGO_PKG_VERSION"),
        "sources": aggregator.source_ids(),
        "last_update": aggregator.cache().last_update().await,
    }))
}

async fn outages(
    Extension(aggregator): Extension<Arc<Aggregator>>,
    Query(params): Query<RefreshParams>,
) -> impl IntoResponse {
    let snapshot = aggregator.refresh(params.force).await;
    let last_update = aggregator.cache().last_update().await;
    Json(OutagesResponse::new(&snapshot, last_update))
}

async fn cached_outages(Extension(aggregator): Extension<Arc<Aggregator>>) -> impl IntoResponse {
    match aggregator.get_cached().await {
        Some(snapshot) => {
            let last_update = aggregator.cache().last_update().await;
            Json(OutagesResponse::new(&snapshot, last_update)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no cached snapshot" })),
        )
            .into_response(),
    }
}

async fn sources_health(Extension(aggregator): Extension<Arc<Aggregator>>) -> impl IntoResponse {
    Json(aggregator.check_health().await)
}

async fn render_metrics(Extension(handle): Extension<Option<PrometheusHandle>>) -> impl IntoResponse {
    match handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed".to_string()),
    }
}

/// Build the router over a shared aggregator
pub fn create_server(aggregator: Arc<Aggregator>, metrics: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/outages", get(outages))
        .route("/api/outages/cached", get(cached_outages))
        .route("/api/sources/health", get(sources_health))
        .route("/metrics", get(render_metrics))
        .layer(Extension(aggregator))
        .layer(Extension(metrics))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Periodically refresh the cache so page loads rarely wait on the sources.
/// The first tick fires immediately.
pub fn spawn_refresh_loop(aggregator: Arc<Aggregator>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let snapshot = aggregator.refresh(false).await;
            debug!(
                "Background refresh holds {} regions (fallback={})",
                snapshot.regions.len(),
                snapshot.fallback
            );
        }
    })
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    aggregator: Arc<Aggregator>,
    metrics: Option<PrometheusHandle>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(aggregator, metrics);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://localhost:{port}");
    info!("Outages: http://localhost:{port}/api/outages");
    info!("Health check: http://localhost:{port}/health");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
