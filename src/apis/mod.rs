//! Source adapters, one per outage source.
//!
//! Each adapter owns its fetch path and a pure `parse_*` function over the
//! fetched payload, so parsing can be exercised against fixed samples.

pub mod dtek;
pub mod factory;
pub mod regional;
pub mod ukrenergo;
pub mod yasno;

use crate::app::ports::{HttpClientPort, HttpResponse};
use crate::error::AdapterError;
use crate::types::AdapterResult;
use chrono::{DateTime, Utc};
use scraper::Selector;
use serde_json::Value;

pub use dtek::DtekAdapter;
pub use factory::build_adapters;
pub use regional::RegionalFeedAdapter;
pub use ukrenergo::UkrenergoAdapter;
pub use yasno::YasnoAdapter;

/// GET that fails on transport errors and non-2xx statuses
pub(crate) async fn get_ok(
    http: &dyn HttpClientPort,
    source_id: &str,
    url: &str,
    accept: Option<&str>,
) -> AdapterResult<HttpResponse> {
    let resp = http
        .get(url, accept)
        .await
        .map_err(|e| AdapterError::fetch(source_id, e))?;
    ensure_success(source_id, url, resp)
}

pub(crate) fn ensure_success(source_id: &str, url: &str, resp: HttpResponse) -> AdapterResult<HttpResponse> {
    if !resp.is_success() {
        return Err(AdapterError::fetch(
            source_id,
            format!("{} returned HTTP {}", url, resp.status),
        ));
    }
    Ok(resp)
}

/// HEAD reachability check: reachable means a 2xx answer
pub(crate) async fn probe_url(http: &dyn HttpClientPort, source_id: &str, url: &str) -> AdapterResult<bool> {
    let status = http
        .head(url)
        .await
        .map_err(|e| AdapterError::fetch(source_id, e))?;
    Ok((200..300).contains(&status))
}

pub(crate) fn selector(source_id: &str, css: &str) -> AdapterResult<Selector> {
    Selector::parse(css).map_err(|e| AdapterError::parse(source_id, format!("bad selector {css}: {e}")))
}

/// Source timestamp if it parses as RFC 3339, else the fetch time
pub(crate) fn parse_timestamp(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fallback)
}

/// Comma-separated list of places, trimmed, blanks dropped
pub(crate) fn split_areas(text: &str) -> Vec<String> {
    text.split(',')
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| a.to_string())
        .collect()
}

/// Outage flag as text for the boolean rule table. Booleans and numbers go by
/// truthiness, strings pass through, anything else is empty.
pub(crate) fn flag_text(value: &Value) -> String {
    match value {
        Value::Bool(flag) => flag.to_string(),
        Value::Number(n) => (n.as_f64().unwrap_or(0.0) != 0.0).to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => String::new(),
    }
}

pub(crate) fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
