/// Source ids used in configuration, logs, metrics and `RegionState::sources`
pub const UKRENERGO_SOURCE: &str = "ukrenergo";
pub const DTEK_SOURCE: &str = "dtek";
pub const YASNO_SOURCE: &str = "yasno";
pub const KYIVOBLENERGO_SOURCE: &str = "kyivoblenergo";
pub const KHARKIVOBLENERGO_SOURCE: &str = "kharkivoblenergo";
pub const LVIVOBLENERGO_SOURCE: &str = "lvivoblenergo";

// Source names (consistent across the application)
pub const UKRENERGO_NAME: &str = "Укренерго";
pub const DTEK_NAME: &str = "ДТЕК";
pub const YASNO_NAME: &str = "Yasno";
pub const KYIVOBLENERGO_NAME: &str = "Київобленерго";
pub const KHARKIVOBLENERGO_NAME: &str = "Харківобленерго";
pub const LVIVOBLENERGO_NAME: &str = "Львівобленерго";

// Default endpoints
pub const UKRENERGO_URL: &str = "https://ua.energy/диспетчерська-інформація/";
pub const UKRENERGO_HEALTH_URL: &str = "https://ua.energy/";
pub const DTEK_URL: &str = "https://www.dtek.com.ua/api/outages";
pub const DTEK_FALLBACK_URL: &str = "https://www.dtek.com.ua/ru/interactive_map";
pub const DTEK_HEALTH_URL: &str = "https://www.dtek.com.ua/";
pub const YASNO_URL: &str = "https://yasno.com.ua/api/outage-info";
pub const YASNO_FALLBACK_URL: &str = "https://yasno.com.ua/schedule-outages";
pub const YASNO_HEALTH_URL: &str = "https://yasno.com.ua/";
pub const KYIVOBLENERGO_URL: &str = "https://kyivoblenergo.com.ua/api/v1/outages";
pub const KHARKIVOBLENERGO_URL: &str = "https://www.kharkiv-oblenergo.com.ua/outages.json";
pub const LVIVOBLENERGO_URL: &str = "https://www.leos.com.ua/api/power-status";

/// Persisted cache layout keys
pub const CACHE_KEY: &str = "outages_api_cache";
pub const LAST_UPDATE_KEY: &str = "outages_last_update";

pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;
pub const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
pub const REGIONAL_FEED_TIMEOUT_SECS: u64 = 5;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Get all built-in source ids, in aggregation order
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![
        UKRENERGO_SOURCE,
        DTEK_SOURCE,
        YASNO_SOURCE,
        KYIVOBLENERGO_SOURCE,
        KHARKIVOBLENERGO_SOURCE,
        LVIVOBLENERGO_SOURCE,
    ]
}
