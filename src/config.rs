use crate::constants::*;
use crate::error::{AggregatorError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable pointing at an alternate config file
pub const CONFIG_PATH_ENV: &str = "OUTAGES_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    /// SQLite file holding the persisted snapshot; `None` keeps it in memory
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub adapter_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub refresh_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

/// One configured source. Unset urls fall back to the built-in endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub url: Option<String>,
    pub fallback_url: Option<String>,
    pub health_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn enabled(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            enabled: true,
            url: None,
            fallback_url: None,
            health_url: None,
            timeout_seconds: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECS,
            db_path: Some(PathBuf::from("data/outages_cache.db")),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_seconds: DEFAULT_ADAPTER_TIMEOUT_SECS,
            probe_timeout_seconds: DEFAULT_PROBE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            refresh_interval_seconds: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            sources: get_supported_sources()
                .into_iter()
                .map(SourceConfig::enabled)
                .collect(),
        }
    }
}

impl Config {
    /// Load from `$OUTAGES_CONFIG`, else `config.toml`; built-in defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let path = Path::new(&path);
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AggregatorError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cache.ttl_seconds == 0 {
            return Err(AggregatorError::Config("cache.ttl_seconds must be > 0".into()));
        }
        if self.fetch.adapter_timeout_seconds == 0 || self.fetch.probe_timeout_seconds == 0 {
            return Err(AggregatorError::Config("fetch timeouts must be > 0".into()));
        }
        let supported = get_supported_sources();
        if let Some(unknown) = self
            .sources
            .iter()
            .find(|s| !supported.contains(&s.source_id.as_str()))
        {
            return Err(AggregatorError::Config(format!(
                "unknown source_id '{}'",
                unknown.source_id
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.adapter_timeout_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.probe_timeout_seconds)
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_every_source() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_seconds, 120);
        assert_eq!(config.enabled_sources().count(), get_supported_sources().len());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [cache]
            ttl_seconds = 300

            [[sources]]
            source_id = "dtek"
            url = "http://localhost:9000/outages"

            [[sources]]
            source_id = "yasno"
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.fetch.adapter_timeout_seconds, DEFAULT_ADAPTER_TIMEOUT_SECS);
        assert_eq!(config.server.port, 8080);
        let enabled: Vec<&str> = config.enabled_sources().map(|s| s.source_id.as_str()).collect();
        assert_eq!(enabled, vec!["dtek"]);
        assert_eq!(
            config.sources[0].url.as_deref(),
            Some("http://localhost:9000/outages")
        );
    }

    #[test]
    fn test_rejects_unknown_source() {
        let err = Config::from_toml(
            r#"
            [[sources]]
            source_id = "nonexistent"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AggregatorError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let err = Config::from_toml("[cache]\nttl_seconds = 0\n").unwrap_err();
        assert!(matches!(err, AggregatorError::Config(_)));
    }
}
