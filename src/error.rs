use thiserror::Error;

/// Failure of a single source adapter. Never escapes the aggregation cycle:
/// the orchestrator turns it into "zero observations from this source".
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("fetch from {source_id} failed: {message}")]
    Fetch { source_id: String, message: String },

    #[error("fetch from {source_id} timed out after {timeout_ms}ms")]
    Timeout { source_id: String, timeout_ms: u64 },

    #[error("could not parse {source_id} payload: {message}")]
    Parse { source_id: String, message: String },
}

impl AdapterError {
    pub fn fetch(source_id: &str, message: impl Into<String>) -> Self {
        AdapterError::Fetch {
            source_id: source_id.to_string(),
            message: message.into(),
        }
    }

    pub fn parse(source_id: &str, message: impl Into<String>) -> Self {
        AdapterError::Parse {
            source_id: source_id.to_string(),
            message: message.into(),
        }
    }

    /// Short machine-friendly tag, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Fetch { .. } => "fetch",
            AdapterError::Timeout { .. } => "timeout",
            AdapterError::Parse { .. } => "parse",
        }
    }
}

/// Errors raised by a key-value store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache read failed: {0}")]
    Read(String),

    #[error("cache write failed: {0}")]
    Write(String),
}

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("no outage sources available and no cached snapshot")]
    NoSourcesAvailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
