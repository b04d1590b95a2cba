use crate::error::StoreError;
use async_trait::async_trait;

// Fetch-side port
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse, String>;
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, String>;
    /// Status code of a HEAD request
    async fn head(&self, url: &str) -> Result<u16, String>;
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

// Cache-side port: a durable string key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several keys as one unit. Backends override this when they can
    /// commit atomically; the default writes in order.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }
}
