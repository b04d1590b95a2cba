use crate::app::ports::{HttpClientPort, HttpResponse};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    /// `request_timeout` is a transport-level ceiling; adapters apply their own,
    /// usually shorter, timeouts on top of it.
    pub fn new(user_agent: &str, request_timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn into_response(resp: reqwest::Response) -> Result<HttpResponse, String> {
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|e| e.to_string())?.to_vec();
        tracing::debug!("HTTP response: status={}, size={} bytes", status, bytes.len());
        Ok(HttpResponse { status, bytes })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse, String> {
        tracing::debug!("HTTP GET request to: {}", url);
        let mut req = self.client.get(url);
        if let Some(accept) = accept {
            req = req.header(ACCEPT, accept);
        }
        let resp = req.send().await.map_err(|e| e.to_string())?;
        Self::into_response(resp).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, String> {
        tracing::debug!("HTTP POST request to: {}", url);
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::into_response(resp).await
    }

    async fn head(&self, url: &str) -> Result<u16, String> {
        let resp = self.client.head(url).send().await.map_err(|e| e.to_string())?;
        Ok(resp.status().as_u16())
    }
}
