//! Transport seam between the client and the plugin backend

use super::constants::USER_AGENT;
use super::error::RpcError;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Anything that can execute a named backend method.
///
/// The HTTP implementation talks to the plugin's local server; tests plug in
/// a scripted in-memory backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// Backend reached over HTTP: `POST {base_url}/{method}` with a JSON body
pub struct HttpBackend {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let response = self
            .http_client
            .post(self.endpoint(method))
            .json(&params)
            .send()
            .await
            .map_err(|e| RpcError::from_reqwest(&e))?;

        let response = response
            .error_for_status()
            .map_err(|e| RpcError::from_reqwest(&e))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_method() {
        let backend = HttpBackend::new("http://127.0.0.1:9321/", Duration::from_secs(5)).unwrap();

        assert_eq!(backend.base_url(), "http://127.0.0.1:9321");
        assert_eq!(backend.endpoint("GetActiveDownloads"), "http://127.0.0.1:9321/GetActiveDownloads");
    }
}
