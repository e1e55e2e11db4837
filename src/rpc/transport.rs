//! HTTP transport for JSON-RPC calls
//!
//! One POST per call: no retries, no pooling across runs, no reconnection.
//! Timeouts live here and surface as transport errors.

use super::envelope::RpcResponse;
use crate::config::RpcConfig;
use crate::error::{RelayerError, RelayerResult};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Exchanges one serialized request body for one response body
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, body: String) -> RelayerResult<String>;
}

pub struct HttpTransport {
    client: Client,
    url: String,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    pub fn new(config: &RpcConfig) -> RelayerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayerError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let credentials = match (&config.user, &config.password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user.clone(), password.clone()))
            }
            _ => None,
        };

        Ok(Self {
            client,
            url: config.url.clone(),
            credentials,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: String) -> RelayerResult<String> {
        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Nodes may attach an error envelope to a non-2xx status; anything else
        // (proxy error pages, empty bodies) is a failed exchange.
        if !status.is_success() && RpcResponse::from_body(&text).is_err() {
            return Err(RelayerError::Transport(format!("HTTP error: {}", status)));
        }

        debug!("RPC response from {}: HTTP {} ({} bytes)", self.url, status, text.len());
        Ok(text)
    }
}
