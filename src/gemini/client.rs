use super::types::WireRequest;
use super::GenerationService;
use crate::settings::Endpoint;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Bearer-token `generateContent` client.
///
/// System proxies are bypassed; gateways are reached directly.
pub struct GeminiClient {
    client: Client,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::new_with_client(client, timeout))
    }

    pub fn new_with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate_content(&self, endpoint: &Endpoint, request: &WireRequest) -> Result<Value> {
        tracing::debug!("Sending generateContent request to {}", endpoint.api_url);

        let response = self
            .client
            .post(&endpoint.api_url)
            .timeout(self.timeout)
            .bearer_auth(&endpoint.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to generation API: {}", e);
                Error::UpstreamTransport {
                    status: None,
                    body: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                "Generation API error (status {}): {}",
                status,
                error_text
            );
            return Err(Error::UpstreamTransport {
                status: Some(status.as_u16()),
                body: error_text,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse generation API response: {}", e);
            Error::UpstreamFormat(format!("response body is not JSON: {}", e))
        })
    }
}
