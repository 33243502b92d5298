//! Outbound HTTP transport
//!
//! The client only ever issues signed GETs, so the seam is a single method.
//! Facades and tests swap in their own implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{WolframError, WolframResult};

/// Trait for fetching a signed URL
///
/// Implementations must be `Send + Sync`; one instance serves concurrent
/// queries without synchronization.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the name of this transport
    fn name(&self) -> &str;

    /// GET the URL and return the response body
    async fn get(&self, url: &str) -> WolframResult<String>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> WolframResult<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| WolframError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn get(&self, url: &str) -> WolframResult<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WolframError::Transport(format!(
                "provider returned {}: {}",
                status, text
            )));
        }

        Ok(response.text().await?)
    }
}
