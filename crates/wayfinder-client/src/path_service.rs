//! Shortest-path backend HTTP client.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use wayfinder_core::composer::{PathService, SegmentRequest, SegmentResponse};
use wayfinder_core::error::ServiceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs `{start, end}` segments to the path service.
#[derive(Debug, Clone)]
pub struct PathServiceClient {
    client: Client,
    url: String,
}

impl PathServiceClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PathService for PathServiceClient {
    async fn fetch_segment(
        &self,
        request: SegmentRequest,
    ) -> std::result::Result<SegmentResponse, ServiceError> {
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|err| ServiceError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Path service answered {} for {}", status, self.url);
            return Err(ServiceError::Status(status.as_u16()));
        }

        response
            .json::<SegmentResponse>()
            .await
            .map_err(|err| ServiceError::Malformed(err.to_string()))
    }
}
