//! Guest dataset fetched over HTTP.
//!
//! One GET per lookup, no retry or backoff. A failed fetch ends the login
//! attempt.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use super::{DatasetError, DatasetSource};
use crate::guest::GuestDataset;

/// Default timeout for the dataset request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpDatasetConfig {
    /// Dataset URL, typically `<site>/invitados.json`.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpDatasetConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct HttpDatasetSource {
    client: Client,
    config: HttpDatasetConfig,
}

impl HttpDatasetSource {
    #[instrument(level = "debug", skip_all, fields(
        url = %config.url,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn with_config(config: HttpDatasetConfig) -> Result<Self, DatasetError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                DatasetError::DataUnavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        debug!("HTTP dataset source created");
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    #[instrument(level = "info", skip(self), fields(url = %self.config.url))]
    async fn fetch(&self) -> Result<GuestDataset, DatasetError> {
        let start = Instant::now();

        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, latency_ms = start.elapsed().as_millis() as u64, "Dataset request failed");
                DatasetError::DataUnavailable(format!("Request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Dataset request returned an error status");
            return Err(DatasetError::DataUnavailable(format!(
                "Dataset returned status: {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Failed to read dataset body");
            DatasetError::DataUnavailable(format!("Failed to read response body: {e}"))
        })?;

        let dataset = GuestDataset::from_json(&body)?;
        info!(
            guests = dataset.guest_count(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched guest dataset"
        );
        Ok(dataset)
    }

    fn describe(&self) -> String {
        self.config.url.clone()
    }
}
