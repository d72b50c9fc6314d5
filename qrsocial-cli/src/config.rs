//! CLI configuration.
//!
//! Values come from environment variables with sensible defaults; command
//! line flags override them in `main`.

use std::path::PathBuf;
use std::time::Duration;

use qrsocial_core::{CaptureConfig, DatasetSourceConfig, FacingMode};

#[derive(Debug, Clone)]
pub struct Config {
    /// Guest dataset URL or path (default: public/invitados.json)
    pub dataset: String,
    /// Session file (default: .qrsocial/session.json)
    pub session_file: PathBuf,
    /// Pause between capture ticks (default: 16ms)
    pub tick_interval: Duration,
    /// Timeout for HTTP dataset fetches (default: 10s)
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: "public/invitados.json".to_string(),
            session_file: PathBuf::from(".qrsocial/session.json"),
            tick_interval: Duration::from_millis(16),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let dataset = lookup("QRSOCIAL_DATASET")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.dataset);

        let session_file = lookup("QRSOCIAL_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        let tick_interval = lookup("QRSOCIAL_TICK_MS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);

        let http_timeout = lookup("QRSOCIAL_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        Self {
            dataset,
            session_file,
            tick_interval,
            http_timeout,
        }
    }

    pub fn dataset_source(&self) -> DatasetSourceConfig {
        match DatasetSourceConfig::from_location(&self.dataset) {
            DatasetSourceConfig::Http(http) => {
                DatasetSourceConfig::Http(http.with_timeout(self.http_timeout))
            }
            other => other,
        }
    }

    pub fn capture(&self, facing: FacingMode) -> CaptureConfig {
        CaptureConfig {
            facing,
            tick_interval: self.tick_interval,
        }
    }
}
