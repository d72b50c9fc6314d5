//! Guest dataset sources.
//!
//! Every lookup fetches exactly one snapshot of the guest list from a
//! [`DatasetSource`]. Sources never retry: a failed fetch ends the current
//! login attempt.
//!
//! - **Http** - `invitados.json` served by the event site
//! - **File** - a dataset on the local filesystem
//! - **Static** - a fixed in-memory snapshot (tests, embedding)
//!
//! ```no_run
//! use qrsocial_core::dataset::{DatasetSourceConfig, DatasetSourceFactory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = DatasetSourceFactory::create(DatasetSourceConfig::from_location(
//!     "https://boda.example.com/invitados.json",
//! ))?;
//! let dataset = source.fetch().await?;
//! println!("{} guests", dataset.guest_count());
//! # Ok(())
//! # }
//! ```

mod file;
#[cfg(feature = "http")]
mod http;
mod fixed;

pub use file::FileDatasetSource;
pub use fixed::StaticDatasetSource;
#[cfg(feature = "http")]
pub use http::{HttpDatasetConfig, HttpDatasetSource};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::guest::GuestDataset;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// The dataset could not be fetched at all (network, I/O, HTTP status).
    #[error("Guest dataset unavailable: {0}")]
    DataUnavailable(String),

    /// The dataset was fetched but is not a valid guest list.
    #[error("Guest dataset malformed: {0}")]
    DataMalformed(String),
}

/// Provider of guest dataset snapshots.
///
/// Implementations must be thread-safe (`Send + Sync`) so a single source can
/// be shared behind an `Arc`.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch one immutable snapshot of the guest list. Single attempt.
    async fn fetch(&self) -> Result<GuestDataset, DatasetError>;

    /// Human readable location, for logs.
    fn describe(&self) -> String;
}

/// Configuration for creating dataset sources.
#[derive(Debug, Clone)]
pub enum DatasetSourceConfig {
    #[cfg(feature = "http")]
    Http(HttpDatasetConfig),
    File(PathBuf),
    Static(GuestDataset),
}

impl DatasetSourceConfig {
    /// `http://` and `https://` locations are fetched over HTTP, anything else
    /// is treated as a filesystem path.
    pub fn from_location(location: &str) -> Self {
        #[cfg(feature = "http")]
        {
            if location.starts_with("http://") || location.starts_with("https://") {
                return Self::Http(HttpDatasetConfig::new(location));
            }
        }
        Self::File(PathBuf::from(location))
    }
}

/// Factory for creating dataset sources.
pub struct DatasetSourceFactory;

impl DatasetSourceFactory {
    pub fn create(config: DatasetSourceConfig) -> Result<Arc<dyn DatasetSource>, DatasetError> {
        match config {
            #[cfg(feature = "http")]
            DatasetSourceConfig::Http(http_config) => {
                let source = HttpDatasetSource::with_config(http_config)?;
                Ok(Arc::new(source))
            }
            DatasetSourceConfig::File(path) => Ok(Arc::new(FileDatasetSource::new(path))),
            DatasetSourceConfig::Static(dataset) => Ok(Arc::new(StaticDatasetSource::new(dataset))),
        }
    }
}
