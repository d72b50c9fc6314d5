//! Dataset read from the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::{DatasetError, DatasetSource};
use crate::guest::GuestDataset;

pub struct FileDatasetSource {
    path: PathBuf,
}

impl FileDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetSource for FileDatasetSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<GuestDataset, DatasetError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            warn!(error = %e, "Failed to read guest dataset");
            match e.kind() {
                ErrorKind::NotFound => DatasetError::DataUnavailable(format!(
                    "{} does not exist",
                    self.path.display()
                )),
                _ => DatasetError::DataUnavailable(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )),
            }
        })?;

        let dataset = GuestDataset::from_json(&bytes)?;
        debug!(guests = dataset.guest_count(), "Loaded guest dataset");
        Ok(dataset)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
