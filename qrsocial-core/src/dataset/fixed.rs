//! Fixed in-memory dataset.

use async_trait::async_trait;

use super::{DatasetError, DatasetSource};
use crate::guest::GuestDataset;

/// Source that always returns the same snapshot.
pub struct StaticDatasetSource {
    dataset: GuestDataset,
}

impl StaticDatasetSource {
    pub fn new(dataset: GuestDataset) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl DatasetSource for StaticDatasetSource {
    async fn fetch(&self) -> Result<GuestDataset, DatasetError> {
        Ok(self.dataset.clone())
    }

    fn describe(&self) -> String {
        "static snapshot".to_string()
    }
}
