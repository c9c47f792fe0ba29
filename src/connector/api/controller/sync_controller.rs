use anyhow::Result;
use tracing::warn;

use crate::application::SyncOptions;

use super::super::Container;

pub struct SyncController<'a> {
    container: &'a Container,
}

impl<'a> SyncController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn sync(
        &self,
        collection: Option<String>,
        batch_size: usize,
        limit: Option<usize>,
    ) -> Result<String> {
        let mut options = SyncOptions::default().with_batch_size(batch_size);
        if let Some(collection) = collection {
            options = options.with_collection(collection);
        }
        if let Some(limit) = limit {
            options = options.with_limit(limit);
        }

        let report = self.container.sync_use_case().execute(options).await?;
        if !report.is_success() {
            warn!(
                "Sync of '{}' finished with status {}: nothing was indexed",
                report.collection,
                report.status.as_str()
            );
        }
        Ok(serde_json::to_string_pretty(&report)?)
    }
}
