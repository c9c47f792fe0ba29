use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::{CollectionInfo, CollectionSpec, DomainError, Point, SchemaChange, ScoredPoint};

/// Collection schema management, point writes and similarity search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns `None` when the collection does not exist.
    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, DomainError>;

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError>;

    /// Drops the collection (and every point in it) and creates it again.
    async fn recreate_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError>;

    /// Writes one batch. Existing ids are overwritten.
    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<(), DomainError>;

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, DomainError>;

    /// Makes sure `name` exists with `vector_size` dimensions and cosine distance.
    async fn ensure_collection(
        &self,
        name: &str,
        vector_size: usize,
    ) -> Result<SchemaChange, DomainError> {
        let spec = CollectionSpec::cosine(name, vector_size);

        let existing = match self.get_collection(name).await? {
            Some(existing) => existing,
            None => {
                info!("Collection '{}' missing. Creating...", name);
                self.create_collection(&spec).await?;
                info!(
                    "Created collection '{}' with vector size {} ({} distance)",
                    name,
                    vector_size,
                    spec.distance().as_str()
                );
                return Ok(SchemaChange::Created);
            }
        };

        match existing.dimension {
            Some(current) if current != vector_size => {
                info!(
                    "Collection '{}' has size {}, recreating with size {}",
                    name, current, vector_size
                );
                self.recreate_collection(&spec).await?;
                info!(
                    "Recreated collection '{}' with vector size {}",
                    name, vector_size
                );
                Ok(SchemaChange::Recreated { previous: current })
            }
            Some(_) => {
                debug!("Collection '{}' already has vector size {}", name, vector_size);
                Ok(SchemaChange::Unchanged)
            }
            None => {
                warn!(
                    "Could not read the vector size of collection '{}'; leaving it unchanged",
                    name
                );
                Ok(SchemaChange::Unchanged)
            }
        }
    }

    /// Upserts `points` in consecutive batches of at most `batch_size`.
    /// Returns the number of points written. A failing batch aborts the call;
    /// batches written before it stay in the index.
    async fn upsert_batched(
        &self,
        collection: &str,
        points: &[Point],
        batch_size: usize,
    ) -> Result<usize, DomainError> {
        if batch_size == 0 {
            return Err(DomainError::invalid_input("Batch size must be at least 1"));
        }

        let mut total = 0;
        for batch in points.chunks(batch_size) {
            self.upsert(collection, batch).await?;
            total += batch.len();
            debug!(
                "Upserted batch of {} points into '{}' ({} so far)",
                batch.len(),
                collection,
                total
            );
        }

        Ok(total)
    }
}
