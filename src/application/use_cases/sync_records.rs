use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::{EmbeddingResolver, RecordSource, VectorIndex};
use crate::domain::{DomainError, Point, PointId, Record, RecordId, SyncReport, SyncStatus};

pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_FETCH_LIMIT: usize = 1000;

/// Fixed inputs of the sync job.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub procedure: String,
    pub collection: String,
    pub embedding_model: String,
    /// Vector size from configuration. Informational only: the embedding
    /// model's dimension always wins.
    pub configured_vector_size: Option<usize>,
}

/// Per-run overrides.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub collection: Option<String>,
    pub batch_size: usize,
    pub limit: Option<usize>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            collection: None,
            batch_size: DEFAULT_BATCH_SIZE,
            limit: None,
        }
    }
}

impl SyncOptions {
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A record that survived filtering, waiting for its vector.
struct PendingPoint {
    id: PointId,
    text: String,
    record: Record,
}

/// Reconciles relational records into vector-index points.
pub struct SyncRecordsUseCase {
    source: Arc<dyn RecordSource>,
    index: Arc<dyn VectorIndex>,
    resolver: Arc<EmbeddingResolver>,
    settings: SyncSettings,
}

impl SyncRecordsUseCase {
    pub fn new(
        source: Arc<dyn RecordSource>,
        index: Arc<dyn VectorIndex>,
        resolver: Arc<EmbeddingResolver>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            source,
            index,
            resolver,
            settings,
        }
    }

    pub async fn execute(&self, options: SyncOptions) -> Result<SyncReport, DomainError> {
        if options.batch_size == 0 {
            return Err(DomainError::invalid_input("Batch size must be at least 1"));
        }

        let start_time = Instant::now();
        let collection = options
            .collection
            .unwrap_or_else(|| self.settings.collection.clone());
        let limit = options.limit.unwrap_or(DEFAULT_FETCH_LIMIT);

        let records = self.fetch_records(limit).await;
        if records.is_empty() {
            info!(
                "No records returned from procedure '{}'",
                self.settings.procedure
            );
            return Ok(SyncReport::empty(collection));
        }

        let embedding = self
            .resolver
            .resolve_with_dimension(&self.settings.embedding_model)
            .await?;
        let vector_size = embedding.dimension();

        if let Some(configured) = self.settings.configured_vector_size {
            if configured != vector_size {
                info!(
                    "Embedding dimension {} differs from configured {}; using embedding dimension",
                    vector_size, configured
                );
            }
        }

        self.index.ensure_collection(&collection, vector_size).await?;

        let (pending, skipped_ids) = partition_records(&records);

        if pending.is_empty() {
            warn!("No valid records to upsert into '{}'", collection);
            return Ok(SyncReport {
                status: SyncStatus::Skipped,
                collection,
                records: records.len(),
                upserted: 0,
                skipped_ids,
                vector_dim: Some(vector_size),
            });
        }

        let mut points = Vec::with_capacity(pending.len());
        for group in pending.chunks(options.batch_size) {
            let texts: Vec<String> = group.iter().map(|p| p.text.clone()).collect();
            let vectors = embedding.provider().encode_batch(&texts).await?;
            if vectors.len() != group.len() {
                return Err(DomainError::embedding(format!(
                    "Expected {} vectors, embedding model returned {}",
                    group.len(),
                    vectors.len()
                )));
            }

            for (candidate, vector) in group.iter().zip(vectors) {
                if vector.len() != vector_size {
                    return Err(DomainError::embedding(format!(
                        "Vector for point {} has {} dimensions, collection '{}' expects {}",
                        candidate.id,
                        vector.len(),
                        collection,
                        vector_size
                    )));
                }
                points.push(Point::new(
                    candidate.id.clone(),
                    vector,
                    candidate.record.payload(),
                ));
            }
        }

        let upserted = self
            .index
            .upsert_batched(&collection, &points, options.batch_size)
            .await?;

        info!(
            "Upserted {} record embeddings into collection '{}' in {:.2}s",
            upserted,
            collection,
            start_time.elapsed().as_secs_f64()
        );

        Ok(SyncReport {
            status: SyncStatus::Success,
            collection,
            records: records.len(),
            upserted,
            skipped_ids,
            vector_dim: Some(vector_size),
        })
    }

    /// Fetches from the source, degrading to its fallback set when the call
    /// fails or comes back empty.
    async fn fetch_records(&self, limit: usize) -> Vec<Record> {
        let procedure = &self.settings.procedure;
        match self.source.fetch(procedure, limit).await {
            Ok(records) if !records.is_empty() => {
                info!(
                    "Retrieved {} records from procedure '{}'",
                    records.len(),
                    procedure
                );
                records
            }
            Ok(_) => {
                warn!(
                    "Procedure '{}' returned no records; using fallback records",
                    procedure
                );
                self.source.fallback(limit)
            }
            Err(e) => {
                warn!(
                    "Error calling procedure '{}': {}; using fallback records",
                    procedure, e
                );
                self.source.fallback(limit)
            }
        }
    }
}

/// Splits records into indexable candidates and the ids of skipped ones,
/// preserving source order.
fn partition_records(records: &[Record]) -> (Vec<PendingPoint>, Vec<Option<RecordId>>) {
    let mut pending = Vec::new();
    let mut skipped = Vec::new();

    for record in records {
        let Some(record_id) = record.id() else {
            debug!("Skipping record without id");
            skipped.push(None);
            continue;
        };

        let text = record.descriptive_text();
        if text.is_empty() {
            debug!("Skipping record {} with no descriptive fields", record_id);
            skipped.push(Some(record_id.clone()));
            continue;
        }

        pending.push(PendingPoint {
            id: PointId::from_record_id(record_id),
            text,
            record: record.clone(),
        });
    }

    (pending, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_keeps_order_of_skipped_ids() {
        let records = vec![
            Record::new(Some(RecordId::Integer(1)))
                .with_name("Acme")
                .with_description("Tech co"),
            Record::new(Some(RecordId::Integer(2))),
            Record::new(None).with_name("X"),
        ];

        let (pending, skipped) = partition_records(&records);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, PointId::Integer(1));
        assert_eq!(pending[0].text, "Company name: Acme. Description: Tech co");
        assert_eq!(skipped, vec![Some(RecordId::Integer(2)), None]);
    }

    #[test]
    fn partition_replaces_blank_string_ids() {
        let records = vec![Record::new(Some(RecordId::Text("  ".to_string()))).with_name("Blank")];

        let (pending, skipped) = partition_records(&records);

        assert!(skipped.is_empty());
        assert!(matches!(&pending[0].id, PointId::Text(id) if !id.trim().is_empty()));
    }
}
