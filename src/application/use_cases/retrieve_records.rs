use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::application::{EmbeddingResolver, VectorIndex};
use crate::domain::{DomainError, ScoredPoint};

pub const DEFAULT_TOP_K: usize = 5;

/// Serving-path lookup: encodes a question with the cached embedding model
/// and returns the closest records.
pub struct RetrieveRecordsUseCase {
    index: Arc<dyn VectorIndex>,
    resolver: Arc<EmbeddingResolver>,
    embedding_model: String,
    collection: String,
}

impl RetrieveRecordsUseCase {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        resolver: Arc<EmbeddingResolver>,
        embedding_model: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            index,
            resolver,
            embedding_model: embedding_model.into(),
            collection: collection.into(),
        }
    }

    pub async fn execute(&self, query: &str, top_k: usize) -> Result<Vec<ScoredPoint>, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::invalid_input("Query must not be empty"));
        }

        let start_time = Instant::now();
        let provider = self.resolver.resolve(&self.embedding_model).await?;
        let vector = provider.encode(query).await?;

        let results = self.index.search(&self.collection, &vector, top_k).await?;

        info!(
            "Retrieved {} records from '{}' in {:.2}s",
            results.len(),
            self.collection,
            start_time.elapsed().as_secs_f64()
        );

        Ok(results)
    }
}
