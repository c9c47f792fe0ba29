use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorIndex;
use crate::domain::{
    CollectionInfo, CollectionSpec, DomainError, Point, PointId, ScoredPoint,
};

struct StoredCollection {
    spec: CollectionSpec,
    // insertion order is kept so listings are stable
    order: Vec<PointId>,
    points: HashMap<PointId, Point>,
}

impl StoredCollection {
    fn new(spec: CollectionSpec) -> Self {
        Self {
            spec,
            order: Vec::new(),
            points: HashMap::new(),
        }
    }
}

#[derive(Default)]
struct Stats {
    creates: usize,
    recreates: usize,
    batch_sizes: Vec<usize>,
}

/// Process-local vector index. Also records schema and write calls so the
/// batching and reconciliation behaviour can be observed.
pub struct InMemoryVectorIndex {
    collections: Arc<Mutex<HashMap<String, StoredCollection>>>,
    stats: Arc<Mutex<Stats>>,
    fail_after_batches: Option<usize>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(Stats::default())),
            fail_after_batches: None,
        }
    }

    /// Accepts `batches` upsert calls, then fails every following one.
    pub fn failing_after(mut self, batches: usize) -> Self {
        self.fail_after_batches = Some(batches);
        self
    }

    pub async fn points(&self, collection: &str) -> Vec<Point> {
        let collections = self.collections.lock().await;
        collections
            .get(collection)
            .map(|stored| {
                stored
                    .order
                    .iter()
                    .filter_map(|id| stored.points.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn point_count(&self, collection: &str) -> usize {
        let collections = self.collections.lock().await;
        collections
            .get(collection)
            .map(|stored| stored.points.len())
            .unwrap_or(0)
    }

    pub async fn create_calls(&self) -> usize {
        self.stats.lock().await.creates
    }

    pub async fn recreate_calls(&self) -> usize {
        self.stats.lock().await.recreates
    }

    /// Sizes of every upsert call made so far, in call order.
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.stats.lock().await.batch_sizes.clone()
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, DomainError> {
        let collections = self.collections.lock().await;
        Ok(collections.get(name).map(|stored| CollectionInfo {
            name: name.to_string(),
            dimension: Some(stored.spec.dimension()),
            distance: Some(stored.spec.distance()),
        }))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError> {
        let mut collections = self.collections.lock().await;
        if collections.contains_key(spec.name()) {
            return Err(DomainError::storage(format!(
                "Collection '{}' already exists",
                spec.name()
            )));
        }
        collections.insert(spec.name().to_string(), StoredCollection::new(spec.clone()));
        self.stats.lock().await.creates += 1;
        Ok(())
    }

    async fn recreate_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError> {
        let mut collections = self.collections.lock().await;
        collections.insert(spec.name().to_string(), StoredCollection::new(spec.clone()));
        self.stats.lock().await.recreates += 1;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<(), DomainError> {
        // lock order: collections, then stats
        let mut collections = self.collections.lock().await;
        let mut stats = self.stats.lock().await;
        if let Some(limit) = self.fail_after_batches {
            if stats.batch_sizes.len() >= limit {
                return Err(DomainError::storage("Injected upsert failure"));
            }
        }

        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| DomainError::not_found(format!("Collection '{}'", collection)))?;

        if let Some(point) = points
            .iter()
            .find(|p| p.dimensions() != stored.spec.dimension())
        {
            return Err(DomainError::storage(format!(
                "Point {} has {} dimensions, collection '{}' expects {}",
                point.id(),
                point.dimensions(),
                collection,
                stored.spec.dimension()
            )));
        }

        for point in points {
            if stored.points.insert(point.id().clone(), point.clone()).is_none() {
                stored.order.push(point.id().clone());
            }
        }
        stats.batch_sizes.push(points.len());

        debug!("Saved {} points to memory collection {}", points.len(), collection);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, DomainError> {
        let collections = self.collections.lock().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| DomainError::not_found(format!("Collection '{}'", collection)))?;

        let mut scored: Vec<ScoredPoint> = stored
            .points
            .values()
            .map(|point| {
                ScoredPoint::new(
                    point.id().clone(),
                    cosine_similarity(vector, point.vector()),
                    point.payload().clone(),
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn point(id: i64, vector: Vec<f32>) -> Point {
        Point::new(PointId::Integer(id), vector, Map::new())
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_ids() {
        let index = InMemoryVectorIndex::new();
        index
            .create_collection(&CollectionSpec::cosine("c", 2))
            .await
            .unwrap();

        index.upsert("c", &[point(1, vec![1.0, 0.0])]).await.unwrap();
        index.upsert("c", &[point(1, vec![0.0, 1.0])]).await.unwrap();

        let points = index.points("c").await;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].vector(), &[0.0, 1.0]);
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimension() {
        let index = InMemoryVectorIndex::new();
        index
            .create_collection(&CollectionSpec::cosine("c", 3))
            .await
            .unwrap();

        let err = index
            .upsert("c", &[point(1, vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(err.is_storage_error());
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let index = InMemoryVectorIndex::new();
        index
            .create_collection(&CollectionSpec::cosine("c", 2))
            .await
            .unwrap();
        index
            .upsert(
                "c",
                &[point(1, vec![1.0, 0.0]), point(2, vec![0.0, 1.0])],
            )
            .await
            .unwrap();

        let results = index.search("c", &[0.1, 0.9], 1).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), &PointId::Integer(2));
    }
}
