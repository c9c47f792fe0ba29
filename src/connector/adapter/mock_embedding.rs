use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use tracing::debug;

use crate::application::{EmbeddingProvider, WarmUp};
use crate::domain::DomainError;

pub const MOCK_MODEL_NAME: &str = "mock-embedding";
const DEFAULT_DIMENSIONS: usize = 384;

/// Deterministic embeddings seeded from a hash of the input text.
pub struct MockEmbedding {
    model: String,
    dimensions: usize,
    reports_dimension: bool,
    encode_calls: AtomicUsize,
    warm_ups: AtomicUsize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            model: MOCK_MODEL_NAME.to_string(),
            dimensions,
            reports_dimension: true,
            encode_calls: AtomicUsize::new(0),
            warm_ups: AtomicUsize::new(0),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Hides the dimension so callers have to sample it.
    pub fn without_dimension_report(mut self) -> Self {
        self.reports_dimension = false;
        self
    }

    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    pub fn warm_ups(&self) -> usize {
        self.warm_ups.load(Ordering::SeqCst)
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WarmUp for MockEmbedding {
    async fn warm_up(&self) -> Result<(), DomainError> {
        self.warm_ups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedding {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn output_dimension(&self) -> Option<usize> {
        self.reports_dimension.then_some(self.dimensions)
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        let vector = self.generate_embedding(text);
        debug!("Generated mock embedding with {} dimensions", vector.len());
        Ok(vector)
    }
}
