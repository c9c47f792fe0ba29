use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{EmbeddingProvider, ResourceCache};
use crate::domain::{CacheKey, DomainError};

/// Text encoded once to learn the output size of providers that cannot report it.
pub const DIMENSION_SAMPLE_TEXT: &str = "sample text";

/// Builds an embedding provider for a model name. Construction may block
/// (model downloads, session setup), so the resolver runs it off the async runtime.
pub type ProviderFactory =
    Arc<dyn Fn(&str) -> Result<Arc<dyn EmbeddingProvider>, DomainError> + Send + Sync>;

/// A provider together with its output dimension, resolved once per run.
#[derive(Clone)]
pub struct ResolvedEmbedding {
    provider: Arc<dyn EmbeddingProvider>,
    dimension: usize,
}

impl ResolvedEmbedding {
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

pub struct EmbeddingResolver {
    endpoint: String,
    factory: ProviderFactory,
    cache: Option<Arc<ResourceCache>>,
}

impl EmbeddingResolver {
    pub fn new(endpoint: impl Into<String>, factory: ProviderFactory) -> Self {
        Self {
            endpoint: endpoint.into(),
            factory,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResourceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_key(&self, model_name: &str) -> CacheKey {
        CacheKey::new(&self.endpoint, model_name)
    }

    pub fn cache(&self) -> Option<&Arc<ResourceCache>> {
        self.cache.as_ref()
    }

    /// Returns the cached provider for `model_name`, creating and registering
    /// it on first use. Without a cache, or when the cached path fails, a fresh
    /// provider is built directly.
    pub async fn resolve(&self, model_name: &str) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        if let Some(cache) = &self.cache {
            let key = self.cache_key(model_name);
            match cache
                .embeddings()
                .get_or_create(&key, || self.construct(model_name))
                .await
            {
                Ok(provider) => return Ok(provider),
                Err(e) => {
                    debug!("Falling back to direct embedding provider construction: {}", e);
                }
            }
        }

        self.construct(model_name).await
    }

    /// Resolves the provider and discovers its output dimension.
    pub async fn resolve_with_dimension(
        &self,
        model_name: &str,
    ) -> Result<ResolvedEmbedding, DomainError> {
        let provider = self.resolve(model_name).await?;
        let dimension = discover_dimension(provider.as_ref()).await?;
        info!(
            "Using embedding model {} with {} dimensions",
            provider.model_name(),
            dimension
        );
        Ok(ResolvedEmbedding {
            provider,
            dimension,
        })
    }

    async fn construct(&self, model_name: &str) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        let factory = Arc::clone(&self.factory);
        let model = model_name.to_string();
        tokio::task::spawn_blocking(move || factory(&model))
            .await
            .map_err(|e| {
                DomainError::internal(format!("Embedding provider construction panicked: {}", e))
            })?
    }
}

/// Asks the provider for its dimension, falling back to one sample encode.
pub async fn discover_dimension(provider: &dyn EmbeddingProvider) -> Result<usize, DomainError> {
    if let Some(dimension) = provider.output_dimension() {
        return Ok(dimension);
    }

    debug!(
        "Embedding model {} does not report its dimension; encoding a sample",
        provider.model_name()
    );
    let sample = provider.encode(DIMENSION_SAMPLE_TEXT).await?;
    if sample.is_empty() {
        return Err(DomainError::embedding(format!(
            "Embedding model {} returned an empty vector",
            provider.model_name()
        )));
    }
    Ok(sample.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockEmbedding;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails its first build, succeeds on every later one.
    fn flaky_factory(calls: Arc<AtomicUsize>) -> ProviderFactory {
        Arc::new(
            move |model: &str| -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(DomainError::embedding("model files still downloading"));
                }
                Ok(Arc::new(MockEmbedding::with_dimensions(4).with_model(model)))
            },
        )
    }

    #[tokio::test]
    async fn failed_cached_build_falls_back_without_registering() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ResourceCache::new());
        let resolver = EmbeddingResolver::new("local://test", flaky_factory(Arc::clone(&calls)))
            .with_cache(Arc::clone(&cache));
        let key = resolver.cache_key("model-a");

        let fallback = resolver.resolve("model-a").await.unwrap();
        assert_eq!(fallback.model_name(), "model-a");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.embeddings().contains(&key));
        assert_eq!(cache.info().count, 0);

        let cached = resolver.resolve("model-a").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cache.embeddings().contains(&key));
        assert!(!Arc::ptr_eq(&fallback, &cached));

        let again = resolver.resolve("model-a").await.unwrap();
        assert!(Arc::ptr_eq(&cached, &again));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reported_dimension_skips_the_sample_encode() {
        let provider = MockEmbedding::with_dimensions(12);

        assert_eq!(discover_dimension(&provider).await.unwrap(), 12);
        assert_eq!(provider.encode_calls(), 0);
    }

    #[tokio::test]
    async fn unreported_dimension_is_measured_from_a_sample() {
        let provider = MockEmbedding::with_dimensions(6).without_dimension_report();

        assert_eq!(discover_dimension(&provider).await.unwrap(), 6);
        assert_eq!(provider.encode_calls(), 1);
    }

    #[tokio::test]
    async fn empty_sample_is_an_embedding_error() {
        let provider = MockEmbedding::with_dimensions(0).without_dimension_report();

        let err = discover_dimension(&provider).await.unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingError(_)));
    }
}
