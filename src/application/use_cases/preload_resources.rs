use std::sync::Arc;

use tracing::{info, warn};

use crate::application::{
    CacheInfo, ChatClient, EmbeddingResolver, ResourceCache, WarmUp, WarmUpOutcome,
};
use crate::domain::{CacheKey, DomainError};

/// Builds a chat client for a cache key (endpoint + model).
pub type ChatClientFactory =
    Arc<dyn Fn(&CacheKey) -> Result<Arc<dyn ChatClient>, DomainError> + Send + Sync>;

/// Returns the cached chat client for `key`, creating and warming it on first use.
/// A failed warm-up is logged by the cache and does not fail the call.
pub async fn shared_chat_client(
    cache: &ResourceCache,
    key: &CacheKey,
    factory: &ChatClientFactory,
) -> Result<Arc<dyn ChatClient>, DomainError> {
    let client = cache
        .chat_clients()
        .get_or_create(key, || async { factory(key) })
        .await?;
    cache.chat_clients().warm_up(key).await?;
    Ok(client)
}

/// Creates and warms the serving-path handles ahead of the first request.
pub struct PreloadResourcesUseCase {
    cache: Arc<ResourceCache>,
    resolver: Arc<EmbeddingResolver>,
    chat: Option<(CacheKey, ChatClientFactory)>,
    keep_alive: Option<i64>,
}

impl PreloadResourcesUseCase {
    pub fn new(cache: Arc<ResourceCache>, resolver: Arc<EmbeddingResolver>) -> Self {
        Self {
            cache,
            resolver,
            chat: None,
            keep_alive: None,
        }
    }

    pub fn with_chat_client(mut self, key: CacheKey, factory: ChatClientFactory) -> Self {
        self.chat = Some((key, factory));
        self
    }

    /// After warming, asks the chat server to keep the model resident for
    /// `seconds` (zero or negative: indefinitely).
    pub fn with_keep_alive(mut self, seconds: Option<i64>) -> Self {
        self.keep_alive = seconds;
        self
    }

    pub async fn execute(&self, embedding_model: &str) -> Result<CacheInfo, DomainError> {
        info!("Preloading resources...");

        // The resolver registers the provider in its cache under this key.
        let key = self.resolver.cache_key(embedding_model);
        let provider = self.resolver.resolve(embedding_model).await?;

        if self.cache.embeddings().contains(&key) {
            if self.cache.embeddings().warm_up(&key).await? == WarmUpOutcome::Failed {
                warn!("Embedding model {} is loaded but not warmed", embedding_model);
            }
        } else if let Err(e) = provider.warm_up().await {
            warn!("Embedding model {} warm-up failed: {}", embedding_model, e);
        }

        if let Some((chat_key, factory)) = &self.chat {
            let client = shared_chat_client(&self.cache, chat_key, factory).await?;
            if let Some(seconds) = self.keep_alive {
                if let Err(e) = client.keep_alive(seconds).await {
                    warn!("Keep-alive for {} failed: {}", chat_key, e);
                }
            }
        }

        let info = self.cache.info();
        info!("Preloaded {} cached handles", info.count);
        Ok(info)
    }
}
