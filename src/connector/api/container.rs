use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::{
    shared_chat_client, ChatClient, ChatClientFactory, EmbeddingResolver, PreloadResourcesUseCase,
    RecordSource, ResourceCache, RetrieveRecordsUseCase, SyncRecordsUseCase, SyncSettings,
    VectorIndex,
};
use crate::connector::adapter::{
    provider_factory, EmbeddingBackend, InMemoryRecordSource, InMemoryVectorIndex, OllamaClient,
    QdrantVectorIndex, SupabaseRecordSource,
};
use crate::domain::{CacheKey, DomainError};

use super::Settings;

pub struct ContainerConfig {
    pub settings: Settings,
    pub mock_embeddings: bool,
    /// Keep points in process memory instead of Qdrant.
    pub memory_storage: bool,
    pub qdrant_url: Option<String>,
}

/// Composition root: owns the shared resource cache and hands out use cases
/// wired to the configured adapters.
pub struct Container {
    settings: Settings,
    cache: Arc<ResourceCache>,
    resolver: Arc<EmbeddingResolver>,
    source: Arc<dyn RecordSource>,
    index: Arc<dyn VectorIndex>,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let mut settings = config.settings;
        if config.mock_embeddings {
            debug!("Using mock embedding service");
            settings.embedding_backend = EmbeddingBackend::Mock;
        }
        if let Some(url) = config.qdrant_url {
            settings.qdrant_url = url;
        }

        let cache = Arc::new(ResourceCache::new());

        let embedding = settings.embedding();
        let resolver = Arc::new(
            EmbeddingResolver::new(embedding.endpoint(), provider_factory(embedding))
                .with_cache(Arc::clone(&cache)),
        );

        let index: Arc<dyn VectorIndex> = if config.memory_storage {
            debug!("Using in-memory vector storage");
            Arc::new(InMemoryVectorIndex::new())
        } else {
            debug!("Using Qdrant at {}", settings.qdrant_url);
            Arc::new(QdrantVectorIndex::new(
                &settings.qdrant_url,
                settings.qdrant_api_key.clone(),
            ))
        };

        let source: Arc<dyn RecordSource> = match settings.supabase() {
            Some((url, key)) => {
                debug!("Reading records from Supabase at {}", url);
                Arc::new(SupabaseRecordSource::new(url, key))
            }
            None => {
                warn!("SUPABASE_URL or SUPABASE_ANON_KEY not set; syncing placeholder records");
                Arc::new(InMemoryRecordSource::new(Vec::new()))
            }
        };

        Ok(Self {
            settings,
            cache,
            resolver,
            source,
            index,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> Arc<ResourceCache> {
        Arc::clone(&self.cache)
    }

    pub fn sync_use_case(&self) -> SyncRecordsUseCase {
        SyncRecordsUseCase::new(
            Arc::clone(&self.source),
            Arc::clone(&self.index),
            Arc::clone(&self.resolver),
            SyncSettings {
                procedure: self.settings.procedure.clone(),
                collection: self.settings.collection.clone(),
                embedding_model: self.settings.embedding_model.clone(),
                configured_vector_size: self.settings.vector_size,
            },
        )
    }

    pub fn retrieve_use_case(&self) -> RetrieveRecordsUseCase {
        RetrieveRecordsUseCase::new(
            Arc::clone(&self.index),
            Arc::clone(&self.resolver),
            self.settings.embedding_model.clone(),
            self.settings.collection.clone(),
        )
    }

    pub fn preload_use_case(&self) -> PreloadResourcesUseCase {
        PreloadResourcesUseCase::new(Arc::clone(&self.cache), Arc::clone(&self.resolver))
            .with_chat_client(self.chat_key(), chat_client_factory())
    }

    /// The shared, warmed chat client for the configured Ollama model.
    pub async fn chat_client(&self) -> Result<Arc<dyn ChatClient>> {
        let client =
            shared_chat_client(&self.cache, &self.chat_key(), &chat_client_factory()).await?;
        Ok(client)
    }

    fn chat_key(&self) -> CacheKey {
        CacheKey::new(&self.settings.ollama_base_url, self.settings.ollama_model.clone())
    }
}

fn chat_client_factory() -> ChatClientFactory {
    Arc::new(|key: &CacheKey| -> Result<Arc<dyn ChatClient>, DomainError> {
        let client = OllamaClient::new(key.endpoint(), key.model())?;
        Ok(Arc::new(client) as Arc<dyn ChatClient>)
    })
}
