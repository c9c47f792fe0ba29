use serde::Serialize;
use tracing::info;

use super::HandleRegistry;
use crate::application::{ChatClient, EmbeddingProvider};

/// Snapshot of what the cache currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub cached: Vec<String>,
    pub warmed: Vec<String>,
    pub count: usize,
}

/// Shared registry of pre-warmed embedding providers and chat clients.
///
/// One instance is owned by the composition root and handed out as
/// `Arc<ResourceCache>` to both the sync job and the serving path.
pub struct ResourceCache {
    embeddings: HandleRegistry<dyn EmbeddingProvider>,
    chat_clients: HandleRegistry<dyn ChatClient>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self {
            embeddings: HandleRegistry::new("embedding provider"),
            chat_clients: HandleRegistry::new("chat client"),
        }
    }

    pub fn embeddings(&self) -> &HandleRegistry<dyn EmbeddingProvider> {
        &self.embeddings
    }

    pub fn chat_clients(&self) -> &HandleRegistry<dyn ChatClient> {
        &self.chat_clients
    }

    /// Empties both registries along with their warm-up markers.
    pub fn clear(&self) {
        self.embeddings.clear();
        self.chat_clients.clear();
        info!("Cleared resource cache");
    }

    pub fn info(&self) -> CacheInfo {
        let cached: Vec<String> = self
            .embeddings
            .keys()
            .into_iter()
            .chain(self.chat_clients.keys())
            .map(|key| key.to_string())
            .collect();
        let warmed: Vec<String> = self
            .embeddings
            .warmed_keys()
            .into_iter()
            .chain(self.chat_clients.warmed_keys())
            .map(|key| key.to_string())
            .collect();

        CacheInfo {
            count: cached.len(),
            cached,
            warmed,
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}
