use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{EmbeddingProvider, ProviderFactory};
use crate::domain::DomainError;

use super::{MockEmbedding, OllamaEmbedding, OrtEmbedding};

/// Where embeddings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackend {
    /// In-process ONNX Runtime with a Hugging Face sentence-transformer.
    #[default]
    Ort,
    Ollama,
    /// Deterministic hash-based vectors, no model needed.
    Mock,
}

impl EmbeddingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingBackend::Ort => "ort",
            EmbeddingBackend::Ollama => "ollama",
            EmbeddingBackend::Mock => "mock",
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ort" | "onnx" | "local" => Ok(EmbeddingBackend::Ort),
            "ollama" => Ok(EmbeddingBackend::Ollama),
            "mock" => Ok(EmbeddingBackend::Mock),
            other => Err(DomainError::config(format!(
                "Unknown embedding backend '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub ollama_base_url: String,
}

impl EmbeddingSettings {
    /// Identifies where providers built from these settings run. Used as the
    /// endpoint half of the cache key.
    pub fn endpoint(&self) -> String {
        match self.backend {
            EmbeddingBackend::Ort => "local://ort".to_string(),
            EmbeddingBackend::Ollama => self.ollama_base_url.trim_end_matches('/').to_string(),
            EmbeddingBackend::Mock => "local://mock".to_string(),
        }
    }
}

/// Builds the provider for `model`. The only place providers are constructed
/// from configuration.
pub fn create_embedding_provider(
    settings: &EmbeddingSettings,
    model: &str,
) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
    debug!(
        "Creating {} embedding provider for model {}",
        settings.backend.as_str(),
        model
    );
    match settings.backend {
        EmbeddingBackend::Ort => Ok(Arc::new(OrtEmbedding::new(model)?)),
        EmbeddingBackend::Ollama => Ok(Arc::new(OllamaEmbedding::new(
            &settings.ollama_base_url,
            model,
        ))),
        EmbeddingBackend::Mock => Ok(Arc::new(MockEmbedding::new().with_model(model))),
    }
}

pub fn provider_factory(settings: EmbeddingSettings) -> ProviderFactory {
    Arc::new(move |model: &str| create_embedding_provider(&settings, model))
}

/// Parses a backend name, falling back to ONNX for unknown values.
pub fn parse_backend_or_default(value: &str) -> EmbeddingBackend {
    value.parse().unwrap_or_else(|e: DomainError| {
        warn!("{}; using {}", e, EmbeddingBackend::default().as_str());
        EmbeddingBackend::default()
    })
}
