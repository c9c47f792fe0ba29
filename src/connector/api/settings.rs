use tracing::warn;

use crate::connector::adapter::{
    parse_backend_or_default, EmbeddingBackend, EmbeddingSettings, DEFAULT_CHAT_MODEL,
    DEFAULT_MODEL_ID, DEFAULT_OLLAMA_URL, DEFAULT_QDRANT_URL,
};

pub const DEFAULT_COLLECTION: &str = "companies";
pub const DEFAULT_PROCEDURE: &str = "get_company_infor";

/// Runtime configuration, read from the environment with local-first defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection: String,
    pub procedure: String,
    pub embedding_model: String,
    pub embedding_backend: EmbeddingBackend,
    /// Informational only; the collection is sized from the model itself.
    pub vector_size: Option<usize>,
    pub ollama_base_url: String,
    pub ollama_model: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let vector_size = var("QDRANT_VECTOR_SIZE").and_then(|raw| match raw.trim().parse() {
            Ok(size) => Some(size),
            Err(_) => {
                warn!("Ignoring QDRANT_VECTOR_SIZE={}: not a number", raw);
                None
            }
        });

        Self {
            supabase_url: var("SUPABASE_URL"),
            supabase_key: var("SUPABASE_ANON_KEY"),
            qdrant_url: var("QDRANT_URL").unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
            qdrant_api_key: var("QDRANT_API_KEY"),
            collection: var("COLLECTION_COMPANY").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            procedure: var("COMPANY_PROCEDURE").unwrap_or_else(|| DEFAULT_PROCEDURE.to_string()),
            embedding_model: var("TEXT_EMBEDDING_MODEL_ID")
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            embedding_backend: var("EMBEDDING_BACKEND")
                .map(|raw| parse_backend_or_default(&raw))
                .unwrap_or_default(),
            vector_size,
            ollama_base_url: var("OLLAMA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        }
    }

    pub fn embedding(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            backend: self.embedding_backend,
            ollama_base_url: self.ollama_base_url.clone(),
        }
    }

    /// Supabase URL and key, when both are configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_point_at_local_services() {
        let settings = Settings::default();

        assert_eq!(settings.qdrant_url, "http://localhost:6333");
        assert_eq!(settings.collection, "companies");
        assert_eq!(settings.procedure, "get_company_infor");
        assert_eq!(settings.embedding_backend, EmbeddingBackend::Ort);
        assert!(settings.supabase().is_none());
    }

    #[test]
    fn reads_overrides() {
        let settings = settings_from(&[
            ("COLLECTION_COMPANY", "firms"),
            ("EMBEDDING_BACKEND", "ollama"),
            ("QDRANT_VECTOR_SIZE", "768"),
            ("SUPABASE_URL", "https://db.example.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]);

        assert_eq!(settings.collection, "firms");
        assert_eq!(settings.embedding_backend, EmbeddingBackend::Ollama);
        assert_eq!(settings.vector_size, Some(768));
        assert_eq!(settings.supabase(), Some(("https://db.example.co", "anon")));
    }

    #[test]
    fn invalid_vector_size_and_blank_values_are_ignored() {
        let settings = settings_from(&[("QDRANT_VECTOR_SIZE", "big"), ("QDRANT_URL", "  ")]);

        assert_eq!(settings.vector_size, None);
        assert_eq!(settings.qdrant_url, "http://localhost:6333");
    }
}
