use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::{EmbeddingProvider, WarmUp};
use crate::domain::DomainError;

const EMBED_PATH: &str = "/api/embed";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embeddings served by an Ollama instance. The output dimension is not
/// advertised by the API, so callers sample it.
pub struct OllamaEmbedding {
    client: reqwest::Client,
    model: String,
    url: String,
}

impl OllamaEmbedding {
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Self {
        let url = format!("{}{}", base_url.as_ref().trim_end_matches('/'), EMBED_PATH);
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            url,
        }
    }

    async fn embed(&self, input: Vec<&str>) -> Result<Vec<Vec<f32>>, DomainError> {
        let expected = input.len();
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("OllamaEmbedding: request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("OllamaEmbedding: API returned {}: {}", status, body);
            return Err(DomainError::embedding(format!(
                "OllamaEmbedding: API returned {}",
                status
            )));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            DomainError::embedding(format!("OllamaEmbedding: failed to parse response: {}", e))
        })?;

        if parsed.embeddings.len() != expected {
            return Err(DomainError::embedding(format!(
                "OllamaEmbedding: expected {} embeddings, got {}",
                expected,
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl WarmUp for OllamaEmbedding {
    async fn warm_up(&self) -> Result<(), DomainError> {
        self.embed(vec!["Hi"]).await.map(|_| ())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("OllamaEmbedding: empty response"))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.embed(texts.iter().map(String::as_str).collect()).await
    }
}
