use async_trait::async_trait;

use super::WarmUp;
use crate::domain::DomainError;

/// Maps text onto a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: WarmUp {
    fn model_name(&self) -> &str;

    /// Output dimension when the provider can report it without encoding.
    fn output_dimension(&self) -> Option<usize> {
        None
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.encode(text).await?);
        }
        Ok(vectors)
    }
}
