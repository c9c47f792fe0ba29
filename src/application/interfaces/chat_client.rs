use async_trait::async_trait;

use super::WarmUp;
use crate::domain::{ChatMessage, DomainError};

/// A chat model reachable over the network. One client is bound to one
/// endpoint and model, which is what the resource cache keys it by.
#[async_trait]
pub trait ChatClient: WarmUp {
    fn model_name(&self) -> &str;

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, DomainError>;

    /// Legacy completion: the conversation is flattened into a single prompt.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, DomainError>;

    /// Asks the server to keep the model resident for `seconds`. Zero or a
    /// negative value means until the server shuts down.
    async fn keep_alive(&self, seconds: i64) -> Result<(), DomainError>;
}
