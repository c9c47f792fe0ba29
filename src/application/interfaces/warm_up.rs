use async_trait::async_trait;

use crate::domain::DomainError;

/// A handle that can be forced into a ready, low-latency state with a minimal
/// round trip before its first real use.
#[async_trait]
pub trait WarmUp: Send + Sync {
    async fn warm_up(&self) -> Result<(), DomainError>;
}
