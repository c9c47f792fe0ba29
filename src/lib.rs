pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::Commands;

pub use application::{
    ChatClient, EmbeddingProvider, EmbeddingResolver, PreloadResourcesUseCase, RecordSource,
    ResourceCache, RetrieveRecordsUseCase, SyncOptions, SyncRecordsUseCase, SyncSettings,
    VectorIndex, WarmUp,
};

pub use connector::{
    Container, ContainerConfig, InMemoryRecordSource, InMemoryVectorIndex, MockEmbedding,
    OllamaClient, OllamaEmbedding, OrtEmbedding, QdrantVectorIndex, Router, Settings,
    SupabaseRecordSource,
};

pub use domain::{
    CacheKey, ChatMessage, DomainError, Point, PointId, Record, RecordId, ScoredPoint, SyncReport,
    SyncStatus,
};
