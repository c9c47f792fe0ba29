mod embedding_factory;
mod in_memory_record_source;
mod in_memory_vector_index;
mod mock_embedding;
mod ollama_client;
mod ollama_embedding;
mod ort_embedding;
mod qdrant_vector_index;
mod rest_url;
mod supabase_record_source;

pub use embedding_factory::*;
pub use in_memory_record_source::*;
pub use in_memory_vector_index::*;
pub use mock_embedding::*;
pub use ollama_client::*;
pub use ollama_embedding::*;
pub use ort_embedding::*;
pub use qdrant_vector_index::*;
pub use supabase_record_source::*;
