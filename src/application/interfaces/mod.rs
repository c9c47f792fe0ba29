mod chat_client;
mod embedding_provider;
mod record_source;
mod vector_index;
mod warm_up;

pub use chat_client::*;
pub use embedding_provider::*;
pub use record_source::*;
pub use vector_index::*;
pub use warm_up::*;
