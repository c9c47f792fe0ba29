//! Reusable, pre-warmed model and network-client handles.

mod handle_registry;
mod resource_cache;

pub use handle_registry::*;
pub use resource_cache::*;
