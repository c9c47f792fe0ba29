//! # Application Layer
//!
//! Interfaces implemented by connectors, the shared resource cache, and the
//! use cases that orchestrate them.

pub mod cache;
mod embedding_resolver;
pub mod interfaces;
pub mod use_cases;

pub use cache::*;
pub use embedding_resolver::*;
pub use interfaces::*;
pub use use_cases::*;
