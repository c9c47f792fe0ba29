//! # Connector Layer
//!
//! External integrations implementing the application interfaces:
//! - Record sources (Supabase RPC, in-memory)
//! - Vector indexes (Qdrant REST, in-memory)
//! - Embedding providers (ONNX Runtime, Ollama, mock) and the Ollama chat client
//! - The composition root, settings and CLI controllers

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
