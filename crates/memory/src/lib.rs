//! Semantic collection backends for ctxchat.

pub mod in_memory;
pub mod vector;

pub use in_memory::InMemoryCollection;
pub use vector::cosine_similarity;
