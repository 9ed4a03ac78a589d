//! # ctxchat Core
//!
//! Domain types, collaborator traits, and error definitions for the ctxchat
//! contextualized-chat assembly engine. This crate carries no runtime or
//! backend dependencies; it defines the domain model that the other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (tokenizer, message chunker, semantic
//! collection, embedder) is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping backends via configuration
//! - Easy testing with stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod chat;
pub mod chunker;
pub mod collection;
pub mod error;
pub mod message;
pub mod tokenizer;

// Re-export key types at crate root for ergonomics
pub use chat::Chat;
pub use chunker::MessageChunker;
pub use collection::{ChunkIdx, DocumentMetadata, Embedder, SearchHit, SemanticCollection};
pub use error::{ChunkerError, CollectionError, Error, Result};
pub use message::{LogType, Message, Role};
pub use tokenizer::{HeuristicTokenizer, Tokenizer};
