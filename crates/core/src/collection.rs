//! Semantic collection and embedder collaborator traits.
//!
//! A semantic collection is an append-only, searchable index mapping chunk
//! text + metadata to vectors. The engine holds one collection per log type.
//! Collection entries are never re-indexed or mutated after `add`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollectionError;

/// Position of a chunk in its log's ledger. The position is the chunk's
/// identity: positional order is load-bearing for the merge/sort step.
pub type ChunkIdx = usize;

/// Metadata attached to an indexed chunk's text.
///
/// `index` equals the chunk's ledger position at the time of indexing and is
/// immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Ledger position of the chunk.
    pub index: ChunkIdx,
    /// Token count of the indexed text.
    pub tokens: usize,
}

/// One ranked search result.
///
/// `metadata` is optional at the interface boundary; an indexed entry coming
/// back without it is a fatal internal-consistency error at the use site,
/// not a recoverable condition.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub text: String,
    pub metadata: Option<DocumentMetadata>,
}

/// An append-only, searchable semantic index.
#[async_trait]
pub trait SemanticCollection: Send + Sync {
    /// Add a batch of texts with their metadata. `texts` and `metadatas`
    /// must have equal length; the whole batch is one unit.
    async fn add(
        &self,
        texts: Vec<String>,
        metadatas: Vec<DocumentMetadata>,
    ) -> Result<(), CollectionError>;

    /// Search the collection, returning hits ranked by the collection's own
    /// relevance metric, highest relevance first.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CollectionError>;
}

/// Produces embedding vectors for a batch of texts.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed each text; the output has one vector per input, same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CollectionError>;
}
