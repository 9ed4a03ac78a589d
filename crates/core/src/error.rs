//! Error types for the ctxchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each collaborator
//! boundary has its own error variant; internal-consistency failures get a
//! dedicated variant because they indicate a ledger/collection
//! desynchronization bug and must abort the request rather than silently
//! skip data. Budget exhaustion is never an error: aggregation paths stop
//! and return what they accumulated.

use thiserror::Error;

/// The top-level error type for all ctxchat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Collaborator failures (propagated, no in-core retry) ---
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Chunker error: {0}")]
    Chunker(#[from] ChunkerError),

    // --- Internal-consistency failures (fatal per request) ---
    #[error("Internal consistency error: {0}")]
    Consistency(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias defaulting to the top-level [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

// --- Collaborator boundary errors ---

#[derive(Debug, Clone, Error)]
pub enum CollectionError {
    #[error("Add failed: {0}")]
    AddFailed(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Texts and metadatas differ in length: {texts} vs {metadatas}")]
    LengthMismatch { texts: usize, metadatas: usize },
}

#[derive(Debug, Clone, Error)]
pub enum ChunkerError {
    #[error("Message could not be split: {0}")]
    SplitFailed(String),

    #[error("Chunk size limit too small: {limit} chars cannot hold a message envelope of {envelope} chars")]
    LimitTooSmall { limit: usize, envelope: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_error_displays_correctly() {
        let err = Error::Collection(CollectionError::LengthMismatch {
            texts: 3,
            metadatas: 2,
        });
        assert!(err.to_string().contains("3 vs 2"));
    }

    #[test]
    fn consistency_error_is_distinguishable() {
        let err = Error::Consistency("chunk 4 points at missing message 7".into());
        assert!(matches!(err, Error::Consistency(_)));
        assert!(err.to_string().contains("chunk 4"));
    }

    #[test]
    fn chunker_error_displays_limit() {
        let err = Error::Chunker(ChunkerError::LimitTooSmall {
            limit: 10,
            envelope: 80,
        });
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("80"));
    }
}
