//! In-memory semantic collection, the reference backend, also used in tests.
//!
//! Append-only: entries are never re-embedded, re-indexed, or evicted.
//! Search embeds the query, scores every entry by cosine similarity, and
//! returns all entries ranked highest-first. Ties keep insertion order.

use std::sync::Arc;

use async_trait::async_trait;
use ctxchat_core::collection::{DocumentMetadata, Embedder, SearchHit, SemanticCollection};
use ctxchat_core::error::CollectionError;
use tokio::sync::RwLock;
use tracing::debug;

use crate::vector::cosine_similarity;

struct Entry {
    text: String,
    metadata: DocumentMetadata,
    embedding: Vec<f32>,
}

/// An embedding-backed collection that stores entries in a Vec.
pub struct InMemoryCollection {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryCollection {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Number of indexed entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SemanticCollection for InMemoryCollection {
    async fn add(
        &self,
        texts: Vec<String>,
        metadatas: Vec<DocumentMetadata>,
    ) -> Result<(), CollectionError> {
        if texts.len() != metadatas.len() {
            return Err(CollectionError::LengthMismatch {
                texts: texts.len(),
                metadatas: metadatas.len(),
            });
        }
        if texts.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(CollectionError::EmbeddingFailed(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        let mut entries = self.entries.write().await;
        for ((text, metadata), embedding) in texts.into_iter().zip(metadatas).zip(embeddings) {
            entries.push(Entry {
                text,
                metadata,
                embedding,
            });
        }
        debug!(total = entries.len(), "collection batch added");
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CollectionError> {
        let entries = self.entries.read().await;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_text = [query.to_string()];
        let query_embedding = self
            .embedder
            .embed(&query_text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CollectionError::EmbeddingFailed("embedder returned no vector for query".into())
            })?;

        let mut scored: Vec<(f32, &Entry)> = entries
            .iter()
            .map(|e| (cosine_similarity(&e.embedding, &query_embedding), e))
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .map(|(_, e)| SearchHit {
                text: e.text.clone(),
                metadata: Some(e.metadata),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Maps known texts to fixed vectors; unknown texts embed to zero.
    struct StaticEmbedder(HashMap<String, Vec<f32>>);

    impl StaticEmbedder {
        fn new(pairs: &[(&str, Vec<f32>)]) -> Arc<Self> {
            Arc::new(Self(
                pairs
                    .iter()
                    .map(|(t, v)| (t.to_string(), v.clone()))
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl Embedder for StaticEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CollectionError> {
            Ok(texts
                .iter()
                .map(|t| self.0.get(t).cloned().unwrap_or_else(|| vec![0.0, 0.0]))
                .collect())
        }
    }

    fn meta(index: usize, tokens: usize) -> DocumentMetadata {
        DocumentMetadata { index, tokens }
    }

    #[tokio::test]
    async fn add_rejects_length_mismatch() {
        let collection = InMemoryCollection::new(StaticEmbedder::new(&[]));
        let err = collection
            .add(vec!["one".into()], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::LengthMismatch { .. }));
    }

    #[tokio::test]
    async fn empty_collection_returns_no_hits() {
        let collection = InMemoryCollection::new(StaticEmbedder::new(&[]));
        let hits = collection.search("anything").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let embedder = StaticEmbedder::new(&[
            ("orthogonal", vec![0.0, 1.0]),
            ("identical", vec![1.0, 0.0]),
            ("partial", vec![0.5, 0.5]),
            ("query", vec![1.0, 0.0]),
        ]);
        let collection = InMemoryCollection::new(embedder);
        collection
            .add(
                vec!["orthogonal".into(), "identical".into(), "partial".into()],
                vec![meta(0, 1), meta(1, 1), meta(2, 1)],
            )
            .await
            .unwrap();

        let hits = collection.search("query").await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "identical");
        assert_eq!(hits[1].text, "partial");
        assert_eq!(hits[2].text, "orthogonal");
    }

    #[tokio::test]
    async fn hits_carry_their_metadata() {
        let embedder = StaticEmbedder::new(&[("a", vec![1.0, 0.0]), ("query", vec![1.0, 0.0])]);
        let collection = InMemoryCollection::new(embedder);
        collection
            .add(vec!["a".into()], vec![meta(7, 42)])
            .await
            .unwrap();

        let hits = collection.search("query").await.unwrap();
        assert_eq!(hits[0].metadata, Some(meta(7, 42)));
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order() {
        let embedder = StaticEmbedder::new(&[
            ("first", vec![1.0, 0.0]),
            ("second", vec![1.0, 0.0]),
            ("query", vec![1.0, 0.0]),
        ]);
        let collection = InMemoryCollection::new(embedder);
        collection
            .add(
                vec!["first".into(), "second".into()],
                vec![meta(0, 1), meta(1, 1)],
            )
            .await
            .unwrap();

        let hits = collection.search("query").await.unwrap();
        assert_eq!(hits[0].text, "first");
        assert_eq!(hits[1].text, "second");
    }

    #[tokio::test]
    async fn entries_accumulate_across_batches() {
        let collection = InMemoryCollection::new(StaticEmbedder::new(&[]));
        collection
            .add(vec!["a".into()], vec![meta(0, 1)])
            .await
            .unwrap();
        collection
            .add(vec!["b".into(), "c".into()], vec![meta(1, 1), meta(2, 1)])
            .await
            .unwrap();
        assert_eq!(collection.len().await, 3);
    }
}
