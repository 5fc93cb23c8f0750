//! In-memory similarity index over embedded chunks.
//!
//! An index is built once per source document and is read-only afterwards;
//! ingesting new material replaces it wholesale.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, StudyError};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{info, instrument};

/// A chunk paired with its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Read-only nearest-neighbour index.
#[derive(Debug, Clone)]
pub struct Index {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl Index {
    /// Assemble an index from chunks and their embeddings.
    ///
    /// Returns `None` for zero chunks.
    pub fn from_embeddings(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Option<Self>> {
        if chunks.len() != embeddings.len() {
            return Err(StudyError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(None);
        }

        let dimensions = embeddings[0].len();
        if embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(StudyError::Embedding(
                "embeddings have inconsistent dimensions".to_string(),
            ));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        Ok(Some(Self {
            entries,
            dimensions,
        }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Top `k` chunks by cosine similarity.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<SearchResult> {
        self.search_with_threshold(query_embedding, k, f32::NEG_INFINITY)
    }

    /// Top `k` chunks scoring at least `min_score`, best first.
    ///
    /// Equal scores keep chunk order.
    pub fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_score: f32,
    ) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        results.truncate(k);

        results
    }
}

/// Embeds chunks and builds an [`Index`].
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed every chunk and build the index. Zero chunks yields `None`.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<Option<Index>> {
        if chunks.is_empty() {
            return Ok(None);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let index = Index::from_embeddings(chunks, embeddings)?;
        if let Some(index) = &index {
            info!("Indexed {} chunks ({} dimensions)", index.len(), index.dimensions());
        }
        Ok(index)
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
