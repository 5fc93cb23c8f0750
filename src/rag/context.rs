//! Context building for RAG responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::Index;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds context from the index for a question.
pub struct ContextBuilder {
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            max_chunks: 4,
            min_score: 0.0,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Retrieve the chunks most similar to `query`.
    #[instrument(skip(self, index), fields(max_chunks = self.max_chunks))]
    pub async fn build(&self, query: &str, index: &Index) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let chunks: Vec<ContextChunk> = index
            .search_with_threshold(&query_embedding, self.max_chunks, self.min_score)
            .into_iter()
            .map(ContextChunk::from)
            .collect();

        debug!("Retrieved {} context chunks", chunks.len());
        Ok(chunks)
    }
}

/// Format context chunks for embedding in a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("---\n[{}]\n{}\n---", i + 1, chunk.content.trim_end()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
