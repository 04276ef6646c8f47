//! Retrieval orchestrator: annotate → embed → index, with quarter-aware
//! filtered search at query time.
//!
//! Embedding similarity alone frequently fails to distinguish "Q1" from
//! "Q3" passages that are textually near-identical apart from the quarter
//! label. When a query names a quarter, the retriever first narrows the
//! candidate set lexically to chunks that also name a quarter, then runs
//! the vector search over that subset. This is a precision heuristic
//! layered on top of semantic search, not a replacement for it; if the
//! filtered subset is empty the full index is searched instead.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::annotate::annotate;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Lexical quarter indicators, matched case-insensitively as substrings
/// of both the query and the indexed chunk texts.
pub const QUARTER_TERMS: [&str; 8] = [
    "q1",
    "q2",
    "q3",
    "q4",
    "first quarter",
    "second quarter",
    "third quarter",
    "fourth quarter",
];

/// Builds an in-memory index over annotated chunks and retrieves the
/// chunks most relevant to a query.
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
}

impl Retriever {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            index: VectorIndex::new(),
        }
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Annotate, embed, and index a set of chunks.
    ///
    /// Fully replaces any previously built index; calling twice with the
    /// same chunks leaves the retriever in the same state. The annotated
    /// form replaces the raw chunk for all downstream use.
    pub async fn build_index(&mut self, chunks: &[String]) -> Result<()> {
        let annotated: Vec<String> = chunks.iter().map(|c| annotate(c)).collect();
        let vectors = self.provider.embed(&annotated).await?;

        let mut index = VectorIndex::new();
        index.build(vectors, annotated)?;
        debug!(chunks = index.len(), dims = index.dims(), "index built");
        self.index = index;
        Ok(())
    }

    /// Retrieve up to `k` chunk texts relevant to `query`, ordered by
    /// ascending distance to the query embedding.
    ///
    /// Queries naming a quarter are searched against the lexically
    /// filtered subset of chunks that also name a quarter; otherwise (or
    /// when the subset is empty) the full index is searched. An empty
    /// filtered subset is an expected fallback, not an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let query_texts = [query.to_string()];
        let query_vec = self
            .provider
            .embed(&query_texts)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::UpstreamFailure {
                service: "embeddings".to_string(),
                message: "empty embedding response for query".to_string(),
            })?;

        if mentions_quarter(query) {
            let filtered: Vec<usize> = (0..self.index.len())
                .filter(|&i| mentions_quarter(&self.index.texts()[i]))
                .collect();

            if !filtered.is_empty() {
                debug!(
                    candidates = filtered.len(),
                    "quarter indicator in query; searching filtered subset"
                );
                let vectors: Vec<Vec<f32>> = filtered
                    .iter()
                    .map(|&i| self.index.vector(i).to_vec())
                    .collect();
                let texts: Vec<String> = filtered
                    .iter()
                    .map(|&i| self.index.texts()[i].clone())
                    .collect();

                let mut sub_index = VectorIndex::new();
                sub_index.build(vectors, texts)?;

                let hits = sub_index.search(&query_vec, k)?;
                return Ok(hits
                    .into_iter()
                    .map(|(i, _)| sub_index.texts()[i].clone())
                    .collect());
            }
            debug!("quarter indicator in query but no chunk matches; falling back to full index");
        }

        let hits = self.index.search(&query_vec, k)?;
        Ok(hits
            .into_iter()
            .map(|(i, _)| self.index.texts()[i].clone())
            .collect())
    }

    /// Persist the current index to `dir`.
    pub fn save_index(&self, dir: &Path) -> Result<()> {
        self.index.save(dir)
    }

    /// Replace the current index with one loaded from `dir`.
    ///
    /// The persisted index must have been built with a provider of the
    /// same dimensionality as this retriever's.
    pub fn load_index(&mut self, dir: &Path) -> Result<()> {
        self.index = VectorIndex::load(dir)?;
        Ok(())
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

fn mentions_quarter(text: &str) -> bool {
    let lower = text.to_lowercase();
    QUARTER_TERMS.iter().any(|term| lower.contains(term))
}
