//! Question-to-passages retrieval

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::providers::EmbeddingProvider;
use crate::types::RetrievalResult;

use super::index::VectorIndex;

/// Embeds a question and looks up its nearest passages
///
/// Never fails: an embedding or lookup error degrades to an empty result so
/// the turn continues without context.
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    similarity_threshold: f32,
}

impl Retriever {
    /// Create a retriever over a loaded index
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
        }
    }

    /// Ranked passages for `question`, possibly empty
    pub async fn retrieve(&self, question: &str) -> RetrievalResult {
        match self.try_retrieve(question).await {
            Ok(result) => {
                tracing::debug!(
                    "Retrieved {} passages (top score {:?})",
                    result.len(),
                    result.top_score()
                );
                result
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, continuing without context: {}", e);
                RetrievalResult::empty()
            }
        }
    }

    async fn try_retrieve(&self, question: &str) -> Result<RetrievalResult> {
        let vector = self.embedder.embed(question).await?;
        let mut result = self.index.query(&vector, self.top_k)?;
        if self.similarity_threshold > 0.0 {
            result.retain_above(self.similarity_threshold);
        }
        Ok(result)
    }

    /// The index being searched
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }
}
