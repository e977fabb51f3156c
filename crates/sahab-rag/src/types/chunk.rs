//! Chunk and retrieval result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque chunk handle: the chunk's insertion position in its index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(pub u32);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk-{}", self.0)
    }
}

/// A passage of statute text with its embedding
///
/// Chunks are immutable once built and are shared out of the index by `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Insertion position
    pub id: ChunkId,
    /// Passage text
    pub text: String,
    /// Embedding vector (dimension fixed per index)
    pub vector: Vec<f32>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(id: ChunkId, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id,
            text: text.into(),
            vector,
        }
    }

    /// Embedding dimension
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// A retrieved chunk with its cosine similarity to the query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Arc<Chunk>,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub score: f32,
}

/// Up to k chunks ordered by descending similarity; may be empty
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Wrap hits that are already ordered
    pub fn new(hits: Vec<ScoredChunk>) -> Self {
        Self { hits }
    }

    /// The "no context" result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Iterate hits in rank order
    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.hits.iter()
    }

    /// Passage texts in rank order
    pub fn passages(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.chunk.text.as_str()).collect()
    }

    /// Best similarity, if any
    pub fn top_score(&self) -> Option<f32> {
        self.hits.first().map(|h| h.score)
    }

    /// Drop hits scoring below `threshold`
    pub fn retain_above(&mut self, threshold: f32) {
        self.hits.retain(|h| h.score >= threshold);
    }

    /// Consume into the ordered hits
    pub fn into_hits(self) -> Vec<ScoredChunk> {
        self.hits
    }
}
