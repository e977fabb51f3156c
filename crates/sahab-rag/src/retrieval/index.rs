//! Flat cosine-similarity index over statute chunks
//!
//! The corpus is a single statute book, so an exact scan over every
//! vector is both fast enough and deterministic. The index persists as a
//! directory holding `manifest.json` (metadata checked on load) and
//! `chunks.bin` (bincode-encoded passages and vectors).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, ChunkId, RetrievalResult, ScoredChunk};

/// On-disk format version written by this build
pub const FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const CHUNKS_FILE: &str = "chunks.bin";

/// Metadata persisted next to the chunk data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Format version
    pub format_version: u32,
    /// Vector dimension shared by every chunk
    pub dimensions: usize,
    /// Identity of the embedder that produced the vectors
    pub embedder: String,
    /// Number of chunks stored
    pub chunk_count: usize,
    /// Chunk window size used when building
    pub chunk_size: usize,
    /// Chunk overlap used when building
    pub chunk_overlap: usize,
    /// When the index was built
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct StoredChunk {
    text: String,
    vector: Vec<f32>,
}

/// In-memory similarity index
///
/// Always complete: either fully built from passages or fully loaded.
#[derive(Debug)]
pub struct VectorIndex {
    manifest: IndexManifest,
    chunks: Vec<Arc<Chunk>>,
    norms: Vec<f32>,
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl VectorIndex {
    fn from_parts(manifest: IndexManifest, chunks: Vec<Chunk>) -> Self {
        let norms = chunks.iter().map(|c| l2_norm(&c.vector)).collect();
        Self {
            manifest,
            chunks: chunks.into_iter().map(Arc::new).collect(),
            norms,
        }
    }

    /// Embed every passage and build an index
    pub async fn build(
        passages: Vec<String>,
        embedder: &dyn EmbeddingProvider,
        chunking: &ChunkingConfig,
        batch_size: usize,
    ) -> Result<Self> {
        let dimensions = embedder.dimensions();
        let mut chunks = Vec::with_capacity(passages.len());

        tracing::info!(
            "Building index: {} passages with {}",
            passages.len(),
            embedder.identity()
        );

        for batch in passages.chunks(batch_size.max(1)) {
            let vectors = embedder
                .embed_batch(batch)
                .await
                .map_err(|e| Error::index_build(format!("Embedding passages failed: {}", e)))?;

            if vectors.len() != batch.len() {
                return Err(Error::index_build(format!(
                    "Embedder returned {} vectors for {} passages",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (text, vector) in batch.iter().zip(vectors) {
                if vector.len() != dimensions {
                    return Err(Error::index_build(format!(
                        "Passage {} embedded to {} dimensions, expected {}",
                        chunks.len(),
                        vector.len(),
                        dimensions
                    )));
                }
                let id = ChunkId(chunks.len() as u32);
                chunks.push(Chunk::new(id, text.clone(), vector));
            }

            tracing::debug!("Embedded {}/{} passages", chunks.len(), passages.len());
        }

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            dimensions,
            embedder: embedder.identity(),
            chunk_count: chunks.len(),
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            created_at: Utc::now(),
        };

        Ok(Self::from_parts(manifest, chunks))
    }

    /// Load a persisted index, verifying it matches `embedder`
    pub fn load(path: &Path, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if !path.is_dir() {
            return Err(Error::index_load(format!(
                "No index at {}",
                path.display()
            )));
        }

        let manifest_raw = std::fs::read_to_string(path.join(MANIFEST_FILE))
            .map_err(|e| Error::index_load(format!("Failed to read manifest: {}", e)))?;
        let manifest: IndexManifest = serde_json::from_str(&manifest_raw)
            .map_err(|e| Error::index_load(format!("Invalid manifest: {}", e)))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::index_load(format!(
                "Unsupported index format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }
        if manifest.dimensions != embedder.dimensions() {
            return Err(Error::index_load(format!(
                "Index has {} dimensions but embedder produces {}",
                manifest.dimensions,
                embedder.dimensions()
            )));
        }
        if manifest.embedder != embedder.identity() {
            return Err(Error::index_load(format!(
                "Index was built by {} but the configured embedder is {}",
                manifest.embedder,
                embedder.identity()
            )));
        }

        let bytes = std::fs::read(path.join(CHUNKS_FILE))
            .map_err(|e| Error::index_load(format!("Failed to read chunk data: {}", e)))?;
        let (stored, _): (Vec<StoredChunk>, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| Error::index_load(format!("Corrupt chunk data: {}", e)))?;

        if stored.len() != manifest.chunk_count {
            return Err(Error::index_load(format!(
                "Manifest lists {} chunks but {} are stored",
                manifest.chunk_count,
                stored.len()
            )));
        }

        let mut chunks = Vec::with_capacity(stored.len());
        for (position, entry) in stored.into_iter().enumerate() {
            if entry.vector.len() != manifest.dimensions {
                return Err(Error::index_load(format!(
                    "Chunk {} has {} dimensions, expected {}",
                    position,
                    entry.vector.len(),
                    manifest.dimensions
                )));
            }
            chunks.push(Chunk::new(ChunkId(position as u32), entry.text, entry.vector));
        }

        tracing::info!(
            "Loaded index from {} ({} chunks, {} dimensions)",
            path.display(),
            chunks.len(),
            manifest.dimensions
        );

        Ok(Self::from_parts(manifest, chunks))
    }

    /// Persist to `path`, replacing any index already there
    ///
    /// Both files are written into a temporary sibling directory which is
    /// renamed into place. A previous index is moved aside first and only
    /// removed once the new one is in place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let staging = tempfile::Builder::new()
            .prefix(".index-staging-")
            .tempdir_in(&parent)?;

        let stored: Vec<StoredChunk> = self
            .chunks
            .iter()
            .map(|c| StoredChunk {
                text: c.text.clone(),
                vector: c.vector.clone(),
            })
            .collect();
        let bytes = bincode::serde::encode_to_vec(&stored, bincode::config::standard())
            .map_err(|e| Error::internal(format!("Failed to encode chunk data: {}", e)))?;

        std::fs::write(staging.path().join(CHUNKS_FILE), bytes)?;
        std::fs::write(
            staging.path().join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&self.manifest)?,
        )?;

        let backup = if path.exists() {
            let backup = parent.join(format!(
                ".index-previous-{}",
                uuid::Uuid::new_v4().simple()
            ));
            std::fs::rename(path, &backup)?;
            Some(backup)
        } else {
            None
        };

        // The staging guard only cleans up if the rename never happened
        if let Err(e) = std::fs::rename(staging.path(), path) {
            if let Some(backup) = &backup {
                let _ = std::fs::rename(backup, path);
            }
            return Err(e.into());
        }
        drop(staging);

        if let Some(backup) = backup {
            if let Err(e) = std::fs::remove_dir_all(&backup) {
                tracing::warn!("Failed to remove previous index {}: {}", backup.display(), e);
            }
        }

        tracing::info!("Saved index to {} ({} chunks)", path.display(), self.len());
        Ok(())
    }

    /// Up to `k` chunks by descending cosine similarity
    ///
    /// Equal scores keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<RetrievalResult> {
        if vector.len() != self.manifest.dimensions {
            return Err(Error::Retrieval(format!(
                "Query has {} dimensions, index has {}",
                vector.len(),
                self.manifest.dimensions
            )));
        }
        if k == 0 || self.chunks.is_empty() {
            return Ok(RetrievalResult::empty());
        }

        let query_norm = l2_norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(position, (chunk, norm))| {
                let denominator = query_norm * norm;
                let score = if denominator > 0.0 {
                    dot(vector, &chunk.vector) / denominator
                } else {
                    0.0
                };
                (position, score)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(RetrievalResult::new(
            scored
                .into_iter()
                .map(|(position, score)| ScoredChunk {
                    chunk: Arc::clone(&self.chunks[position]),
                    score,
                })
                .collect(),
        ))
    }

    /// Index metadata
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Vector dimension
    pub fn dimensions(&self) -> usize {
        self.manifest.dimensions
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk by id
    pub fn get(&self, id: ChunkId) -> Option<&Arc<Chunk>> {
        self.chunks.get(id.0 as usize)
    }
}
