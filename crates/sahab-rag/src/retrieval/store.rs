//! Startup path for the index: load it if persisted, otherwise build it

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::{load_corpus, TextChunker};
use crate::providers::EmbeddingProvider;

use super::index::VectorIndex;

/// Read the corpus, chunk it and embed every passage
pub async fn build_from_corpus(
    config: &RagConfig,
    embedder: &dyn EmbeddingProvider,
) -> Result<VectorIndex> {
    let text = load_corpus(&config.corpus.path).await?;
    let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
    let windows = chunker.chunk(&text);
    let total = windows.len();

    // Blank runs in the corpus yield windows with nothing to embed
    let passages: Vec<String> = windows
        .into_iter()
        .filter(|window| !window.trim().is_empty())
        .collect();
    if passages.len() < total {
        tracing::debug!("Skipped {} blank passages", total - passages.len());
    }

    tracing::info!(
        "Chunked corpus into {} passages (size {}, overlap {})",
        passages.len(),
        chunker.chunk_size(),
        chunker.overlap()
    );

    VectorIndex::build(
        passages,
        embedder,
        &config.chunking,
        config.embeddings.batch_size,
    )
    .await
}

/// Load the persisted index, or build and persist it on first run
///
/// An index that exists but does not match the embedder is an error; it is
/// never silently rebuilt.
pub async fn open_or_build(
    config: &RagConfig,
    embedder: &dyn EmbeddingProvider,
) -> Result<VectorIndex> {
    let path = &config.index.path;

    if path.exists() {
        tracing::info!("Loading index from {}", path.display());
        return VectorIndex::load(path, embedder);
    }

    tracing::info!("No index at {}, building from corpus", path.display());
    let index = build_from_corpus(config, embedder).await?;
    index.save(path)?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use crate::error::Error;
    use crate::providers::HashingEmbedder;
    use crate::types::ChunkId;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> RagConfig {
        let mut config = RagConfig::default();
        config.corpus.path = dir.path().join("ipc.txt");
        config.index.path = dir.path().join("index");
        config.chunking.chunk_size = 40;
        config.chunking.chunk_overlap = 5;
        config.embeddings.backend = EmbeddingBackend::Hashing;
        config.embeddings.dimensions = 64;
        config
    }

    #[tokio::test]
    async fn test_first_run_builds_then_loads() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::write(
            &config.corpus.path,
            "Section 302: punishment for murder. Section 379: punishment for theft.",
        )
        .unwrap();
        let embedder = HashingEmbedder::new(64);

        let built = open_or_build(&config, &embedder).await.unwrap();
        assert!(config.index.path.join("manifest.json").exists());

        // Corpus is not read again once the index exists
        std::fs::remove_file(&config.corpus.path).unwrap();
        let loaded = open_or_build(&config, &embedder).await.unwrap();
        assert_eq!(loaded.len(), built.len());
        assert_eq!(loaded.manifest().chunk_size, 40);
    }

    #[tokio::test]
    async fn test_blank_runs_in_corpus_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let corpus = format!(
            "Section 302: punishment for murder.{}Section 379: punishment for theft.",
            " ".repeat(200)
        );
        std::fs::write(&config.corpus.path, corpus).unwrap();

        let index = build_from_corpus(&config, &HashingEmbedder::new(64)).await.unwrap();
        assert!(!index.is_empty());
        for i in 0..index.len() {
            let chunk = index.get(ChunkId(i as u32)).unwrap();
            assert!(!chunk.text.trim().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_corpus_is_build_error() {
        let dir = TempDir::new().unwrap();
        let err = open_or_build(&config(&dir), &HashingEmbedder::new(64))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IndexBuild(_)));
    }

    #[tokio::test]
    async fn test_incompatible_index_is_not_rebuilt() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::write(&config.corpus.path, "Section 34: common intention.").unwrap();
        open_or_build(&config, &HashingEmbedder::new(64)).await.unwrap();

        let err = open_or_build(&config, &HashingEmbedder::new(128))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IndexLoad(_)));
    }
}
