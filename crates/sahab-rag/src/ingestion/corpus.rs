//! Statute corpus loading

use std::path::Path;

use crate::error::{Error, Result};

/// Read the plain-text corpus once, at index build time
///
/// A missing or unreadable corpus makes the index impossible to build, so
/// it is reported as an `IndexBuild` error.
pub async fn load_corpus(path: &Path) -> Result<String> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::index_build(format!("Failed to read corpus {}: {}", path.display(), e))
    })?;

    tracing::info!(
        "Corpus loaded from {} ({} characters)",
        path.display(),
        text.chars().count()
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_corpus_is_build_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_corpus(&dir.path().join("absent.txt")).await.unwrap_err();
        assert!(matches!(err, Error::IndexBuild(_)));
    }

    #[tokio::test]
    async fn test_reads_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipc.txt");
        std::fs::write(&path, "Section 302: punishment for murder.").unwrap();
        assert_eq!(
            load_corpus(&path).await.unwrap(),
            "Section 302: punishment for murder."
        );
    }
}
