//! Offline feature-hashing embedder
//!
//! Deterministic, network-free vectors for development and tests. Each
//! lowercase alphanumeric token is hashed into a signed bucket and the
//! result is L2-normalized, so texts sharing terms score high under
//! cosine similarity.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Feature-hashing embedding provider
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create a hashing embedder producing `dimensions`-wide vectors
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    /// Embed synchronously
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in Self::tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::embedding("Cannot embed empty text"));
        }
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }

    fn model(&self) -> &str {
        "feature-hash-v1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_sync("Section 302. Punishment for murder");
        let b = embedder.embed_sync("Section 302. Punishment for murder");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = HashingEmbedder::new(128);
        assert_eq!(
            embedder.embed_sync("Punishment for MURDER."),
            embedder.embed_sync("punishment for murder")
        );
    }

    #[test]
    fn test_shared_terms_score_higher() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.embed_sync("punishment for murder");
        let murder = embedder.embed_sync("Section 302 punishment for murder death");
        let theft = embedder.embed_sync("Section 379 theft of movable property");
        assert!(cosine(&query, &murder) > cosine(&query, &theft));
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed("   ").await.is_err());
        assert_eq!(embedder.identity(), "hashing/feature-hash-v1");
    }
}
