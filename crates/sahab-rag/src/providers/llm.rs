//! LLM provider trait for streaming answer generation

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::error::Result;

/// Incremental text fragments from a generative model
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `GeminiClient`: Google Gemini (gemini-2.5-pro)
/// - `OllamaLlm`: Local Ollama server (phi3, llama3, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Start generating; the returned stream yields fragments as the model
    /// produces them and ends when the model is done
    async fn generate_stream(&self, prompt: &str) -> Result<ProviderStream>;

    /// Generate the full answer in one call
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut stream = self.generate_stream(prompt).await?;
        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            answer.push_str(&fragment?);
        }
        Ok(answer)
    }

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
