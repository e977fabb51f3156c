//! Ollama client for embeddings and streaming generation, with retry logic

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::line_decoder::decode_lines;
use super::retry::{retry_with_backoff, DEFAULT_RETRY_DELAY};
use super::llm::{LlmProvider, ProviderStream};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Ollama base URL
    base_url: String,
    /// Maximum retries
    max_retries: u32,
    /// Per-request timeout for non-streaming calls
    request_timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(base_url: impl Into<String>, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        // No overall timeout: generation bodies stream for as long as the
        // model talks. The streamer bounds the waits instead.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        retry_with_backoff("Ollama", self.max_retries, DEFAULT_RETRY_DELAY, operation).await
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let url = url.as_str();

        self.retry_request(|| async move {
            let response = self
                .client
                .post(url)
                .timeout(self.request_timeout)
                .json(&EmbedRequest { model, prompt: text })
                .send()
                .await
                .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::embedding(format!(
                    "Embedding failed: HTTP {}",
                    response.status()
                )));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse embedding response: {}", e))
            })?;

            Ok(embed_response.embedding)
        })
        .await
    }

    /// Start a streaming generation
    ///
    /// Only establishing the stream is retried; once fragments flow, a
    /// failure ends the stream.
    pub async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<ProviderStream> {
        let url = format!("{}/api/generate", self.base_url);
        let url = url.as_str();

        let response = self
            .retry_request(|| async move {
                let request = GenerateRequest {
                    model,
                    prompt,
                    stream: true,
                    options: GenerateOptions {
                        temperature,
                        num_predict: max_tokens,
                    },
                };

                let response = self
                    .client
                    .post(url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::generation(format!("Stream request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::generation(format!(
                        "Stream failed: HTTP {} - {}",
                        status, body
                    )));
                }

                Ok(response)
            })
            .await?;

        Ok(decode_lines(response.bytes_stream(), decode_ndjson_line))
    }
}

/// Decode one NDJSON line of `/api/generate` output
fn decode_ndjson_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamChunk>(line) {
        Ok(StreamChunk {
            error: Some(error), ..
        }) => Some(Err(Error::generation(error))),
        Ok(chunk) if chunk.response.is_empty() => None,
        Ok(chunk) => Some(Ok(chunk.response)),
        Err(e) => Some(Err(Error::generation(format!(
            "Malformed Ollama stream line: {}",
            e
        )))),
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
    model: String,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(&config.ollama_url, 60, 2)?),
            dimensions: config.dimensions,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(
                &config.ollama_url,
                config.timeout_secs,
                config.max_retries,
            )?),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate_stream(&self, prompt: &str) -> Result<ProviderStream> {
        tracing::debug!("Streaming from Ollama model {}", self.model);
        self.client
            .generate_stream(&self.model, prompt, self.temperature, self.max_tokens)
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ndjson_fragment() {
        let item = decode_ndjson_line(r#"{"model":"phi3","response":"Section","done":false}"#);
        assert_eq!(item.unwrap().unwrap(), "Section");
    }

    #[test]
    fn test_decode_ndjson_skips_empty_done_line() {
        assert!(decode_ndjson_line(r#"{"model":"phi3","response":"","done":true}"#).is_none());
        assert!(decode_ndjson_line("   ").is_none());
    }

    #[test]
    fn test_decode_ndjson_error_line() {
        let item = decode_ndjson_line(r#"{"error":"model not found"}"#).unwrap();
        assert!(matches!(item, Err(Error::Generation(msg)) if msg == "model not found"));
    }
}
