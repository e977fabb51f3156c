//! Capability providers for embeddings, generation and translation
//!
//! The pipeline only sees the traits; the concrete backends (Gemini, Ollama,
//! the offline hashing embedder, Google Translate) are chosen from
//! configuration at startup.

pub mod embedding;
pub mod gemini;
pub mod hashing;
pub mod line_decoder;
pub mod llm;
pub mod ollama;
pub mod retry;
pub mod translation;

use std::sync::Arc;

use crate::config::{
    EmbeddingBackend, EmbeddingConfig, LlmBackend, LlmConfig, TranslationBackend,
    TranslationConfig,
};
use crate::error::{Error, Result};

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder};
pub use hashing::HashingEmbedder;
pub use llm::{LlmProvider, ProviderStream};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use translation::{
    language_code, supported_languages, GoogleTranslator, NoopTranslator, Translator,
};

/// Build the configured embedding provider
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        EmbeddingBackend::Gemini => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                Error::config("Gemini embeddings selected but GOOGLE_API_KEY is not set")
            })?;
            Arc::new(GeminiEmbedder::new(api_key, config.model.clone(), config.dimensions)?)
        }
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.dimensions)),
    };

    tracing::info!(
        "Embedding provider: {} ({}, {} dimensions)",
        embedder.name(),
        embedder.model(),
        embedder.dimensions()
    );
    Ok(embedder)
}

/// Build the configured generative model provider
pub fn llm_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::Gemini => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                Error::config("Gemini generation selected but GOOGLE_API_KEY is not set")
            })?;
            Arc::new(GeminiClient::new(api_key, config)?)
        }
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(config)?),
    };

    tracing::info!("LLM provider: {} ({})", llm.name(), llm.model());
    Ok(llm)
}

/// Build the configured translator
pub fn translator_from_config(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match config.backend {
        TranslationBackend::Google => Arc::new(GoogleTranslator::new(config)?),
        TranslationBackend::Disabled => Arc::new(NoopTranslator),
    };

    tracing::info!("Translator: {}", translator.name());
    Ok(translator)
}
