//! The per-turn RAG pipeline
//!
//! question -> retrieve -> assemble prompt (with windowed history) ->
//! stream generation -> localize -> caller, recording both turns into the
//! session's memory.

use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{
    section_references, FragmentStream, GenerationOutcome, GenerationStreamer, Localizer,
    PromptAssembler,
};
use crate::memory::SharedMemory;
use crate::providers::{
    embedder_from_config, llm_from_config, translator_from_config, EmbeddingProvider,
    LlmProvider, Translator,
};
use crate::retrieval::{open_or_build, Retriever, VectorIndex};
use crate::types::{ChatRequest, ChatResponse, ConversationTurn};

/// Single fragment answered while the index is still loading
pub const INITIALIZING_MESSAGE: &str = "System is initializing, please try again in a moment.";

/// One answer in flight
pub struct ChatStream {
    /// Answer fragments, localized into the requested language
    pub fragments: FragmentStream,
    /// Statute sections found in the retrieved context
    pub sources: Vec<String>,
    /// Finishes once the assistant turn has been recorded
    pub recorded: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ChatStream {
    /// Stop generating; whatever was already delivered is recorded
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Retrieval-augmented answering over the statute index
pub struct RagService {
    retriever: Retriever,
    assembler: PromptAssembler,
    streamer: GenerationStreamer,
    localizer: Localizer,
    history_window: usize,
}

impl RagService {
    /// Build providers from configuration and load (or build) the index
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        let embedder = embedder_from_config(&config.embeddings)?;
        let llm = llm_from_config(&config.llm)?;
        let translator = translator_from_config(&config.translation)?;

        let index = open_or_build(config, embedder.as_ref()).await?;
        Ok(Self::from_parts(
            config,
            Arc::new(index),
            embedder,
            llm,
            translator,
        ))
    }

    /// Assemble a service from an index and providers
    pub fn from_parts(
        config: &RagConfig,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            retriever: Retriever::new(index, embedder, &config.retrieval),
            assembler: PromptAssembler::new().closed_book(config.retrieval.closed_book),
            streamer: GenerationStreamer::new(llm, &config.llm),
            localizer: Localizer::new(translator, config.translation.default_language.clone()),
            history_window: config.memory.history_window,
        }
    }

    /// Override the streamer (timeouts, buffer)
    pub fn with_streamer(mut self, streamer: GenerationStreamer) -> Self {
        self.streamer = streamer;
        self
    }

    /// The retriever in use
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer one turn as a fragment stream
    pub async fn answer_stream(&self, request: &ChatRequest, memory: SharedMemory) -> ChatStream {
        let history = {
            let mut memory = memory.lock();
            let history = memory.window(self.history_window);
            memory.append(ConversationTurn::user(request.prompt.clone()));
            history
        };

        let retrieved = self.retriever.retrieve(&request.prompt).await;
        let passages = retrieved.passages();
        let sources = section_references(&passages);

        tracing::info!(
            "Answering with {} passages, {} history turns, language {}",
            passages.len(),
            history.len(),
            request.language
        );

        let generation_request = self.assembler.assemble(&request.prompt, &passages, &history);
        let prompt = self.assembler.render(&generation_request);

        let cancel = CancellationToken::new();
        let generation = self.streamer.stream_with_cancel(prompt, cancel.clone());
        let outcome = generation.outcome;

        let recorded = tokio::spawn(async move {
            let Ok(outcome) = outcome.await else {
                tracing::warn!("Generation ended without reporting an outcome");
                return;
            };
            let delivered = outcome.delivered_text();
            if !delivered.is_empty() {
                memory.lock().append(ConversationTurn::assistant(delivered));
            }
            if let GenerationOutcome::Failed { error, .. } = &outcome {
                tracing::debug!("Recorded partial answer after failure: {}", error);
            }
        });

        ChatStream {
            fragments: self.localizer.localize(generation.fragments, &request.language),
            sources,
            recorded,
            cancel,
        }
    }

    /// Answer one turn and wait for the whole (localized) answer
    pub async fn answer(&self, request: &ChatRequest, memory: SharedMemory) -> ChatResponse {
        let ChatStream {
            fragments,
            sources,
            recorded,
            ..
        } = self.answer_stream(request, memory).await;

        let answer = fragments.collect::<Vec<String>>().await.concat();
        if let Err(e) = recorded.await {
            tracing::warn!("Recording the assistant turn failed: {}", e);
        }

        ChatResponse {
            answer,
            language: request.language.clone(),
            sources: if sources.is_empty() {
                None
            } else {
                Some(sources)
            },
        }
    }
}

/// Fragment stream for requests arriving before the service is ready
pub fn initializing_stream() -> FragmentStream {
    Box::pin(futures::stream::once(async {
        INITIALIZING_MESSAGE.to_string()
    }))
}
