//! Streaming generation
//!
//! A spawned task drives the provider stream and forwards each fragment
//! through a bounded channel, so the caller consumes fragments in order as
//! they are produced. When the stream ends the task reports a
//! [`GenerationOutcome`] carrying exactly the text that was delivered.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::config::LlmConfig;
use crate::providers::LlmProvider;

/// Incremental answer text; the full answer is the concatenation
pub type FragmentStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Prefix of the single fragment emitted when generation fails
pub const GENERATION_ERROR_PREFIX: &str = "Error generating response: ";

/// Lifecycle of one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// Nothing requested yet
    Idle,
    /// Request sent, no fragment yet
    Requesting,
    /// At least one fragment delivered
    Streaming,
    /// Provider finished the answer
    Completed,
    /// Provider failed or timed out
    Failed,
    /// Caller cancelled or went away
    Cancelled,
}

/// How a generation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The provider finished; `answer` is every delivered fragment
    Completed { answer: String },
    /// The provider failed after delivering `partial`
    Failed { partial: String, error: String },
    /// Stopped before the provider finished
    Cancelled { partial: String },
}

impl GenerationOutcome {
    /// Model text actually delivered to the caller (never the error fragment)
    pub fn delivered_text(&self) -> &str {
        match self {
            Self::Completed { answer } => answer,
            Self::Failed { partial, .. } | Self::Cancelled { partial } => partial,
        }
    }

    /// Whether the provider finished normally
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// State machine and accumulator for one generation
#[derive(Debug)]
pub struct GenerationRun {
    state: GenerationState,
    delivered: String,
}

impl Default for GenerationRun {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationRun {
    /// A run in `Idle`
    pub fn new() -> Self {
        Self {
            state: GenerationState::Idle,
            delivered: String::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Text delivered so far
    pub fn delivered(&self) -> &str {
        &self.delivered
    }

    /// `Idle -> Requesting`
    pub fn begin(&mut self) {
        if self.state == GenerationState::Idle {
            self.transition(GenerationState::Requesting);
        }
    }

    /// Record a delivered fragment (`Requesting | Streaming -> Streaming`)
    pub fn on_fragment(&mut self, fragment: &str) {
        if self.state == GenerationState::Requesting {
            self.transition(GenerationState::Streaming);
        }
        self.delivered.push_str(fragment);
    }

    /// Provider end-of-stream
    pub fn complete(mut self) -> GenerationOutcome {
        self.transition(GenerationState::Completed);
        GenerationOutcome::Completed {
            answer: self.delivered,
        }
    }

    /// Provider error or timeout
    pub fn fail(mut self, error: impl Into<String>) -> GenerationOutcome {
        self.transition(GenerationState::Failed);
        GenerationOutcome::Failed {
            partial: self.delivered,
            error: error.into(),
        }
    }

    /// Cancellation or caller disconnect
    pub fn cancel(mut self) -> GenerationOutcome {
        self.transition(GenerationState::Cancelled);
        GenerationOutcome::Cancelled {
            partial: self.delivered,
        }
    }

    fn transition(&mut self, next: GenerationState) {
        tracing::debug!("Generation {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// A running generation: its fragments, its outcome, and a cancel handle
pub struct GenerationStream {
    /// Fragments in production order
    pub fragments: FragmentStream,
    /// Resolves once the generation has ended
    pub outcome: oneshot::Receiver<GenerationOutcome>,
    cancel: CancellationToken,
}

impl GenerationStream {
    /// Stop consuming the provider; the outcome becomes `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this generation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Invokes a generative model in streaming mode
#[derive(Clone)]
pub struct GenerationStreamer {
    llm: Arc<dyn LlmProvider>,
    connect_timeout: Duration,
    idle_timeout: Duration,
    buffer: usize,
}

impl GenerationStreamer {
    /// Create a streamer using the configured waits
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            llm,
            connect_timeout: Duration::from_secs(config.timeout_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            buffer: config.stream_buffer.max(1),
        }
    }

    /// Override the connect and per-fragment waits
    pub fn with_timeouts(mut self, connect: Duration, idle: Duration) -> Self {
        self.connect_timeout = connect;
        self.idle_timeout = idle;
        self
    }

    /// The provider in use
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Start generating an answer for `prompt`
    pub fn stream(&self, prompt: String) -> GenerationStream {
        self.stream_with_cancel(prompt, CancellationToken::new())
    }

    /// Start generating, stopping when `cancel` fires
    pub fn stream_with_cancel(&self, prompt: String, cancel: CancellationToken) -> GenerationStream {
        let (tx, rx) = mpsc::channel(self.buffer);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let driver = Driver {
            llm: Arc::clone(&self.llm),
            connect_timeout: self.connect_timeout,
            idle_timeout: self.idle_timeout,
            cancel: cancel.clone(),
            tx,
        };

        tokio::spawn(async move {
            let outcome = driver.run(prompt).await;
            match &outcome {
                GenerationOutcome::Completed { answer } => {
                    tracing::info!("Generation completed ({} characters)", answer.len())
                }
                GenerationOutcome::Failed { error, .. } => {
                    tracing::warn!("Generation failed: {}", error)
                }
                GenerationOutcome::Cancelled { partial } => {
                    tracing::info!("Generation cancelled after {} characters", partial.len())
                }
            }
            let _ = outcome_tx.send(outcome);
        });

        GenerationStream {
            fragments: Box::pin(ReceiverStream::new(rx)),
            outcome: outcome_rx,
            cancel,
        }
    }
}

struct Driver {
    llm: Arc<dyn LlmProvider>,
    connect_timeout: Duration,
    idle_timeout: Duration,
    cancel: CancellationToken,
    tx: mpsc::Sender<String>,
}

impl Driver {
    async fn run(self, prompt: String) -> GenerationOutcome {
        let mut run = GenerationRun::new();
        run.begin();

        let started = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return run.cancel(),
            _ = self.tx.closed() => return run.cancel(),
            started = timeout(self.connect_timeout, self.llm.generate_stream(&prompt)) => started,
        };

        let mut provider = match started {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return self.fail(run, e.to_string()).await,
            Err(_) => {
                let error = format!(
                    "timed out after {}s waiting for {}",
                    self.connect_timeout.as_secs_f32(),
                    self.llm.name()
                );
                return self.fail(run, error).await;
            }
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return run.cancel(),
                _ = self.tx.closed() => return run.cancel(),
                next = timeout(self.idle_timeout, provider.next()) => next,
            };

            match next {
                Ok(Some(Ok(fragment))) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    let sent = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => false,
                        sent = self.tx.send(fragment.clone()) => sent.is_ok(),
                    };
                    if !sent {
                        return run.cancel();
                    }
                    run.on_fragment(&fragment);
                }
                Ok(Some(Err(e))) => return self.fail(run, e.to_string()).await,
                Ok(None) => return run.complete(),
                Err(_) => {
                    let error = format!(
                        "timed out after {}s waiting for the next fragment",
                        self.idle_timeout.as_secs_f32()
                    );
                    return self.fail(run, error).await;
                }
            }
        }
    }

    /// Emit the single error fragment and end the stream
    async fn fail(&self, run: GenerationRun, error: String) -> GenerationOutcome {
        let _ = self
            .tx
            .send(format!("{}{}", GENERATION_ERROR_PREFIX, error))
            .await;
        run.fail(error)
    }
}
