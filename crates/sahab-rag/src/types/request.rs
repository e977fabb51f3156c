//! Inbound chat requests, outbound responses and the per-query generation request

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::{ChatMessage, ConversationTurn};

/// Chat request from the UI/API boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The legal question
    pub prompt: String,

    /// Output language (default: "English")
    #[serde(default = "default_language")]
    pub language: String,

    /// Prior messages, used when no server-side session is named
    #[serde(default)]
    pub history: Vec<ChatMessage>,

    /// Server-side session whose memory should be used and updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

fn default_language() -> String {
    "English".to_string()
}

impl ChatRequest {
    /// Create a request in the default language with no history
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            language: default_language(),
            history: Vec::new(),
            session_id: None,
        }
    }

    /// Set the output language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Attach prior messages
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Bind to a server-side session
    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Synchronous chat answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Full (possibly translated) answer
    pub answer: String,
    /// Language of `answer`
    pub language: String,
    /// Statute sections found in the retrieved context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

/// Everything the generator needs for one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Retrieved passages joined by the context separator
    pub context: String,
    /// Windowed conversation history, oldest first
    pub history: Vec<ConversationTurn>,
    /// The user's question
    pub question: String,
}
