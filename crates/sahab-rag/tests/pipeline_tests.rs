//! End-to-end pipeline tests with scripted providers

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use sahab_rag::config::{ChunkingConfig, RagConfig};
use sahab_rag::generation::GENERATION_ERROR_PREFIX;
use sahab_rag::memory::SharedMemory;
use sahab_rag::providers::{HashingEmbedder, LlmProvider, ProviderStream, Translator};
use sahab_rag::retrieval::VectorIndex;
use sahab_rag::server::{state::AppState, RagServer};
use sahab_rag::{
    ChatRequest, ConversationMemory, ConversationTurn, Error, RagService, Result, Role,
};

const DIMENSIONS: usize = 256;

/// Replays fixed fragments and remembers every prompt it was sent
struct ScriptedLlm {
    fragments: Vec<&'static str>,
    fail_with: Option<&'static str>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn answering(fragments: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fragments,
            fail_with: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing_after(fragments: Vec<&'static str>, error: &'static str) -> Arc<Self> {
        Arc::new(Self {
            fragments,
            fail_with: Some(error),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate_stream(&self, prompt: &str) -> Result<ProviderStream> {
        self.prompts.lock().push(prompt.to_string());
        let mut items: Vec<Result<String>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        if let Some(error) = self.fail_with {
            items.push(Err(Error::generation(error)));
        }
        Ok(Box::pin(stream::iter(items)))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "script-1"
    }
}

/// Sends one fragment and then never finishes
struct StallingLlm;

#[async_trait]
impl LlmProvider for StallingLlm {
    async fn generate_stream(&self, _prompt: &str) -> Result<ProviderStream> {
        let first = stream::iter(vec![Ok("- Section 302 ".to_string())]);
        Ok(Box::pin(first.chain(stream::pending())))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "stalling"
    }

    fn model(&self) -> &str {
        "stall-1"
    }
}

/// Marks text as translated and counts calls
struct TaggingTranslator {
    calls: Mutex<Vec<String>>,
}

impl TaggingTranslator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        self.calls.lock().push(target.to_string());
        Ok(format!("({}) {}", target, text))
    }

    fn name(&self) -> &str {
        "tagging"
    }
}

fn config() -> RagConfig {
    let mut config = RagConfig::default();
    config.embeddings.dimensions = DIMENSIONS;
    config.memory.history_window = 2;
    config
}

async fn service(
    passages: &[&str],
    llm: Arc<dyn LlmProvider>,
    translator: Arc<TaggingTranslator>,
) -> RagService {
    let config = config();
    let embedder = Arc::new(HashingEmbedder::new(DIMENSIONS));
    let index = VectorIndex::build(
        passages.iter().map(|p| p.to_string()).collect(),
        embedder.as_ref(),
        &ChunkingConfig::default(),
        8,
    )
    .await
    .unwrap();

    RagService::from_parts(&config, Arc::new(index), embedder, llm, translator)
}

fn memory() -> SharedMemory {
    Arc::new(Mutex::new(ConversationMemory::new()))
}

#[tokio::test]
async fn test_murder_question_grounded_in_section_302() {
    let llm = ScriptedLlm::answering(vec!["- Section 302 ", "prescribes death ", "or life imprisonment."]);
    let service = service(
        &["Section 302: punishment for murder."],
        llm.clone(),
        TaggingTranslator::new(),
    )
    .await;
    let memory = memory();

    let chat = service
        .answer_stream(&ChatRequest::new("What is the punishment for murder?"), memory.clone())
        .await;
    assert_eq!(chat.sources, vec!["Section 302"]);

    let answer: String = chat.fragments.collect::<Vec<_>>().await.concat();
    chat.recorded.await.unwrap();

    assert_eq!(answer, "- Section 302 prescribes death or life imprisonment.");
    assert!(llm
        .last_prompt()
        .contains("CONTEXT:\nSection 302: punishment for murder.\n"));

    let memory = memory.lock();
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.turns()[0], ConversationTurn::user("What is the punishment for murder?"));
    assert_eq!(memory.turns()[1].role, Role::Assistant);
    assert_eq!(memory.turns()[1].content, answer);
}

#[tokio::test]
async fn test_bail_question_uses_fallback_policy() {
    let llm = ScriptedLlm::answering(vec!["- Bail is governed by the CrPC."]);
    let service = service(
        &["Section 302: punishment for murder."],
        llm.clone(),
        TaggingTranslator::new(),
    )
    .await;

    let response = service
        .answer(&ChatRequest::new("What are the conditions for bail?"), memory())
        .await;

    let prompt = llm.last_prompt();
    assert!(prompt.contains("Do NOT mention that the information is missing"));
    assert!(prompt.contains("QUESTION: What are the conditions for bail?"));
    assert!(!response.answer.to_lowercase().contains("not found"));
}

#[tokio::test]
async fn test_hindi_answer_is_translated_once() {
    let llm = ScriptedLlm::answering(vec!["- Section 302 ", "applies."]);
    let translator = TaggingTranslator::new();
    let service = service(
        &["Section 302: punishment for murder."],
        llm,
        translator.clone(),
    )
    .await;
    let memory = memory();

    let request = ChatRequest::new("Punishment for murder?").with_language("Hindi");
    let chat = service.answer_stream(&request, memory.clone()).await;
    let fragments: Vec<String> = chat.fragments.collect().await;
    chat.recorded.await.unwrap();

    assert_eq!(fragments.concat(), "(hi) - Section 302 applies.");
    assert_eq!(fragments.len(), 5);
    assert_eq!(*translator.calls.lock(), vec!["hi".to_string()]);

    // Memory keeps the model's own wording
    assert_eq!(memory.lock().turns()[1].content, "- Section 302 applies.");
}

#[tokio::test]
async fn test_english_answer_is_not_translated() {
    let translator = TaggingTranslator::new();
    let service = service(
        &["Section 302"],
        ScriptedLlm::answering(vec!["a ", "b"]),
        translator.clone(),
    )
    .await;

    let response = service
        .answer(&ChatRequest::new("q").with_language("english"), memory())
        .await;
    assert_eq!(response.answer, "a b");
    assert!(translator.calls.lock().is_empty());
}

#[tokio::test]
async fn test_generation_failure_keeps_partial_out_of_error() {
    let llm = ScriptedLlm::failing_after(vec!["- Section 302 "], "stream reset");
    let service = service(&["Section 302"], llm, TaggingTranslator::new()).await;
    let memory = memory();

    let chat = service
        .answer_stream(&ChatRequest::new("Murder?"), memory.clone())
        .await;
    let fragments: Vec<String> = chat.fragments.collect().await;
    chat.recorded.await.unwrap();

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], "- Section 302 ");
    assert!(fragments[1].starts_with(GENERATION_ERROR_PREFIX));

    let memory = memory.lock();
    assert_eq!(memory.turns()[1].content, "- Section 302 ");
}

#[tokio::test]
async fn test_history_window_excludes_current_question() {
    let llm = ScriptedLlm::answering(vec!["ok"]);
    let service = service(&["Section 302"], llm.clone(), TaggingTranslator::new()).await;
    let memory = memory();

    for question in ["first question", "second question", "third question"] {
        service
            .answer(&ChatRequest::new(question), memory.clone())
            .await;
    }

    let prompt = llm.last_prompt();
    let history = prompt
        .split("CHAT HISTORY:\n")
        .nth(1)
        .and_then(|rest| rest.split("\n\nQUESTION:").next())
        .unwrap();
    assert_eq!(history, "User: second question\nAssistant: ok");
    assert_eq!(memory.lock().len(), 6);
}

#[tokio::test]
async fn test_http_sync_chat_records_session() {
    let config = config();
    let service = service(
        &["Section 302: punishment for murder."],
        ScriptedLlm::answering(vec!["- Section 302 applies."]),
        TaggingTranslator::new(),
    )
    .await;
    let state = AppState::with_service(config.clone(), service);
    let router = RagServer::with_state(config, state.clone()).router();
    let session = Uuid::new_v4();

    let body = serde_json::json!({
        "prompt": "What is the punishment for murder?",
        "session_id": session,
    });
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/chat/sync")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["answer"], "- Section 302 applies.");
    assert_eq!(json["sources"][0], "Section 302");

    let turns = state.sessions().get(&session).unwrap().lock().len();
    assert_eq!(turns, 2);

    let ready = router
        .clone()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let reset = router
        .oneshot(
            Request::delete(format!("/api/v1/sessions/{}", session).as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(reset.status(), StatusCode::NO_CONTENT);
    assert!(state.sessions().get(&session).unwrap().lock().is_empty());
}

#[tokio::test]
async fn test_http_stream_chat_returns_fragments() {
    let config = config();
    let service = service(
        &["Section 302"],
        ScriptedLlm::answering(vec!["- one ", "- two"]),
        TaggingTranslator::new(),
    )
    .await;
    let router = RagServer::with_state(config.clone(), AppState::with_service(config, service)).router();

    let response = router
        .oneshot(
            Request::post("/api/v1/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"prompt":"q","language":"English","history":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes, "- one - two");
}

#[tokio::test]
async fn test_cancelled_chat_records_partial_answer() {
    let service = service(&["Section 302"], Arc::new(StallingLlm), TaggingTranslator::new()).await;
    let memory = memory();

    let mut chat = service
        .answer_stream(&ChatRequest::new("Murder?"), memory.clone())
        .await;
    assert_eq!(chat.fragments.next().await.unwrap(), "- Section 302 ");

    chat.cancel();
    let rest: Vec<String> = chat.fragments.collect().await;
    assert!(rest.is_empty());
    chat.recorded.await.unwrap();

    let memory = memory.lock();
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.turns()[1].content, "- Section 302 ");
}

#[tokio::test]
async fn test_http_sse_chat_survives_carriage_returns() {
    let config = config();
    let service = service(
        &["Section 302"],
        ScriptedLlm::answering(vec!["- Section 302\r\n", "- death"]),
        TaggingTranslator::new(),
    )
    .await;
    let router = RagServer::with_state(config.clone(), AppState::with_service(config, service)).router();

    let response = router
        .oneshot(
            Request::post("/api/v1/chat/sse")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"prompt":"Murder?"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!body.contains('\r'));
    assert!(body.contains("data: - Section 302\n"));
    assert!(body.contains("data: - death\n"));
}

#[tokio::test]
async fn test_http_session_removal_drops_entry() {
    let config = config();
    let service = service(
        &["Section 302"],
        ScriptedLlm::answering(vec!["ok"]),
        TaggingTranslator::new(),
    )
    .await;
    let state = AppState::with_service(config.clone(), service);
    let router = RagServer::with_state(config, state.clone()).router();
    let session = Uuid::new_v4();
    state.sessions().get_or_create(session, &[]);

    let delete = |uri: String| {
        let router = router.clone();
        async move {
            router
                .oneshot(Request::delete(uri.as_str()).body(Body::empty()).unwrap())
                .await
                .unwrap()
                .status()
        }
    };

    let uri = format!("/api/v1/sessions/{}?remove=true", session);
    assert_eq!(delete(uri.clone()).await, StatusCode::NO_CONTENT);
    assert!(state.sessions().get(&session).is_none());
    assert!(state.sessions().is_empty());
    assert_eq!(delete(uri).await, StatusCode::NOT_FOUND);
}
