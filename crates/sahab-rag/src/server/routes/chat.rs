//! Chat endpoints: raw fragment stream, SSE and synchronous JSON

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;

use crate::generation::FragmentStream;
use crate::pipeline::{initializing_stream, INITIALIZING_MESSAGE};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// Fragments for a request, or the initializing notice before ready
async fn fragments_for(state: &AppState, request: &ChatRequest) -> FragmentStream {
    match state.service() {
        Some(service) => {
            let memory = state.memory_for(request);
            service.answer_stream(request, memory).await.fragments
        }
        None => {
            tracing::info!("Chat request before initialization finished");
            initializing_stream()
        }
    }
}

/// POST /api/v1/chat - stream the answer as plain text fragments
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    tracing::info!("Chat: \"{}\" ({})", request.prompt, request.language);

    let fragments = fragments_for(&state, &request).await;
    let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

/// POST /api/v1/chat/sse - stream the answer as server-sent events
pub async fn chat_sse(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("Chat (SSE): \"{}\" ({})", request.prompt, request.language);

    let fragments = fragments_for(&state, &request).await;
    Sse::new(fragments.map(|fragment| Ok(sse_event(&fragment))))
        .keep_alive(KeepAlive::default())
}

/// One SSE event per fragment
///
/// Event data may not carry carriage returns, so CRLF and lone CR line
/// endings from the model or translator become `\n`.
fn sse_event(fragment: &str) -> Event {
    Event::default().data(fragment.replace("\r\n", "\n").replace('\r', "\n"))
}

/// POST /api/v1/chat/sync - wait for the whole answer
pub async fn chat_sync(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    tracing::info!("Chat (sync): \"{}\" ({})", request.prompt, request.language);

    let response = match state.service() {
        Some(service) => {
            let memory = state.memory_for(&request);
            service.answer(&request, memory).await
        }
        None => ChatResponse {
            answer: INITIALIZING_MESSAGE.to_string(),
            language: request.language.clone(),
            sources: None,
        },
    };

    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_event_normalises_carriage_returns() {
        // Event::data panics on a raw carriage return
        let _ = sse_event("- Section 302\r\n- death\rimprisonment");
        let _ = sse_event("\r");
    }
}
