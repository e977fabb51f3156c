//! API routes for the SAHAB server

pub mod chat;
pub mod sessions;

use axum::{
    routing::{get, post},
    Json, Router,
};

use crate::providers::translation::supported_languages;
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Chat
        .route("/chat", post(chat::chat))
        .route("/chat/sse", post(chat::chat_sse))
        .route("/chat/sync", post(chat::chat_sync))
        // Sessions
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::reset_session),
        )
        // Info
        .route("/languages", get(languages))
        .route("/info", get(info))
}

/// Output languages offered to users
async fn languages() -> Json<Vec<String>> {
    Json(supported_languages())
}

/// API info endpoint
async fn info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "sahab-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Legal question answering grounded in statute text",
        "endpoints": {
            "POST /api/v1/chat": "Stream an answer as plain text fragments",
            "POST /api/v1/chat/sse": "Stream an answer as server-sent events",
            "POST /api/v1/chat/sync": "Answer with the full text and cited sections",
            "GET /api/v1/sessions/:id": "Turns recorded for a session",
            "DELETE /api/v1/sessions/:id": "Clear a session's memory (?remove=true drops it)",
            "GET /api/v1/languages": "Supported output languages"
        }
    }))
}
