//! Session endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::server::state::AppState;
use crate::types::ConversationTurn;

/// GET /api/v1/sessions/:id - the session's recorded turns
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConversationTurn>>, StatusCode> {
    let memory = state.sessions().get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let turns = memory.lock().turns().to_vec();
    Ok(Json(turns))
}

/// Query parameters for DELETE /api/v1/sessions/:id
#[derive(Debug, Default, Deserialize)]
pub struct ResetParams {
    /// Drop the session entirely instead of clearing its turns
    #[serde(default)]
    pub remove: bool,
}

/// DELETE /api/v1/sessions/:id - clear the session's memory
///
/// With `?remove=true` the session itself is dropped from the store.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ResetParams>,
) -> StatusCode {
    let found = if params.remove {
        state.sessions().remove(&id)
    } else {
        state.sessions().reset(&id)
    };

    if found {
        tracing::info!(
            "{} session {}",
            if params.remove { "Removed" } else { "Cleared" },
            id
        );
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
