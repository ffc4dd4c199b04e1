//! REST endpoints for service health and conversation state.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::session::{ConversationId, ConversationStore, Snapshot};

/// Shared state for the status routes.
#[derive(Clone)]
pub struct StatusRouteState {
    pub store: Arc<ConversationStore>,
}

/// GET /api/health
async fn health(State(state): State<StatusRouteState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "conversations": state.store.len().await,
    }))
}

/// GET /api/sessions/{id}
///
/// Returns the conversation's state, 404 if it has never been seen, or 409
/// while a message for it is being handled. Looking a conversation up never
/// creates it.
async fn get_session(
    State(state): State<StatusRouteState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.try_snapshot(&ConversationId::new(id)).await {
        Snapshot::Ready(session) => Json(session).into_response(),
        Snapshot::Unknown => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Unknown conversation"})),
        )
            .into_response(),
        Snapshot::Busy => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "Conversation is busy, retry shortly"})),
        )
            .into_response(),
    }
}

/// Build the status REST routes.
pub fn status_routes(store: Arc<ConversationStore>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions/{id}", get(get_session))
        .with_state(StatusRouteState { store })
}
