use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::chat::{AssistantResult, ConversationTurn};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Omitted or blank starts a new conversation.
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub conversation_id: String,
    #[serde(flatten)]
    pub result: AssistantResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub turns: Vec<ConversationTurn>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let conversation_id = conversation_id_or_new(req.conversation_id);
    let result = state.assistant.chat(&conversation_id, &req.message).await?;
    Ok(Json(ChatResponse {
        conversation_id,
        result,
    }))
}

/// GET /api/v1/chat/:id/history
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Json<HistoryResponse> {
    let turns = state.memory.get(&conversation_id);
    Json(HistoryResponse {
        conversation_id,
        turns,
    })
}

/// DELETE /api/v1/chat/:id/history
pub async fn handle_clear_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> StatusCode {
    state.memory.clear(&conversation_id);
    StatusCode::NO_CONTENT
}

fn conversation_id_or_new(requested: Option<String>) -> String {
    match requested {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}
