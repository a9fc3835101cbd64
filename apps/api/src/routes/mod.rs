pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assistant::handlers as assistant;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Match API
        .route("/api/v1/match", post(matching::handle_match_one))
        .route("/api/v1/match/batch", post(matching::handle_match_all))
        // Assistant API
        .route("/api/v1/chat", post(assistant::handle_chat))
        .route(
            "/api/v1/chat/:id/history",
            get(assistant::handle_get_history).delete(assistant::handle_clear_history),
        )
        .with_state(state)
}
