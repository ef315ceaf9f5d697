//! Liveness check.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /health: service status and loaded models.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let models = state.orchestrator.models().summary();
    let stored = state.store.count_complaints().ok();

    Json(serde_json::json!({
        "status": "active",
        "models": models,
        "persistResults": state.config.persist_results,
        "storedComplaints": stored,
    }))
}
