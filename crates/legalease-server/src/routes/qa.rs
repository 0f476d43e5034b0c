//! Question answering routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use legalease_analyze::QaHistoryEntry;
use serde::Deserialize;

use super::{run_blocking, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/qa", post(ask))
        .route("/qa/history", get(get_history))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// POST /api/qa: best answer over all chunks, appended to the history.
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<QaHistoryEntry>, ApiError> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::bad_request("Question must not be empty"));
    }
    let _turn = state.begin_action().await;
    let document = state.current_document()?;

    let worker = state.clone();
    let entry = run_blocking(move || {
        let best = worker.analyzer.answer(&document, &question)?;
        Ok(QaHistoryEntry::new(question, best))
    })
    .await?;

    state.append_history(entry.clone());
    Ok(Json(entry))
}

/// GET /api/qa/history: entries in the order they were asked.
async fn get_history(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let history = state.history();
    Json(serde_json::json!({
        "total": history.len(),
        "history": history,
    }))
}
