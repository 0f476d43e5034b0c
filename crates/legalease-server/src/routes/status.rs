//! GET /api/status

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let backends = state.analyzer.backends();
    let chunking = state.analyzer.chunker().config();
    let session = state.session.read();

    Json(serde_json::json!({
        "summarizer": backends.summarizer.is_available(),
        "qa": backends.qa.is_available(),
        "documentLoaded": session.document.is_some(),
        "document": session.document.as_ref().map(|d| d.filename.clone()),
        "historySize": session.history.len(),
        "hasSummary": session.last_summary.is_some(),
        "chunking": {
            "chunkSize": chunking.chunk_size,
            "overlap": chunking.overlap,
        },
    }))
}
