//! GET /api/export/highlighted

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use legalease_export::HIGHLIGHTED_FILE_NAME;

use super::{pdf_response, run_blocking, ApiError};
use crate::actions::{highlight_history, HighlightOutcome, PDF_ONLY_INFO};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/export/highlighted", get(export_highlighted))
}

/// The uploaded PDF with every history answer highlighted, or an
/// `{"info": ...}` message when there is nothing to highlight. With no
/// document loaded there is no PDF either, so that is an info message too.
async fn export_highlighted(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let _turn = state.begin_action().await;
    let Ok(document) = state.current_document() else {
        return Ok(info_response(PDF_ONLY_INFO));
    };
    let history = state.session.read().history.clone();

    let outcome = run_blocking(move || highlight_history(&document, &history)).await?;
    match outcome {
        HighlightOutcome::Pdf { bytes, report } => {
            let mut response = pdf_response(HIGHLIGHTED_FILE_NAME, bytes);
            if let Ok(count) = HeaderValue::from_str(&report.annotations.to_string()) {
                response.headers_mut().insert("x-highlight-count", count);
            }
            Ok(response)
        }
        HighlightOutcome::Info(message) => Ok(info_response(message)),
    }
}

fn info_response(message: &str) -> Response {
    Json(serde_json::json!({ "info": message })).into_response()
}
