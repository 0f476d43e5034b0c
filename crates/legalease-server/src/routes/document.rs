//! Document routes: upload, metadata, preview.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::get;
use axum::{Json, Router};
use legalease_ingest::{load_upload, Preview};
use tracing::{info, warn};

use super::{run_blocking, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/document", get(get_document).post(upload_document))
        .route("/document/preview", get(get_preview))
}

/// POST /api/document: multipart upload, field `file`.
///
/// Unsupported types are not an error: the current document is kept and
/// the response says `loaded: false`.
async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("document").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        upload = Some((filename, content_type, bytes.to_vec()));
        break;
    }

    let Some((filename, content_type, bytes)) = upload else {
        return Err(ApiError::bad_request("Missing multipart field 'file'"));
    };

    let _turn = state.begin_action().await;
    let name = filename.clone();
    let loaded = run_blocking(move || load_upload(&name, content_type.as_deref(), bytes)).await?;

    match loaded {
        Some(document) => {
            let info = document.metadata();
            info!(
                "Loaded {} ({} chars, {:?} pages)",
                info.filename, info.chars, info.pages
            );
            state.replace_document(document);
            Ok(Json(serde_json::json!({
                "loaded": true,
                "document": info,
            })))
        }
        None => {
            warn!("Ignored upload {}: unsupported file type", filename);
            Ok(Json(serde_json::json!({
                "loaded": false,
                "filename": filename,
            })))
        }
    }
}

/// GET /api/document
async fn get_document(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let document = state.current_document()?;
    Ok(Json(serde_json::json!({ "document": document.metadata() })))
}

/// GET /api/document/preview
async fn get_preview(State(state): State<Arc<AppState>>) -> Result<Json<Preview>, ApiError> {
    let document = state.current_document()?;
    Ok(Json(document.preview()))
}
