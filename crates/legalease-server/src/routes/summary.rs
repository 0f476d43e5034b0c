//! Summary routes: blocking JSON, SSE progress stream, PDF download.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use legalease_analyze::{Progress, SummaryResult};
use legalease_export::{render_summary_pdf, SUMMARY_FILE_NAME};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use super::{pdf_response, run_blocking, ApiError};
use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/summary", post(summarize))
        .route("/summary/stream", post(stream_summary))
        .route("/summary/pdf", get(summary_pdf))
}

/// Events sent on `/api/summary/stream`. The SSE event name is the tag.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SummaryEvent {
    Progress(Progress),
    Done { summary: String, chunks: usize },
    Error { error: String },
}

impl SummaryEvent {
    fn name(&self) -> &'static str {
        match self {
            SummaryEvent::Progress(_) => "progress",
            SummaryEvent::Done { .. } => "done",
            SummaryEvent::Error { .. } => "error",
        }
    }

    fn into_sse(self) -> Event {
        let data = serde_json::to_string(&self).unwrap_or_default();
        Event::default().event(self.name()).data(data)
    }
}

fn summary_json(summary: &SummaryResult) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "summary": summary.text,
        "chunks": summary.chunks,
    }))
}

/// POST /api/summary
async fn summarize(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let _turn = state.begin_action().await;
    let document = state.current_document()?;
    let worker = state.clone();
    let summary = run_blocking(move || {
        let summary = worker.analyzer.summarize(&document, |_| {})?;
        worker.store_summary(&document, summary.clone());
        Ok(summary)
    })
    .await?;
    Ok(summary_json(&summary))
}

/// POST /api/summary/stream: progress after each chunk, then the result.
///
/// The action turn is held by the worker until the last event is sent.
async fn stream_summary(State(state): State<Arc<AppState>>) -> Sse<SseStream> {
    let turn = state.begin_action().await;
    let document = match state.current_document() {
        Ok(document) => document,
        Err(e) => {
            let error = e.to_string();
            let error_stream: SseStream = Box::pin(async_stream::stream! {
                let event = SummaryEvent::Error { error };
                yield Ok::<_, Infallible>(event.into_sse());
            });
            return Sse::new(error_stream);
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let worker = state.clone();
    tokio::task::spawn_blocking(move || {
        let _turn = turn;
        let progress_tx = tx.clone();
        let result = worker.analyzer.summarize(&document, |progress| {
            let _ = progress_tx.send(SummaryEvent::Progress(progress));
        });
        let event = match result {
            Ok(summary) => {
                let event = SummaryEvent::Done {
                    summary: summary.text.clone(),
                    chunks: summary.chunks,
                };
                worker.store_summary(&document, summary);
                event
            }
            Err(e) => {
                tracing::warn!("Summary of {} failed: {}", document.filename, e);
                SummaryEvent::Error {
                    error: e.to_string(),
                }
            }
        };
        let _ = tx.send(event);
    });

    let sse_stream: SseStream =
        Box::pin(UnboundedReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(event.into_sse())));
    Sse::new(sse_stream)
}

/// GET /api/summary/pdf: the last summary as `summary.pdf`.
async fn summary_pdf(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let _turn = state.begin_action().await;
    state.current_document()?;
    let Some(summary) = state.last_summary() else {
        return Err(ApiError::conflict("No summary generated yet"));
    };
    let bytes = run_blocking(move || render_summary_pdf(&summary.text)).await?;
    Ok(pdf_response(SUMMARY_FILE_NAME, bytes))
}
