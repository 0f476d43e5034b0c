//! Router tests: drive the API end to end with in-process model backends.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use legalease_core::{LegalEaseConfig, Result, SummaryLength};
use legalease_infer::{ModelBackends, QaPrediction, QuestionAnswerer, Summarizer};
use legalease_server::{build_router, AppState};
use tower::ServiceExt;

/// Summarizes a chunk as its character count.
struct ChunkLength;

impl Summarizer for ChunkLength {
    fn summarize(&self, text: &str, _length: SummaryLength) -> Result<String> {
        Ok(format!("[{}]", text.chars().count()))
    }
}

/// Answers with the word after "rent is".
struct RentQa;

impl QuestionAnswerer for RentQa {
    fn answer(&self, _question: &str, context: &str) -> Result<QaPrediction> {
        let Some(pos) = context.find("rent is ") else {
            return Ok(QaPrediction {
                answer: String::new(),
                score: 0.0,
                span: 0..0,
            });
        };
        let start = pos + "rent is ".len();
        let end = context[start..]
            .find(char::is_whitespace)
            .map_or(context.len(), |i| start + i);
        Ok(QaPrediction {
            answer: context[start..end].to_string(),
            score: 0.75,
            span: start..end,
        })
    }
}

/// Takes its time over any question mentioning "first".
struct SlowFirstQa;

impl QuestionAnswerer for SlowFirstQa {
    fn answer(&self, question: &str, context: &str) -> Result<QaPrediction> {
        if question.contains("first") {
            std::thread::sleep(std::time::Duration::from_millis(300));
        }
        RentQa.answer(question, context)
    }
}

struct TestApp {
    router: Router,
    _dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_qa(Arc::new(RentQa))
    }

    fn with_qa(qa: Arc<dyn QuestionAnswerer>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = LegalEaseConfig::from_env(dir.path()).unwrap();
        let backends = ModelBackends {
            summarizer: Arc::new(ChunkLength),
            qa,
        };
        let state = Arc::new(AppState::new(config, backends).unwrap());
        Self {
            router: build_router(state),
            _dir: dir,
        }
    }

    async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, json: serde_json::Value) -> Response {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn upload(&self, filename: &str, content_type: &str, bytes: &[u8]) -> Response {
        let boundary = "legalease-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        self.send(
            Request::post("/api/document")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

async fn body_bytes(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn lease_text() -> String {
    let mut text = "Standard clause. ".repeat(60);
    text.push_str("The monthly rent is 1200 dollars payable in advance.");
    text
}

#[tokio::test]
async fn test_status_before_upload() {
    let app = TestApp::new();
    let resp = app.get("/api/status").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["documentLoaded"], false);
    assert_eq!(json["historySize"], 0);
    assert_eq!(json["summarizer"], true);
    assert_eq!(json["chunking"]["chunkSize"], 800);
    assert_eq!(json["chunking"]["overlap"], 100);
}

#[tokio::test]
async fn test_actions_need_a_document() {
    let app = TestApp::new();
    assert_eq!(app.get("/api/document").await.status(), StatusCode::CONFLICT);

    let resp = app.post_json("/api/summary", serde_json::json!({})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["error"], "No document loaded");

    let resp = app
        .post_json("/api/qa", serde_json::json!({ "question": "What is the rent?" }))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_upload_text_and_preview() {
    let app = TestApp::new();
    let resp = app.upload("lease.txt", "text/plain", lease_text().as_bytes()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["loaded"], true);
    assert_eq!(json["document"]["filename"], "lease.txt");
    assert_eq!(json["document"]["chars"], lease_text().chars().count());

    let preview = body_json(app.get("/api/document/preview").await).await;
    assert_eq!(preview["kind"], "text");
    assert_eq!(preview["truncated"], false);
    assert_eq!(preview["text"], lease_text());
}

#[tokio::test]
async fn test_unsupported_upload_is_ignored() {
    let app = TestApp::new();
    app.upload("lease.txt", "text/plain", b"Original terms.").await;

    let resp = app
        .upload(
            "lease.docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            b"PK\x03\x04",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["loaded"], false);

    let current = body_json(app.get("/api/document").await).await;
    assert_eq!(current["document"]["filename"], "lease.txt");
}

#[tokio::test]
async fn test_summary_then_pdf() {
    let app = TestApp::new();
    let resp = app.get("/api/summary/pdf").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let text = "The cat sat. ".repeat(100);
    app.upload("notes.txt", "text/plain", text.as_bytes()).await;

    let resp = app.get("/api/summary/pdf").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = app.post_json("/api/summary", serde_json::json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["summary"], "[800] [600] ");
    assert_eq!(json["chunks"], 2);

    let resp = app.get("/api/summary/pdf").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    assert!(resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("summary.pdf"));
    assert!(body_bytes(resp).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_new_upload_clears_summary() {
    let app = TestApp::new();
    app.upload("a.txt", "text/plain", b"First document.").await;
    app.post_json("/api/summary", serde_json::json!({})).await;
    assert_eq!(app.get("/api/summary/pdf").await.status(), StatusCode::OK);

    app.upload("b.txt", "text/plain", b"Second document.").await;
    assert_eq!(app.get("/api/summary/pdf").await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_summary_stream_reports_progress() {
    let app = TestApp::new();
    app.upload("notes.txt", "text/plain", "The cat sat. ".repeat(100).as_bytes())
        .await;

    let resp = app.post_json("/api/summary/stream", serde_json::json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(resp).await).unwrap();

    assert_eq!(body.matches("event: progress").count(), 2);
    assert!(body.contains("event: done"));
    assert!(body.contains(r#""summary":"[800] [600] ""#));
    let progress = body.find("event: progress").unwrap();
    let done = body.find("event: done").unwrap();
    assert!(progress < done);

    assert_eq!(app.get("/api/summary/pdf").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_summary_stream_without_document() {
    let app = TestApp::new();
    let resp = app.post_json("/api/summary/stream", serde_json::json!({})).await;
    let body = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(body.contains("event: error"));
    assert!(body.contains("No document loaded"));
}

#[tokio::test]
async fn test_questions_build_history() {
    let app = TestApp::new();
    app.upload("lease.txt", "text/plain", lease_text().as_bytes()).await;

    let resp = app
        .post_json("/api/qa", serde_json::json!({ "question": "What is the rent?" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let entry = body_json(resp).await;
    assert_eq!(entry["answer"], "1200");
    assert!(entry["context"].as_str().unwrap().contains("rent is 1200"));

    let resp = app
        .post_json("/api/qa", serde_json::json!({ "question": "Who is the tenant?" }))
        .await;
    let entry = body_json(resp).await;
    assert_eq!(entry["answer"], "1200");

    let resp = app.post_json("/api/qa", serde_json::json!({ "question": "   " })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let history = body_json(app.get("/api/qa/history").await).await;
    assert_eq!(history["total"], 2);
    assert_eq!(history["history"][0]["question"], "What is the rent?");
    assert_eq!(history["history"][1]["question"], "Who is the tenant?");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_questions_keep_arrival_order() {
    let app = TestApp::with_qa(Arc::new(SlowFirstQa));
    app.upload("lease.txt", "text/plain", lease_text().as_bytes()).await;

    let router = app.router.clone();
    let slow = tokio::spawn(async move {
        let req = Request::post("/api/qa")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "question": "What is due on the first?" }).to_string(),
            ))
            .unwrap();
        router.oneshot(req).await.unwrap()
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let resp = app
        .post_json("/api/qa", serde_json::json!({ "question": "What is the rent?" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(slow.await.unwrap().status(), StatusCode::OK);

    let history = body_json(app.get("/api/qa/history").await).await;
    assert_eq!(history["total"], 2);
    assert_eq!(history["history"][0]["question"], "What is due on the first?");
    assert_eq!(history["history"][1]["question"], "What is the rent?");
}

#[tokio::test]
async fn test_no_answer_sentinel() {
    let app = TestApp::new();
    app.upload("nda.txt", "text/plain", b"Confidential information stays secret.")
        .await;
    let entry = body_json(
        app.post_json("/api/qa", serde_json::json!({ "question": "What is the rent?" }))
            .await,
    )
    .await;
    assert_eq!(entry["answer"], "No answer found.");
    assert_eq!(entry["score"], 0.0);
    assert_eq!(entry["context"], "");
}

#[tokio::test]
async fn test_highlight_requires_pdf() {
    let app = TestApp::new();
    app.upload("lease.txt", "text/plain", lease_text().as_bytes()).await;
    app.post_json("/api/qa", serde_json::json!({ "question": "What is the rent?" }))
        .await;

    let resp = app.get("/api/export/highlighted").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["info"],
        "PDF highlighting works only with PDF files."
    );
}

#[tokio::test]
async fn test_highlight_without_document_is_info() {
    let app = TestApp::new();
    let resp = app.get("/api/export/highlighted").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["info"],
        "PDF highlighting works only with PDF files."
    );
}

#[tokio::test]
async fn test_highlight_pdf_answers() {
    let app = TestApp::new();
    let pdf = legalease_export::render_summary_pdf(
        "Lease terms. The monthly rent is 1200 dollars payable in advance.",
    )
    .unwrap();
    let resp = app.upload("lease.pdf", "application/pdf", &pdf).await;
    let json = body_json(resp).await;
    assert_eq!(json["loaded"], true);
    assert_eq!(json["document"]["format"], "pdf");
    assert_eq!(json["document"]["pages"], 1);

    let resp = app.get("/api/export/highlighted").await;
    assert_eq!(
        body_json(resp).await["info"],
        "No Q&A found to highlight in PDF."
    );

    let entry = body_json(
        app.post_json("/api/qa", serde_json::json!({ "question": "What is the rent?" }))
            .await,
    )
    .await;
    assert_eq!(entry["answer"], "1200");

    let resp = app.get("/api/export/highlighted").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(resp.headers()["x-highlight-count"], "1");
    assert!(resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("highlighted_QA.pdf"));
    assert!(body_bytes(resp).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = TestApp::new();
    let boundary = "b";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
    );
    let resp = app
        .send(
            Request::post("/api/document")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
