//! End-to-end tests of the HTTP surface with in-process fake capabilities.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use rectifier::api::{router, AppState};
use rectifier::capabilities::{Extractor, Rectifier, RectifierFactory, RectifierOptions};
use rectifier::chunkers::chunk_by_size;
use rectifier::error::{ServiceResult, RECTIFICATION};
use rectifier::events::{parse_event, FrameDecoder, ProgressEvent};
use rectifier::pipeline::{assemble_rectified, rectify_document};
use rectifier::progress::NoopObserver;
use rectifier::stream::spawn_event_stream;
use rectifier::types::{Chunk, DocumentResponse, RectifiedChunk, ServiceConfig};

/// Upper-cases each chunk; optionally fails on one index.
struct FakeRectifier {
    calls: AtomicUsize,
    fail_at: Option<usize>,
}

#[async_trait]
impl Rectifier for FakeRectifier {
    fn name(&self) -> &str {
        "fake"
    }

    async fn rectify_chunk(&self, chunk: &Chunk) -> anyhow::Result<RectifiedChunk> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(chunk.index) {
            anyhow::bail!("model backend returned 500 Internal Server Error");
        }
        Ok(RectifiedChunk::new(
            chunk.index,
            chunk.content.trim().to_uppercase(),
        ))
    }
}

struct FakeFactory(Arc<FakeRectifier>);

impl RectifierFactory for FakeFactory {
    fn create(&self, _options: RectifierOptions) -> ServiceResult<Arc<dyn Rectifier>> {
        Ok(self.0.clone())
    }
}

struct FakeExtractor;

#[async_trait]
impl Extractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn convert_to_markdown(&self, bytes: Vec<u8>) -> anyhow::Result<String> {
        if !bytes.starts_with(b"%PDF") {
            anyhow::bail!("input is not a PDF document");
        }
        Ok("# Title\n\n    indented code\n\nBody text.".to_string())
    }
}

fn app_with(rectifier: Arc<FakeRectifier>) -> Router {
    let state = AppState::with_capabilities(
        ServiceConfig::default(),
        Arc::new(FakeFactory(rectifier)),
        Arc::new(FakeExtractor),
    );
    router(Arc::new(state))
}

fn fake(fail_at: Option<usize>) -> Arc<FakeRectifier> {
    Arc::new(FakeRectifier {
        calls: AtomicUsize::new(0),
        fail_at,
    })
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn events(response: axum::response::Response) -> Vec<ProgressEvent> {
    let bytes = body_bytes(response).await;
    let mut decoder = FrameDecoder::new();
    let events = decoder.push(&bytes);
    assert_eq!(decoder.dropped(), 0);
    assert!(decoder.finish().is_none());
    events
}

/// Three 3,500-character paragraphs separated by blank lines.
fn three_paragraphs() -> (String, Vec<String>) {
    let paragraph = "Lorem ipsum dolor sit amet. ".repeat(125);
    let paragraphs = vec![paragraph.clone(), paragraph.clone(), paragraph];
    (paragraphs.join("\n\n"), paragraphs)
}

#[tokio::test]
async fn health_reports_version() {
    let response = app_with(fake(None))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn missing_content_is_rejected_without_a_stream() {
    let rectifier = fake(None);
    let response = app_with(rectifier.clone())
        .oneshot(post("/api/rectify", json!({ "stream": true, "chunkSize": 4000 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "No content provided");
    assert_eq!(rectifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_chunk_size_is_rejected() {
    let response = app_with(fake(None))
        .oneshot(post(
            "/api/rectify",
            json!({ "content": "text", "chunkSize": 0, "stream": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid configuration"));
}

#[tokio::test]
async fn wrong_typed_fields_get_a_json_error() {
    for body in [
        json!({ "content": 5, "stream": true }),
        json!({ "content": "text", "chunkSize": 1.5, "stream": true }),
    ] {
        let rectifier = fake(None);
        let response = app_with(rectifier.clone())
            .oneshot(post("/api/rectify", body.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
        assert_eq!(rectifier.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn malformed_json_gets_a_json_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/convert")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"content\": "))
        .unwrap();
    let response = app_with(fake(None)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn large_document_round_trips_through_chunking() {
    let content = "Lorem ipsum dolor sit amet. ".repeat(12_000);
    let rectifier = fake(None);
    let response = app_with(rectifier.clone())
        .oneshot(post(
            "/api/rectify",
            json!({ "content": content, "chunkSize": 4000, "stream": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: DocumentResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(rectifier.calls.load(Ordering::SeqCst) >= content.len() / 4000);
    assert!(body.markdown.starts_with("LOREM IPSUM"));
    assert!(!body.markdown.contains("Lorem"));
}

#[tokio::test]
async fn three_chunks_stream_progress_then_complete() {
    let (content, paragraphs) = three_paragraphs();
    let response = app_with(fake(None))
        .oneshot(post(
            "/api/rectify",
            json!({ "content": content, "chunkSize": 4000, "stream": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let events = events(response).await;
    let percentages: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Progress { percentage, .. } => Some(*percentage),
            _ => None,
        })
        .collect();
    assert_eq!(percentages, vec![0, 33, 67, 100]);
    assert_eq!(
        events[0],
        ProgressEvent::progress(0, "Starting rectification of 3 chunk(s)")
    );

    let expected = paragraphs
        .iter()
        .map(|p| p.trim().to_uppercase())
        .collect::<Vec<_>>()
        .join("\n\n");
    assert_eq!(events.last(), Some(&ProgressEvent::complete(expected)));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn failure_mid_document_ends_with_one_error_frame() {
    let (content, _) = three_paragraphs();
    let rectifier = fake(Some(1));
    let response = app_with(rectifier.clone())
        .oneshot(post(
            "/api/rectify",
            json!({ "content": content, "chunkSize": 4000, "stream": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let events = events(response).await;

    let complete = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Complete { .. }))
        .count();
    let errors: Vec<&ProgressEvent> = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Error { .. }))
        .collect();
    assert_eq!(complete, 0);
    assert_eq!(
        errors,
        vec![&ProgressEvent::error(
            "Rectification failed: model backend returned 500 Internal Server Error"
        )]
    );
    assert_eq!(rectifier.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn structured_response_matches_streamed_markdown() {
    let (content, _) = three_paragraphs();

    let streamed = app_with(fake(None))
        .oneshot(post(
            "/api/rectify",
            json!({ "content": content, "chunkSize": 4000, "stream": true }),
        ))
        .await
        .unwrap();
    let streamed_markdown = match events(streamed).await.pop() {
        Some(ProgressEvent::Complete { markdown }) => markdown,
        other => panic!("expected complete frame, got {other:?}"),
    };

    let response = app_with(fake(None))
        .oneshot(post(
            "/api/rectify",
            json!({ "content": content, "chunkSize": 4000, "filename": "notes.md" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: DocumentResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert_eq!(body.markdown, streamed_markdown);
    assert_eq!(body.filename, "notes.md");
}

#[tokio::test]
async fn structured_failure_is_bad_gateway() {
    let (content, _) = three_paragraphs();
    let rectifier = fake(Some(0));
    let response = app_with(rectifier.clone())
        .oneshot(post("/api/rectify", json!({ "content": content })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        body["error"],
        "Rectification failed: model backend returned 500 Internal Server Error"
    );
    assert_eq!(rectifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_document_only_announces_start() {
    let chunks = chunk_by_size("", 4000).unwrap();
    assert!(chunks.is_empty());

    let fake_rectifier = fake(None);
    let direct = rectify_document(&chunks, fake_rectifier.as_ref(), &NoopObserver)
        .await
        .unwrap();
    assert!(direct.is_empty());

    let frames: Vec<String> = spawn_event_stream(
        4,
        RECTIFICATION,
        ProgressEvent::progress(0, "Starting rectification of 0 chunk(s)"),
        move |controller| async move {
            let rectified =
                rectify_document(&chunks, fake_rectifier.as_ref(), controller.as_ref()).await?;
            Ok(assemble_rectified(&rectified))
        },
    )
    .collect()
    .await;

    let events: Vec<ProgressEvent> = frames.iter().filter_map(|f| parse_event(f)).collect();
    assert_eq!(
        events,
        vec![
            ProgressEvent::progress(0, "Starting rectification of 0 chunk(s)"),
            ProgressEvent::complete(""),
        ]
    );
}

#[tokio::test]
async fn conversion_streams_activities() {
    let response = app_with(fake(None))
        .oneshot(post(
            "/api/convert",
            json!({
                "content": STANDARD.encode(b"%PDF-1.7 fake"),
                "filename": "paper.pdf",
                "stream": true,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        events(response).await,
        vec![
            ProgressEvent::activity("Received paper.pdf"),
            ProgressEvent::activity("Loading document"),
            ProgressEvent::activity("Extracting text"),
            ProgressEvent::activity("Generating markdown"),
            ProgressEvent::complete("# Title\n\n    indented code\n\nBody text."),
        ]
    );
}

#[tokio::test]
async fn conversion_failure_is_one_error_frame() {
    let response = app_with(fake(None))
        .oneshot(post(
            "/api/convert",
            json!({ "content": STANDARD.encode(b"plain text"), "stream": true }),
        ))
        .await
        .unwrap();

    let events = events(response).await;
    assert_eq!(events[0], ProgressEvent::activity("Received document.pdf"));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::error(
            "Conversion failed: input is not a PDF document"
        ))
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn conversion_without_stream_returns_json() {
    let response = app_with(fake(None))
        .oneshot(post(
            "/api/convert",
            json!({ "content": STANDARD.encode(b"%PDF-1.4") }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: DocumentResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.markdown, "# Title\n\n    indented code\n\nBody text.");
    assert_eq!(body.filename, "document.pdf");
}

#[tokio::test]
async fn invalid_base64_is_rejected() {
    let response = app_with(fake(None))
        .oneshot(post(
            "/api/convert",
            json!({ "content": "not base64 !!", "stream": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid base64 content"));
}
