//! HTTP request handlers for the rectification service.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use tracing::{error, info};
use uuid::Uuid;

use super::{AppState, JsonBody};
use crate::capabilities::RectifierOptions;
use crate::chunkers::{Chunker, SizeChunker};
use crate::error::{ServiceError, ServiceResult, CONVERSION, RECTIFICATION};
use crate::events::ProgressEvent;
use crate::pipeline::{assemble_rectified, convert_document, rectify_document};
use crate::progress::NoopObserver;
use crate::stream::{spawn_event_stream, EventStream};
use crate::types::{Chunk, ConvertRequest, DocumentResponse, HealthResponse, RectifyRequest};

/// Documents larger than this (in bytes) are chunked on the blocking pool.
const BLOCKING_CHUNK_THRESHOLD: usize = 256 * 1024;

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Rectify a text document, either streamed or as one response.
pub async fn rectify(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<RectifyRequest>,
) -> ServiceResult<Response> {
    let request_id = Uuid::new_v4();

    let job = request.into_job(&state.config).inspect_err(|e| {
        info!(request_id = %request_id, error = %e, "Rejected rectification request");
    })?;
    let rectifier = state.rectifiers.create(RectifierOptions {
        model: job.model.clone(),
        verbose: state.config.verbose,
    })?;
    let filename = job.document.filename().to_string();
    let chunks = chunk_document(job.document.into_content(), job.chunk_size).await?;

    info!(
        request_id = %request_id,
        filename = %filename,
        model = %job.model,
        chunk_size = job.chunk_size,
        chunks = chunks.len(),
        stream = job.stream,
        "Received rectification request"
    );

    if job.stream {
        let initial = ProgressEvent::progress(
            0,
            format!("Starting rectification of {} chunk(s)", chunks.len()),
        );
        let stream = spawn_event_stream(
            state.config.stream_buffer,
            RECTIFICATION,
            initial,
            move |controller| async move {
                let rectified =
                    rectify_document(&chunks, rectifier.as_ref(), controller.as_ref()).await?;
                Ok(assemble_rectified(&rectified))
            },
        );
        return Ok(event_stream_response(stream));
    }

    let rectified = rectify_document(&chunks, rectifier.as_ref(), &NoopObserver)
        .await
        .inspect_err(|e| error!(request_id = %request_id, error = %e, "Rectification failed"))?;

    Ok(Json(DocumentResponse {
        markdown: assemble_rectified(&rectified),
        filename,
    })
    .into_response())
}

/// Convert a base64-encoded PDF to markdown, either streamed or as one response.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<ConvertRequest>,
) -> ServiceResult<Response> {
    let request_id = Uuid::new_v4();

    let job = request.into_job().inspect_err(|e| {
        info!(request_id = %request_id, error = %e, "Rejected conversion request");
    })?;

    info!(
        request_id = %request_id,
        filename = %job.filename,
        bytes = job.bytes.len(),
        stream = job.stream,
        "Received conversion request"
    );

    if job.stream {
        let initial = ProgressEvent::activity(format!("Received {}", job.filename));
        let extractor = Arc::clone(&state.extractor);
        let stream = spawn_event_stream(
            state.config.stream_buffer,
            CONVERSION,
            initial,
            move |controller| async move {
                convert_document(job.bytes, extractor.as_ref(), controller.as_ref()).await
            },
        );
        return Ok(event_stream_response(stream));
    }

    let markdown = convert_document(job.bytes, state.extractor.as_ref(), &NoopObserver)
        .await
        .inspect_err(|e| error!(request_id = %request_id, error = %e, "Conversion failed"))?;

    Ok(Json(DocumentResponse {
        markdown,
        filename: job.filename,
    })
    .into_response())
}

/// Split a document, off the async workers when it is large.
async fn chunk_document(content: String, chunk_size: usize) -> ServiceResult<Vec<Chunk>> {
    if content.len() <= BLOCKING_CHUNK_THRESHOLD {
        return SizeChunker::new().chunk(&content, chunk_size);
    }

    tokio::task::spawn_blocking(move || SizeChunker::new().chunk(&content, chunk_size))
        .await
        .map_err(|e| {
            error!(error = %e, "Chunking task aborted");
            ServiceError::transformation(RECTIFICATION, "chunking task aborted")
        })?
}

fn event_stream_response(stream: EventStream) -> Response {
    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}
