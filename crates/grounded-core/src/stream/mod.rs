//! Streamed delivery of a grounded answer as server-sent events.
//!
//! Event order per request:
//!
//! ```text
//! start ─► complete                              (no evidence)
//! start ─► status ─► status ─► complete          (strict mode veto)
//! start ─► status ─► status ─► chunk* ─► complete
//! start ─► status* ─► error                      (any failure)
//! ```
//!
//! The producer runs in its own task and writes frames into a bounded channel;
//! the response body drains the channel. If the client disconnects, the body
//! is dropped, the producer task is aborted and any pending send fails.

pub mod events;
pub mod writer;


use crate::pipeline::Pipeline;
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use events::{CompletePayload, Stage};
use grounded_types::models::StreamConfig;
use grounded_types::{ConversationRequest, GatewayError};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use writer::{Phase, StreamWriter};

pub use events::StreamEvent;

/// Frames buffered between producer and body.
const CHANNEL_CAPACITY: usize = 16;

struct AbortOnDrop<T>(tokio::task::JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Chunking and pacing for streamed answers.
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub chunk_words: usize,
    pub chunk_delay: Duration,
    pub include_debug: bool,
}

impl StreamSettings {
    pub fn from_config(config: &StreamConfig, include_debug: bool) -> Self {
        Self {
            chunk_words: config.chunk_words,
            chunk_delay: Duration::from_millis(config.chunk_delay_ms),
            include_debug,
        }
    }
}

/// Split `text` into groups of `words_per_chunk` space-separated words.
///
/// Every chunk but the last keeps the separating space, so concatenating the
/// chunks reproduces `text` exactly. Empty text yields no chunks.
pub fn split_into_chunks(text: &str, words_per_chunk: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let words: Vec<&str> = text.split(' ').collect();
    let groups: Vec<&[&str]> = words.chunks(words_per_chunk.max(1)).collect();
    let last = groups.len().saturating_sub(1);
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let mut chunk = group.join(" ");
            if i < last {
                chunk.push(' ');
            }
            chunk
        })
        .collect()
}

/// Drive one request through the pipeline, writing events as it goes.
///
/// Returns the phase the stream ended in.
pub async fn produce(
    pipeline: Arc<Pipeline>,
    request: ConversationRequest,
    settings: StreamSettings,
    tx: mpsc::Sender<Bytes>,
) -> Phase {
    let prepared = pipeline.prepare(request);
    let conversation_id = prepared.conversation_id.clone();
    let mut writer = StreamWriter::new(tx);

    if writer.start(&conversation_id, prepared.kind()).await.is_err() {
        return writer.phase();
    }

    let evidence = match pipeline.fetch_evidence(&prepared).await {
        Ok(evidence) => evidence,
        Err(err) => {
            log_failure(&conversation_id, &err);
            return writer.error(&err).await;
        },
    };

    if let Some(answer) = pipeline.no_evidence_answer(&prepared, &evidence) {
        let message = answer.assistant_text.clone();
        return writer
            .complete(CompletePayload::from_answer(answer, Some(message), settings.include_debug))
            .await;
    }

    for stage in [Stage::VerifyingCitations, Stage::CheckingSources] {
        if writer.status(stage).await.is_err() {
            return writer.phase();
        }
    }

    let answer = pipeline.finish(&prepared, evidence);

    if answer.strict_mode_rejection {
        let message = answer.assistant_text.clone();
        return writer
            .complete(CompletePayload::from_answer(answer, Some(message), settings.include_debug))
            .await;
    }

    let chunks = split_into_chunks(&answer.assistant_text, settings.chunk_words);
    let total = chunks.len();
    for (index, text) in chunks.into_iter().enumerate() {
        if writer.chunk(text, index, total).await.is_err() {
            info!(conversation_id = %conversation_id, "[Stream] Client disconnected after {} of {} chunks", index, total);
            return writer.phase();
        }
        if index + 1 < total && !settings.chunk_delay.is_zero() {
            tokio::time::sleep(settings.chunk_delay).await;
        }
    }

    // Nothing was chunked: carry the (empty) text on the terminal event.
    let message = (total == 0).then(|| answer.assistant_text.clone());
    writer.complete(CompletePayload::from_answer(answer, message, settings.include_debug)).await
}

fn log_failure(conversation_id: &str, err: &GatewayError) {
    if err.is_client_error() {
        info!(conversation_id = %conversation_id, code = err.code(), "[Stream] Request failed: {}", err);
    } else {
        error!(conversation_id = %conversation_id, code = err.code(), "[Stream] Request failed: {}", err);
    }
}

/// Spawn the producer and return the response body that drains it.
///
/// A panicking producer still ends the stream with an `error` event.
pub fn spawn_stream(
    pipeline: Arc<Pipeline>,
    request: ConversationRequest,
    settings: StreamSettings,
) -> Body {
    let (tx, mut rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);

    let supervisor = tokio::spawn(async move {
        let producer = tokio::spawn(produce(pipeline, request, settings, tx.clone()));
        let mut guard = AbortOnDrop(producer);
        let joined = (&mut guard.0).await;
        if let Err(join_err) = joined {
            if join_err.is_panic() {
                error!("[Stream] Producer panicked: {}", join_err);
                let err = GatewayError::internal("stream producer panicked");
                let _ = tx.send(StreamEvent::Error((&err).into()).to_frame()).await;
            }
        }
    });

    let stream = async_stream::stream! {
        let _supervisor_guard = AbortOnDrop(supervisor);
        while let Some(frame) = rx.recv().await {
            yield Ok::<Bytes, Infallible>(frame);
        }
    };

    Body::from_stream(stream)
}

/// Wrap a body in the SSE response headers.
pub fn sse_response(body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, header::HeaderValue::from_static("keep-alive"));
    response
}
