//! Streaming conversation endpoint.

use super::common::{admit, parse_request, ApiError};
use crate::rate_limit::Endpoint;
use crate::server::AppState;
use crate::stream::{spawn_stream, sse_response, StreamSettings};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;
use std::net::SocketAddr;

/// `POST /api/chat/stream`
///
/// Validation and rate-limit failures are plain JSON errors because no stream
/// exists yet; everything after that is reported in-band.
pub async fn handle_chat_stream(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let debug = state.config.debug;
    let request = parse_request(&body, debug)?;
    let decision = admit(&state, &headers, peer.map(|c| c.0), Endpoint::ChatStream)?;

    let settings = StreamSettings::from_config(&state.config.stream, debug);
    let mut response = sse_response(spawn_stream(state.pipeline.clone(), request, settings));
    response.headers_mut().extend(decision.headers());
    Ok(response)
}
