//! Buffered conversation endpoint.

use super::common::{admit, parse_request, ApiError};
use crate::pipeline::{DebugInfo, GroundedAnswer};
use crate::rate_limit::Endpoint;
use crate::server::AppState;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use grounded_types::Source;
use serde::Serialize;
use std::net::SocketAddr;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub conversation_id: String,
    pub assistant_text: String,
    pub sources: Vec<Source>,
    pub strict_mode_rejection: bool,
    pub no_evidence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl ChatResponse {
    fn from_answer(answer: GroundedAnswer, include_debug: bool) -> Self {
        Self {
            conversation_id: answer.conversation_id,
            assistant_text: answer.assistant_text,
            sources: answer.sources,
            strict_mode_rejection: answer.strict_mode_rejection,
            no_evidence: answer.no_evidence,
            debug: include_debug.then_some(answer.debug),
        }
    }
}

/// `POST /api/chat`
pub async fn handle_chat(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let debug = state.config.debug;
    let request = parse_request(&body, debug)?;
    let decision = admit(&state, &headers, peer.map(|c| c.0), Endpoint::Chat)?;

    let answer = state.pipeline.run(request).await.map_err(|e| ApiError::new(e, debug))?;

    let mut response = Json(ChatResponse::from_answer(answer, debug)).into_response();
    response.headers_mut().extend(decision.headers());
    Ok(response)
}
