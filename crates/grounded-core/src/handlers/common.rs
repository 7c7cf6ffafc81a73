//! Helpers shared by the conversation handlers.

use crate::rate_limit::{Endpoint, RateLimitDecision};
use crate::server::AppState;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use grounded_types::{ConversationRequest, GatewayError, ValidationError, Violation};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tracing::{error, info};

/// Fallback identity when nothing identifies the caller.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Rate-limit identity of the caller.
///
/// Proxy headers win over the socket address so that clients behind a
/// reverse proxy are not all counted as one.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

/// A [`GatewayError`] on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub error: GatewayError,
    pub debug: bool,
    pub rate: Option<RateLimitDecision>,
}

impl ApiError {
    pub fn new(error: GatewayError, debug: bool) -> Self {
        Self { error, debug, rate: None }
    }

    fn details(&self) -> Option<Value> {
        match &self.error {
            GatewayError::Validation(err) => serde_json::to_value(&err.violations).ok(),
            GatewayError::RateLimitExceeded { retry_after_secs, .. } => {
                Some(json!({ "retryAfter": retry_after_secs }))
            },
            GatewayError::Internal { message } if self.debug => Some(json!({ "message": message })),
            GatewayError::Provider(err) if self.debug => Some(json!({ "message": err.message })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.error.code(), "[Api] Request failed: {}", self.error);
        } else {
            info!(code = self.error.code(), "[Api] Request rejected: {}", self.error);
        }

        let mut body = json!({
            "error": self.error.user_message(),
            "code": self.error.code(),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(rate) = &self.rate {
            response.headers_mut().extend(rate.headers());
        }
        response
    }
}

/// Parse and validate a raw request body.
pub fn parse_request(body: &Bytes, debug: bool) -> Result<ConversationRequest, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        let violation = Violation::new("body", format!("must be valid JSON ({})", e));
        let err = ValidationError { message: violation.to_string(), violations: vec![violation] };
        ApiError::new(GatewayError::Validation(err), debug)
    })?;
    crate::validation::validate_request(&value)
        .map_err(|e| ApiError::new(GatewayError::Validation(e), debug))
}

/// Count the request against the caller's window.
pub fn admit(
    state: &AppState,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    endpoint: Endpoint,
) -> Result<RateLimitDecision, ApiError> {
    let client = client_id(headers, peer);
    let decision = state.rate_limiter.check(&client, endpoint);
    if decision.allowed {
        return Ok(decision);
    }
    let error = GatewayError::RateLimitExceeded {
        endpoint: endpoint.as_str().to_string(),
        retry_after_secs: decision.retry_after_secs(),
    };
    Err(ApiError { error, debug: state.config.debug, rate: Some(decision) })
}
