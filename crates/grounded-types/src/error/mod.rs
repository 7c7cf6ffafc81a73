//! Typed error definitions for the gateway.
//!
//! Every failure a request can hit is one variant of [`GatewayError`]. Each
//! variant knows its HTTP status and a stable machine-readable code, so the
//! buffered endpoint and the streaming `error` event render the same taxonomy.

mod provider;
mod validation;

pub use provider::{ProviderError, ProviderErrorCode};
pub use validation::{ValidationError, Violation};

use thiserror::Error;

/// Unified error type for the grounding gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Malformed request body (400)
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Per-client request ceiling reached (429)
    #[error("Rate limit exceeded for {endpoint}, retry after {retry_after_secs}s")]
    RateLimitExceeded { endpoint: String, retry_after_secs: u64 },

    /// Server-side credential needed by the selected strategy is not configured (400)
    #[error("Missing credential: {message}")]
    MissingCredential { message: String },

    /// Evidence provider did not answer before the deadline (terminal, no retry)
    #[error("Evidence provider timed out after {duration_secs}s")]
    ProviderTimeout { duration_secs: u64 },

    /// Upstream model provider failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Unexpected failure; details stay server-side
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::MissingCredential { .. } => 400,
            Self::RateLimitExceeded { .. } => 429,
            Self::ProviderTimeout { .. } => 504,
            Self::Provider(err) => err.code.http_status_code(),
            Self::Internal { .. } => 500,
        }
    }

    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL",
            Self::ProviderTimeout { .. } => "TIMEOUT",
            Self::Provider(err) => err.code.as_str(),
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Message that is safe to show to the end user.
    ///
    /// Internal errors never expose their message here.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.message.clone(),
            Self::RateLimitExceeded { retry_after_secs, .. } => format!(
                "Too many requests. Please wait {} seconds and try again.",
                retry_after_secs
            ),
            Self::MissingCredential { message } => message.clone(),
            Self::ProviderTimeout { .. } => {
                "The request took too long to complete. Please try again with a shorter question."
                    .to_string()
            },
            Self::Provider(err) => err.message.clone(),
            Self::Internal { .. } => {
                "An unexpected error occurred. Please try again later.".to_string()
            },
        }
    }

    /// Shorthand for an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether the client can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::MissingCredential { .. })
    }
}
