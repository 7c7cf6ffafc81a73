//! Upstream provider errors.

use thiserror::Error;

/// Category of an upstream provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// 401/403 from upstream, or a 400 naming an invalid key
    InvalidApiKey,
    /// 429 without a quota marker
    RateLimited,
    /// 429 (or 402) reporting exhausted quota / billing
    InsufficientQuota,
    /// Anything else: 5xx, transport failure, unparseable body
    Upstream,
}

impl ProviderErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::RateLimited => "RATE_LIMITED",
            Self::InsufficientQuota => "INSUFFICIENT_QUOTA",
            Self::Upstream => "PROVIDER_ERROR",
        }
    }

    pub fn http_status_code(self) -> u16 {
        match self {
            Self::InvalidApiKey => 401,
            Self::RateLimited => 429,
            Self::InsufficientQuota => 402,
            Self::Upstream => 502,
        }
    }

    /// Classify an upstream HTTP failure by status and body.
    pub fn from_upstream(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::InvalidApiKey,
            // Gemini reports a bad key as 400 INVALID_ARGUMENT
            400 if body.contains("API_KEY_INVALID") || body.contains("API key not valid") => {
                Self::InvalidApiKey
            },
            402 => Self::InsufficientQuota,
            429 => {
                let lower = body.to_ascii_lowercase();
                if lower.contains("insufficient_quota") || lower.contains("quota") {
                    Self::InsufficientQuota
                } else {
                    Self::RateLimited
                }
            },
            _ => Self::Upstream,
        }
    }

    /// Default user-facing message for this category.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::InvalidApiKey => "The API key was rejected by the model provider.",
            Self::RateLimited => "The model provider is rate limiting requests. Please retry shortly.",
            Self::InsufficientQuota => "The model provider account has insufficient quota.",
            Self::Upstream => "The model provider returned an error. Please try again.",
        }
    }
}

/// Typed failure returned by every evidence provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Error carrying the category's default message.
    pub fn from_code(code: ProviderErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Transport or decoding failure.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Upstream, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_upstream_status() {
        assert_eq!(ProviderErrorCode::from_upstream(401, ""), ProviderErrorCode::InvalidApiKey);
        assert_eq!(ProviderErrorCode::from_upstream(403, ""), ProviderErrorCode::InvalidApiKey);
        assert_eq!(
            ProviderErrorCode::from_upstream(429, r#"{"error":{"code":"insufficient_quota"}}"#),
            ProviderErrorCode::InsufficientQuota
        );
        assert_eq!(
            ProviderErrorCode::from_upstream(429, "Too many requests"),
            ProviderErrorCode::RateLimited
        );
        assert_eq!(ProviderErrorCode::from_upstream(500, ""), ProviderErrorCode::Upstream);
    }

    #[test]
    fn test_gemini_bad_request_key_is_invalid_api_key() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(ProviderErrorCode::from_upstream(400, body), ProviderErrorCode::InvalidApiKey);
        assert_eq!(
            ProviderErrorCode::from_upstream(400, r#"{"error":{"status":"INVALID_ARGUMENT"}}"#),
            ProviderErrorCode::Upstream
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(ProviderErrorCode::InvalidApiKey.as_str(), "INVALID_API_KEY");
        assert_eq!(ProviderErrorCode::Upstream.http_status_code(), 502);
    }
}
