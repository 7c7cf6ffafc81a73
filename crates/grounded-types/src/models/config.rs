//! Gateway configuration.
//!
//! Every field has a default so a missing or partial config file still yields
//! a runnable gateway. Ranges are enforced through `validator` before startup.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::conversation::ModelProvider;

/// Official legal-information domains treated as authoritative by default.
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "mevzuat.gov.tr",
    "resmigazete.gov.tr",
    "yargitay.gov.tr",
    "danistay.gov.tr",
    "anayasa.gov.tr",
    "tbmm.gov.tr",
    "adalet.gov.tr",
    "turkiye.gov.tr",
];

/// Evidence strategy used when the request does not pick one explicitly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMode {
    #[default]
    Web,
    FileSearch,
}

/// Full gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind the HTTP listener to
    pub bind_address: String,
    /// Port to listen on
    #[validate(range(min = 1_u16))]
    pub port: u16,
    /// Attach `debug` objects and internal error details to responses
    pub debug: bool,
    /// Hostnames (and their subdomains) treated as trusted sources
    #[validate(length(min = 1_u64))]
    pub trusted_domains: Vec<String>,
    /// Browser origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
    /// Wall-clock deadline for one provider call, in seconds
    #[validate(range(min = 1_u64, max = 600_u64))]
    pub provider_timeout_secs: u64,
    /// Vendor considered "default"; requesting any other one with a key bypasses grounding
    pub default_provider: ModelProvider,
    #[validate(nested)]
    pub evidence: EvidenceConfig,
    #[validate(nested)]
    pub rate_limit: RateLimitConfig,
    #[validate(nested)]
    pub stream: StreamConfig,
    #[validate(nested)]
    pub strict_mode: StrictModeConfig,
    #[validate(nested)]
    pub gemini: GeminiConfig,
    #[validate(nested)]
    pub openai: OpenAiConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8046,
            debug: false,
            trusted_domains: DEFAULT_TRUSTED_DOMAINS.iter().map(|d| (*d).to_string()).collect(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            provider_timeout_secs: 60,
            default_provider: ModelProvider::Gemini,
            evidence: EvidenceConfig::default(),
            rate_limit: RateLimitConfig::default(),
            stream: StreamConfig::default(),
            strict_mode: StrictModeConfig::default(),
            gemini: GeminiConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Get the full bind socket address.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Evidence strategy defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, Validate)]
#[serde(default)]
pub struct EvidenceConfig {
    pub default_mode: EvidenceMode,
    /// Store used when file search is the default mode and the request names none
    pub default_store_id: Option<String>,
}

/// Per-endpoint request ceilings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct RateLimitConfig {
    #[validate(range(min = 1_u64, max = 86400_u64))]
    pub window_secs: u64,
    #[validate(range(min = 1_u32))]
    pub chat_max_requests: u32,
    #[validate(range(min = 1_u32))]
    pub stream_max_requests: u32,
    /// How often expired windows are evicted
    #[validate(range(min = 1_u64))]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            chat_max_requests: 20,
            stream_max_requests: 20,
            sweep_interval_secs: 60,
        }
    }
}

/// Streaming delivery tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct StreamConfig {
    /// Words per `chunk` event
    #[validate(range(min = 1_usize, max = 10000_usize))]
    pub chunk_words: usize,
    /// Pause between chunk events, in milliseconds
    #[validate(range(max = 5000_u64))]
    pub chunk_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { chunk_words: 50, chunk_delay_ms: 50 }
    }
}

/// Strict mode thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct StrictModeConfig {
    #[validate(range(min = 1_usize))]
    pub min_sources: usize,
    pub min_trusted: usize,
}

impl Default for StrictModeConfig {
    fn default() -> Self {
        Self { min_sources: 2, min_trusted: 1 }
    }
}

/// Gemini (Generative Language API) settings used by the grounded strategies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct GeminiConfig {
    /// Server-side key; grounded strategies cannot run without it
    pub api_key: Option<String>,
    #[validate(length(min = 1_u64))]
    pub model: String,
    #[validate(length(min = 1_u64))]
    pub base_url: String,
    /// Overrides the built-in system instruction
    pub system_instruction: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            system_instruction: None,
        }
    }
}

/// OpenAI settings used only by direct passthrough.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct OpenAiConfig {
    #[validate(length(min = 1_u64))]
    pub base_url: String,
    #[validate(length(min = 1_u64))]
    pub default_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider_timeout_secs, 60);
        assert_eq!(config.stream.chunk_words, 50);
        assert!(config.trusted_domains.iter().any(|d| d == "mevzuat.gov.tr"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "port": 9000,
            "evidence": {"default_mode": "file_search", "default_store_id": "kanunlar"}
        }))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.evidence.default_mode, EvidenceMode::FileSearch);
        assert_eq!(config.rate_limit.window_secs, 60);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let config = GatewayConfig { provider_timeout_secs: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nested_validation() {
        let mut config = GatewayConfig::default();
        config.stream.chunk_words = 0;
        assert!(config.validate().is_err());
    }
}
