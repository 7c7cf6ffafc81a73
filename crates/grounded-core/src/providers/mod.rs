//! Evidence providers - the external collaborators that answer a question and
//! report which evidence backs which part of the answer.
//!
//! Three strategies exist and the set is closed:
//! - `WebSearch`: Gemini with Google Search grounding
//! - `FileSearch`: Gemini scoped to an uploaded file store
//! - `Direct`: caller-chosen vendor and key, no grounding at all
//!
//! Selection is a pure function of the request flags and configuration
//! ([`EvidenceStrategy::select`]); building the concrete client goes through a
//! [`ProviderFactory`] so handlers can be exercised with stubs.

pub mod direct;
pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use grounded_types::models::GatewayConfig;
use grounded_types::{ConversationRequest, EvidenceResult, GatewayError, Message, ModelProvider, ProviderError};
use std::fmt;
use std::time::Duration;

pub use direct::DirectProvider;
pub use gemini::{GeminiProvider, GeminiTool};
pub use openai::OpenAiProvider;

/// Built-in instruction for the grounded strategies.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a legal research assistant. \
Answer strictly from the retrieved evidence and cite it. Prefer official sources such as \
mevzuat.gov.tr, resmigazete.gov.tr and court websites. If the evidence is insufficient, \
say so plainly instead of guessing.";

/// Single contract every evidence provider fulfils.
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    /// Answer the conversation and report sources and grounding metadata.
    async fn get_evidence_and_answer(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<EvidenceResult, ProviderError>;
}

/// Tag of an [`EvidenceStrategy`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    WebSearch,
    FileSearch,
    Direct,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::FileSearch => "file_search",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence strategy chosen once per request.
#[derive(Clone, PartialEq, Eq)]
pub enum EvidenceStrategy {
    WebSearch,
    FileSearch { store_id: String },
    Direct { provider: ModelProvider, api_key: String, model: Option<String> },
}

impl fmt::Debug for EvidenceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSearch => f.write_str("WebSearch"),
            Self::FileSearch { store_id } => {
                f.debug_struct("FileSearch").field("store_id", store_id).finish()
            },
            Self::Direct { provider, model, .. } => f
                .debug_struct("Direct")
                .field("provider", provider)
                .field("api_key", &"<redacted>")
                .field("model", model)
                .finish(),
        }
    }
}

impl EvidenceStrategy {
    /// Priority: explicit direct provider > explicit file search > configured default > web.
    pub fn select(request: &ConversationRequest, config: &GatewayConfig) -> Self {
        if let (Some(provider), Some(api_key)) = (request.provider, request.api_key.as_ref()) {
            if provider != config.default_provider {
                return Self::Direct {
                    provider,
                    api_key: api_key.clone(),
                    model: request.model.clone(),
                };
            }
        }

        if request.use_files {
            if let Some(store_id) = &request.store_id {
                return Self::FileSearch { store_id: store_id.clone() };
            }
        }

        if config.evidence.default_mode == grounded_types::models::EvidenceMode::FileSearch {
            let store = request.store_id.as_ref().or(config.evidence.default_store_id.as_ref());
            if let Some(store_id) = store {
                return Self::FileSearch { store_id: store_id.clone() };
            }
        }

        Self::WebSearch
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::WebSearch => StrategyKind::WebSearch,
            Self::FileSearch { .. } => StrategyKind::FileSearch,
            Self::Direct { .. } => StrategyKind::Direct,
        }
    }
}

/// Builds the concrete provider for a selected strategy.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, strategy: &EvidenceStrategy) -> Result<Box<dyn EvidenceProvider>, GatewayError>;
}

/// Production factory talking to the real vendor APIs over HTTP.
pub struct HttpProviderFactory {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl HttpProviderFactory {
    pub fn new(http: reqwest::Client, config: GatewayConfig) -> Self {
        Self { http, config }
    }

    fn server_gemini_key(&self) -> Result<String, GatewayError> {
        self.config
            .gemini
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GatewayError::MissingCredential {
                message: "No Gemini API key is configured for grounded answers.".to_string(),
            })
    }

    fn system_instruction(&self) -> String {
        self.config
            .gemini
            .system_instruction
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string())
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, strategy: &EvidenceStrategy) -> Result<Box<dyn EvidenceProvider>, GatewayError> {
        let gemini = &self.config.gemini;
        match strategy {
            EvidenceStrategy::WebSearch => Ok(Box::new(GeminiProvider::new(
                self.http.clone(),
                gemini.base_url.clone(),
                self.server_gemini_key()?,
                gemini.model.clone(),
                GeminiTool::GoogleSearch,
                Some(self.system_instruction()),
            ))),
            EvidenceStrategy::FileSearch { store_id } => Ok(Box::new(GeminiProvider::new(
                self.http.clone(),
                gemini.base_url.clone(),
                self.server_gemini_key()?,
                gemini.model.clone(),
                GeminiTool::file_search(store_id),
                Some(self.system_instruction()),
            ))),
            EvidenceStrategy::Direct { provider, api_key, model } => {
                let inner: Box<dyn EvidenceProvider> = match provider {
                    ModelProvider::Openai => Box::new(OpenAiProvider::new(
                        self.http.clone(),
                        self.config.openai.base_url.clone(),
                        api_key.clone(),
                        model.clone().unwrap_or_else(|| self.config.openai.default_model.clone()),
                    )),
                    ModelProvider::Gemini => Box::new(GeminiProvider::new(
                        self.http.clone(),
                        gemini.base_url.clone(),
                        api_key.clone(),
                        model.clone().unwrap_or_else(|| gemini.model.clone()),
                        GeminiTool::None,
                        None,
                    )),
                };
                Ok(Box::new(DirectProvider::new(*provider, inner)))
            },
        }
    }
}

/// Build the shared upstream HTTP client.
///
/// The provider deadline is enforced by the timeout guard, so the client only
/// bounds connection setup.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}

/// Shorten an upstream body for logging.
pub(crate) fn truncate_for_log(body: &str) -> &str {
    const MAX_LOG_BODY: usize = 512;
    if body.len() <= MAX_LOG_BODY {
        return body;
    }
    let mut end = MAX_LOG_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
