//! Gemini `generateContent` client.
//!
//! One client type covers three uses, distinguished by [`GeminiTool`]:
//! Google Search grounding, file-store grounding, and plain generation for the
//! direct strategy.

pub mod models;

use super::{truncate_for_log, EvidenceProvider, StrategyKind};
use async_trait::async_trait;
use grounded_types::{
    EvidenceResult, Message, ProviderError, ProviderErrorCode, Role, Source,
};
use models::{GeminiContent, GeminiPart, GenerateContentRequest, GenerateContentResponse};
use serde_json::json;
use tracing::{debug, info, warn};

/// Prefix Gemini expects on file search store names.
const STORE_PREFIX: &str = "fileSearchStores/";

/// Grounding tool attached to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiTool {
    GoogleSearch,
    FileSearch { store_name: String },
    None,
}

impl GeminiTool {
    /// File search over a store; bare ids get the `fileSearchStores/` prefix.
    pub fn file_search(store_id: &str) -> Self {
        let store_name = if store_id.starts_with(STORE_PREFIX) {
            store_id.to_string()
        } else {
            format!("{}{}", STORE_PREFIX, store_id)
        };
        Self::FileSearch { store_name }
    }

    fn to_wire(&self) -> Option<serde_json::Value> {
        match self {
            Self::GoogleSearch => Some(json!({ "googleSearch": {} })),
            Self::FileSearch { store_name } => {
                Some(json!({ "fileSearch": { "fileSearchStoreNames": [store_name] } }))
            },
            Self::None => None,
        }
    }

    fn kind(&self) -> StrategyKind {
        match self {
            Self::GoogleSearch => StrategyKind::WebSearch,
            Self::FileSearch { .. } => StrategyKind::FileSearch,
            Self::None => StrategyKind::Direct,
        }
    }
}

pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    tool: GeminiTool,
    system_instruction: Option<String>,
}

impl GeminiProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
        tool: GeminiTool,
        system_instruction: Option<String>,
    ) -> Self {
        Self { http, base_url, api_key, model, tool, system_instruction }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(&self, messages: &[Message]) -> GenerateContentRequest {
        let contents = messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart::text(m.content.clone())],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: self
                .system_instruction
                .as_ref()
                .map(|text| GeminiContent { role: None, parts: vec![GeminiPart::text(text.clone())] }),
            tools: self.tool.to_wire().into_iter().collect(),
        }
    }
}

#[async_trait]
impl EvidenceProvider for GeminiProvider {
    async fn get_evidence_and_answer(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<EvidenceResult, ProviderError> {
        let body = self.build_request(messages);
        debug!(
            conversation_id = %conversation_id,
            model = %self.model,
            tool = %self.tool.kind(),
            "[Gemini] Sending generateContent with {} messages",
            messages.len()
        );

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(conversation_id = %conversation_id, "[Gemini] Request failed: {}", e);
                ProviderError::upstream(format!("Failed to reach Gemini: {}", e.without_url()))
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            ProviderError::upstream(format!("Failed to read Gemini response: {}", e.without_url()))
        })?;

        if !status.is_success() {
            let code = ProviderErrorCode::from_upstream(status.as_u16(), &text);
            warn!(
                conversation_id = %conversation_id,
                status = %status,
                code = code.as_str(),
                "[Gemini] Upstream error: {}",
                truncate_for_log(&text)
            );
            return Err(ProviderError::from_code(code));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(conversation_id = %conversation_id, "[Gemini] Unparseable response: {}", e);
            ProviderError::upstream("Gemini returned a response that could not be parsed")
        })?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            warn!(conversation_id = %conversation_id, "[Gemini] Empty response: {}", reason);
            return Err(ProviderError::upstream(format!("Gemini returned no answer ({})", reason)));
        };

        let answer_text = candidate.answer_text();
        let metadata = match self.tool {
            // Direct generation is never grounded, whatever the vendor echoes back.
            GeminiTool::None => None,
            _ => candidate.grounding_metadata.map(models::WireGroundingMetadata::into_domain),
        };

        let sources: Vec<Source> = metadata
            .as_ref()
            .map(|m| {
                m.chunks
                    .iter()
                    .filter(|c| !c.uri.is_empty() || matches!(self.tool, GeminiTool::FileSearch { .. }))
                    .map(Source::from)
                    .collect()
            })
            .unwrap_or_default();

        info!(
            conversation_id = %conversation_id,
            finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
            "[Gemini] Answer received: {} chars, {} sources, {} supports",
            answer_text.len(),
            sources.len(),
            metadata.as_ref().map_or(0, |m| m.supports.len())
        );

        Ok(EvidenceResult { answer_text, sources, grounding_metadata: metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(tool: GeminiTool) -> GeminiProvider {
        GeminiProvider::new(
            reqwest::Client::new(),
            "https://generativelanguage.googleapis.com/".to_string(),
            "key".to_string(),
            "gemini-2.5-flash".to_string(),
            tool,
            Some("be precise".to_string()),
        )
    }

    #[test]
    fn test_file_search_prefix() {
        assert_eq!(
            GeminiTool::file_search("kanunlar"),
            GeminiTool::FileSearch { store_name: "fileSearchStores/kanunlar".to_string() }
        );
        assert_eq!(
            GeminiTool::file_search("fileSearchStores/kanunlar"),
            GeminiTool::FileSearch { store_name: "fileSearchStores/kanunlar".to_string() }
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            provider(GeminiTool::GoogleSearch).endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_maps_roles_and_tools() {
        let messages = vec![Message::user("Soru"), Message::assistant("Cevap")];
        let body = serde_json::to_value(provider(GeminiTool::GoogleSearch).build_request(&messages))
            .unwrap_or_default();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["tools"][0], json!({"googleSearch": {}}));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be precise");
    }

    #[test]
    fn test_direct_request_has_no_tools() {
        let body = serde_json::to_value(provider(GeminiTool::None).build_request(&[Message::user("x")]))
            .unwrap_or_default();
        assert!(body.get("tools").is_none());
    }
}
