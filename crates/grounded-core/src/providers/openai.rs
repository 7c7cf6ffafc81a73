//! OpenAI-compatible chat completions client, used only by the direct strategy.

use super::{truncate_for_log, EvidenceProvider};
use async_trait::async_trait;
use grounded_types::{EvidenceResult, Message, ProviderError, ProviderErrorCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self { http, base_url, api_key, model }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EvidenceProvider for OpenAiProvider {
    async fn get_evidence_and_answer(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<EvidenceResult, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage { role: m.role.as_str(), content: &m.content })
                .collect(),
        };
        debug!(conversation_id = %conversation_id, model = %self.model, "[OpenAI] Sending chat completion");

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(conversation_id = %conversation_id, "[OpenAI] Request failed: {}", e);
                ProviderError::upstream(format!("Failed to reach OpenAI: {}", e.without_url()))
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            ProviderError::upstream(format!("Failed to read OpenAI response: {}", e.without_url()))
        })?;

        if !status.is_success() {
            let code = ProviderErrorCode::from_upstream(status.as_u16(), &text);
            warn!(
                conversation_id = %conversation_id,
                status = %status,
                code = code.as_str(),
                "[OpenAI] Upstream error: {}",
                truncate_for_log(&text)
            );
            return Err(ProviderError::from_code(code));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|_| ProviderError::upstream("OpenAI returned a response that could not be parsed"))?;

        let answer_text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::upstream("OpenAI returned no answer"))?;

        Ok(EvidenceResult { answer_text, sources: Vec::new(), grounding_metadata: None })
    }
}
