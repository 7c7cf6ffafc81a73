//! Direct passthrough: the caller's own vendor and key, no grounding.

use super::EvidenceProvider;
use async_trait::async_trait;
use grounded_types::{EvidenceResult, Message, ModelProvider, ProviderError};
use tracing::info;

/// Appended to every direct answer.
pub const DIRECT_DISCLAIMER: &str = "\n\n---\n_Note: this answer was generated directly by the \
selected model without web or document grounding. Its statements have not been automatically \
verified against official sources._";

pub struct DirectProvider {
    vendor: ModelProvider,
    inner: Box<dyn EvidenceProvider>,
}

impl DirectProvider {
    pub fn new(vendor: ModelProvider, inner: Box<dyn EvidenceProvider>) -> Self {
        Self { vendor, inner }
    }
}

#[async_trait]
impl EvidenceProvider for DirectProvider {
    async fn get_evidence_and_answer(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<EvidenceResult, ProviderError> {
        let result = self.inner.get_evidence_and_answer(conversation_id, messages).await?;
        info!(
            conversation_id = %conversation_id,
            vendor = %self.vendor,
            "[Direct] Passthrough answer: {} chars",
            result.answer_text.len()
        );

        let mut answer_text = result.answer_text;
        answer_text.push_str(DIRECT_DISCLAIMER);
        Ok(EvidenceResult { answer_text, sources: Vec::new(), grounding_metadata: None })
    }
}
