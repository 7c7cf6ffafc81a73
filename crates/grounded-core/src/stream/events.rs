//! Named SSE events and their wire framing.

use crate::pipeline::{DebugInfo, GroundedAnswer};
use crate::providers::StrategyKind;
use bytes::Bytes;
use grounded_types::{GatewayError, Source};
use serde::Serialize;

/// Progress stages reported between the provider call and the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VerifyingCitations,
    CheckingSources,
}

impl Stage {
    pub fn message(self) -> &'static str {
        match self {
            Self::VerifyingCitations => "Verifying citations against the retrieved evidence",
            Self::CheckingSources => "Checking source reliability",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartPayload {
    pub conversation_id: String,
    pub strategy: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusPayload {
    pub stage: Stage,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChunkPayload {
    pub text: String,
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    pub conversation_id: String,
    pub sources: Vec<Source>,
    pub strict_mode_rejection: bool,
    pub no_evidence: bool,
    /// Full answer text when it was not delivered as chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl CompletePayload {
    pub fn from_answer(answer: GroundedAnswer, message: Option<String>, include_debug: bool) -> Self {
        Self {
            conversation_id: answer.conversation_id,
            sources: answer.sources,
            strict_mode_rejection: answer.strict_mode_rejection,
            no_evidence: answer.no_evidence,
            message,
            debug: include_debug.then_some(answer.debug),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error: String,
    pub code: &'static str,
}

impl From<&GatewayError> for ErrorPayload {
    fn from(err: &GatewayError) -> Self {
        Self { error: err.user_message(), code: err.code() }
    }
}

/// One event of the stream protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Start(StartPayload),
    Status(StatusPayload),
    Chunk(ChunkPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl StreamEvent {
    pub fn start(conversation_id: &str, strategy: StrategyKind) -> Self {
        Self::Start(StartPayload {
            conversation_id: conversation_id.to_string(),
            strategy: strategy.as_str(),
        })
    }

    pub fn status(stage: Stage) -> Self {
        Self::Status(StatusPayload { stage, message: stage.message() })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Status(_) => "status",
            Self::Chunk(_) => "chunk",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }

    fn data(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Start(p) => serde_json::to_string(p),
            Self::Status(p) => serde_json::to_string(p),
            Self::Chunk(p) => serde_json::to_string(p),
            Self::Complete(p) => serde_json::to_string(p),
            Self::Error(p) => serde_json::to_string(p),
        }
    }

    /// `event: <name>\ndata: <json>\n\n`
    pub fn to_frame(&self) -> Bytes {
        let data = self.data().unwrap_or_else(|e| {
            tracing::error!("[Stream] Failed to serialize {} event: {}", self.name(), e);
            r#"{"error":"An unexpected error occurred. Please try again later.","code":"INTERNAL_ERROR"}"#
                .to_string()
        });
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.name(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_format() {
        let frame = StreamEvent::start("c1", StrategyKind::WebSearch).to_frame();
        assert_eq!(
            frame,
            Bytes::from("event: start\ndata: {\"conversationId\":\"c1\",\"strategy\":\"web_search\"}\n\n")
        );
    }

    #[test]
    fn test_status_payload() {
        let frame = StreamEvent::status(Stage::CheckingSources).to_frame();
        let text = String::from_utf8_lossy(&frame);
        assert!(text.starts_with("event: status\n"));
        assert!(text.contains("\"stage\":\"checking_sources\""));
    }

    #[test]
    fn test_chunk_text_with_newlines_stays_on_one_data_line() {
        let event = StreamEvent::Chunk(ChunkPayload { text: "a\nb".to_string(), index: 0, total: 1 });
        let frame = event.to_frame();
        let text = String::from_utf8_lossy(&frame);
        assert_eq!(text.matches('\n').count(), 3);
    }

    #[test]
    fn test_complete_omits_absent_fields() {
        let event = StreamEvent::Complete(CompletePayload {
            conversation_id: "c1".to_string(),
            sources: Vec::new(),
            strict_mode_rejection: false,
            no_evidence: false,
            message: None,
            debug: None,
        });
        let frame = event.to_frame();
        let text = String::from_utf8_lossy(&frame);
        assert!(!text.contains("message"));
        assert!(!text.contains("debug"));
        assert!(text.contains("\"strictModeRejection\":false"));
    }

    #[test]
    fn test_error_payload_hides_internal_detail() {
        let payload = ErrorPayload::from(&GatewayError::internal("db password leaked"));
        assert_eq!(payload.code, "INTERNAL_ERROR");
        assert!(!payload.error.contains("password"));
    }
}
