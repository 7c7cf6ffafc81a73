//! Wire types for the Gemini `generateContent` API.
//!
//! Only the fields the gateway reads or writes are modelled; everything else
//! in the response is ignored by serde.

use grounded_types::models::{EvidenceChunk, GroundingMetadata, GroundingSpan, GroundingSupport};
use serde::{Deserialize, Serialize};

/// Fallback title for evidence chunks the vendor left untitled.
pub const UNTITLED_SOURCE: &str = "Source";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Reasoning parts are never part of the visible answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl GeminiPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), thought: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<GeminiContent>,
    pub finish_reason: Option<String>,
    pub grounding_metadata: Option<WireGroundingMetadata>,
}

impl Candidate {
    /// Concatenated visible text of all non-thought parts.
    pub fn answer_text(&self) -> String {
        self.content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGroundingMetadata {
    pub web_search_queries: Option<Vec<String>>,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
    pub grounding_supports: Option<Vec<WireGroundingSupport>>,
}

/// A chunk is either a web page or a passage from a file store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    pub web: Option<ChunkOrigin>,
    pub retrieved_context: Option<ChunkOrigin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkOrigin {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGroundingSupport {
    pub segment: Option<TextSegment>,
    pub grounding_chunk_indices: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    pub start_index: Option<i64>,
    pub end_index: Option<i64>,
}

impl WireGroundingMetadata {
    /// Convert to the gateway's model.
    ///
    /// Supports without an end index cannot be placed and are dropped; a
    /// missing start index means the segment starts at the beginning.
    pub fn into_domain(self) -> GroundingMetadata {
        let chunks = self
            .grounding_chunks
            .unwrap_or_default()
            .into_iter()
            .map(GroundingChunk::into_evidence)
            .collect();

        let supports = self
            .grounding_supports
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| {
                let segment = s.segment?;
                let end = segment.end_index?;
                Some(GroundingSupport {
                    segment: GroundingSpan::new(segment.start_index.unwrap_or(0), end),
                    evidence_indices: s.grounding_chunk_indices.unwrap_or_default(),
                })
            })
            .collect();

        GroundingMetadata { supports, chunks, search_queries: self.web_search_queries }
    }
}

impl GroundingChunk {
    fn into_evidence(self) -> EvidenceChunk {
        let origin = self.web.or(self.retrieved_context);
        let (title, uri) = origin.map(|o| (o.title, o.uri)).unwrap_or((None, None));
        EvidenceChunk {
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNTITLED_SOURCE.to_string()),
            uri: uri.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_web_grounding() {
        let raw = json!({
            "webSearchQueries": ["asgari ücret 2025"],
            "groundingChunks": [
                {"web": {"uri": "https://www.resmigazete.gov.tr/a", "title": "Resmî Gazete"}},
                {"web": {"uri": "https://example.com/b"}}
            ],
            "groundingSupports": [
                {"segment": {"startIndex": 0, "endIndex": 10, "text": "..."}, "groundingChunkIndices": [0, 1]},
                {"segment": {"endIndex": 4}, "groundingChunkIndices": [1]},
                {"segment": {"startIndex": 2}, "groundingChunkIndices": [0]}
            ]
        });
        let wire: WireGroundingMetadata = serde_json::from_value(raw).unwrap();
        let meta = wire.into_domain();

        assert_eq!(meta.chunks.len(), 2);
        assert_eq!(meta.chunks[1].title, UNTITLED_SOURCE);
        assert_eq!(meta.supports.len(), 2);
        assert_eq!(meta.supports[1].segment, GroundingSpan::new(0, 4));
        assert_eq!(meta.search_queries, Some(vec!["asgari ücret 2025".to_string()]));
    }

    #[test]
    fn test_parses_retrieved_context_chunks() {
        let raw = json!({
            "groundingChunks": [
                {"retrievedContext": {"title": "4857-is-kanunu.pdf", "uri": "fileSearchStores/x/documents/y"}}
            ]
        });
        let wire: WireGroundingMetadata = serde_json::from_value(raw).unwrap();
        let meta = wire.into_domain();
        assert_eq!(meta.chunks[0].title, "4857-is-kanunu.pdf");
        assert!(meta.supports.is_empty());
    }

    #[test]
    fn test_answer_text_skips_thoughts() {
        let candidate: Candidate = serde_json::from_value(json!({
            "content": {"role": "model", "parts": [
                {"text": "thinking...", "thought": true},
                {"text": "Birinci. "},
                {"text": "İkinci."}
            ]}
        }))
        .unwrap();
        assert_eq!(candidate.answer_text(), "Birinci. İkinci.");
    }
}
