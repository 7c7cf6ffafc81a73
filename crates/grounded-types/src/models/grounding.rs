//! Grounding metadata and evidence types.
//!
//! These are provider-neutral: each evidence provider converts its own wire
//! format into [`EvidenceResult`] before anything downstream sees it.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Half-open byte span into the original answer text.
///
/// Offsets are signed so that malformed upstream values survive parsing and
/// can be rejected by [`GroundingSpan::byte_range`] instead of wrapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroundingSpan {
    pub start_index: i64,
    pub end_index: i64,
}

impl GroundingSpan {
    pub fn new(start_index: i64, end_index: i64) -> Self {
        Self { start_index, end_index }
    }

    /// Byte range of this span within `text`, or `None` when the span is invalid:
    /// out of bounds, empty/inverted, or not on UTF-8 character boundaries.
    pub fn byte_range(&self, text: &str) -> Option<Range<usize>> {
        let start = usize::try_from(self.start_index).ok()?;
        let end = usize::try_from(self.end_index).ok()?;
        if start >= end || end > text.len() {
            return None;
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return None;
        }
        Some(start..end)
    }
}

/// One answer segment backed by one or more evidence chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroundingSupport {
    pub segment: GroundingSpan,
    #[serde(default)]
    pub evidence_indices: Vec<i64>,
}

/// Addressable piece of retrieved evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceChunk {
    pub title: String,
    pub uri: String,
}

/// Mapping from answer spans to evidence, produced once per provider call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub supports: Vec<GroundingSupport>,
    #[serde(default)]
    pub chunks: Vec<EvidenceChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_queries: Option<Vec<String>>,
}

impl GroundingMetadata {
    pub fn is_empty(&self) -> bool {
        self.supports.is_empty() && self.chunks.is_empty()
    }
}

/// A citable source returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub title: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_trusted: Option<bool>,
}

impl Source {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self { title: title.into(), uri: uri.into(), is_trusted: None }
    }

    pub fn trusted(&self) -> bool {
        self.is_trusted.unwrap_or(false)
    }
}

impl From<&EvidenceChunk> for Source {
    fn from(chunk: &EvidenceChunk) -> Self {
        Self::new(chunk.title.clone(), chunk.uri.clone())
    }
}

/// Entire output of one provider call; consumed once by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceResult {
    pub answer_text: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

impl EvidenceResult {
    /// True when the provider found nothing to ground the answer on.
    pub fn has_no_evidence(&self) -> bool {
        self.sources.is_empty()
            && self.grounding_metadata.as_ref().map_or(true, GroundingMetadata::is_empty)
    }
}
