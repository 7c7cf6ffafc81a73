//! Shared answer pipeline used by both the buffered and the streamed endpoint.
//!
//! The pipeline is split into steps so the stream assembler can emit status
//! events between them:
//!
//! ```text
//! prepare ─► fetch_evidence ─► (no evidence?) ─► finish
//!                                  │
//!                                  └─► NoEvidence answer
//! ```

use crate::grounding::{deduplicate_sources, insert_citations, DomainTrustClassifier, StrictModeGate};
use crate::providers::{EvidenceStrategy, ProviderFactory, StrategyKind};
use crate::timeout::with_timeout;
use grounded_types::models::GatewayConfig;
use grounded_types::{ConversationRequest, EvidenceResult, GatewayError, Source};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Answer text used when a grounded strategy found nothing to stand on.
pub const NO_EVIDENCE_MESSAGE: &str = "No supporting evidence was found for this question, so \
no answer is given. Try rephrasing it or adding more detail, such as the relevant law or date.";

/// Request after strategy selection, owned by one request task.
#[derive(Debug)]
pub struct PreparedRequest {
    pub conversation_id: String,
    pub strategy: EvidenceStrategy,
    pub request: ConversationRequest,
    started: Instant,
}

impl PreparedRequest {
    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Strict mode applies unless the answer comes from the caller's file store.
    pub fn strict_mode_active(&self) -> bool {
        self.request.strict_mode && self.kind() != StrategyKind::FileSearch
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Diagnostics attached to responses in debug mode.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_queries: Option<Vec<String>>,
    pub support_count: usize,
    pub chunk_count: usize,
    pub raw_source_count: usize,
    pub deduplicated_source_count: usize,
    pub trusted_source_count: usize,
    pub elapsed_ms: u64,
}

/// Final outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedAnswer {
    pub conversation_id: String,
    pub strategy: StrategyKind,
    pub assistant_text: String,
    pub sources: Vec<Source>,
    pub strict_mode_rejection: bool,
    pub no_evidence: bool,
    pub debug: DebugInfo,
}

pub struct Pipeline {
    factory: Arc<dyn ProviderFactory>,
    config: Arc<GatewayConfig>,
    classifier: DomainTrustClassifier,
    gate: StrictModeGate,
    provider_timeout: Duration,
}

impl Pipeline {
    pub fn new(factory: Arc<dyn ProviderFactory>, config: Arc<GatewayConfig>) -> Self {
        let classifier = DomainTrustClassifier::new(&config.trusted_domains);
        let gate = StrictModeGate::new(config.strict_mode, classifier.domains().to_vec());
        let provider_timeout = Duration::from_secs(config.provider_timeout_secs);
        Self { factory, config, classifier, gate, provider_timeout }
    }

    /// Override the provider deadline.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Assign a conversation id and select the evidence strategy.
    pub fn prepare(&self, request: ConversationRequest) -> PreparedRequest {
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let strategy = EvidenceStrategy::select(&request, &self.config);
        info!(
            conversation_id = %conversation_id,
            strategy = %strategy.kind(),
            strict_mode = request.strict_mode,
            "[Pipeline] Request prepared"
        );
        PreparedRequest { conversation_id, strategy, request, started: Instant::now() }
    }

    /// Call the selected provider under the deadline.
    pub async fn fetch_evidence(&self, prepared: &PreparedRequest) -> Result<EvidenceResult, GatewayError> {
        let provider = self.factory.create(&prepared.strategy)?;
        with_timeout(
            self.provider_timeout,
            provider.get_evidence_and_answer(&prepared.conversation_id, &prepared.request.messages),
        )
        .await
    }

    /// The no-evidence answer, if this result calls for one.
    ///
    /// Only grounded strategies qualify, and an active strict gate takes
    /// precedence so the caller sees the rejection instead.
    pub fn no_evidence_answer(
        &self,
        prepared: &PreparedRequest,
        evidence: &EvidenceResult,
    ) -> Option<GroundedAnswer> {
        if prepared.kind() == StrategyKind::Direct
            || prepared.strict_mode_active()
            || !evidence.has_no_evidence()
        {
            return None;
        }

        info!(conversation_id = %prepared.conversation_id, "[Pipeline] No evidence returned");
        Some(GroundedAnswer {
            conversation_id: prepared.conversation_id.clone(),
            strategy: prepared.kind(),
            assistant_text: NO_EVIDENCE_MESSAGE.to_string(),
            sources: Vec::new(),
            strict_mode_rejection: false,
            no_evidence: true,
            debug: DebugInfo {
                strategy: prepared.kind().as_str().to_string(),
                search_queries: evidence.grounding_metadata.as_ref().and_then(|m| m.search_queries.clone()),
                elapsed_ms: prepared.elapsed_ms(),
                ..DebugInfo::default()
            },
        })
    }

    /// Citations, de-duplication, trust classification and the strict gate.
    pub fn finish(&self, prepared: &PreparedRequest, evidence: EvidenceResult) -> GroundedAnswer {
        let metadata = evidence.grounding_metadata;
        let annotated = insert_citations(&evidence.answer_text, metadata.as_ref());

        let raw_source_count = evidence.sources.len();
        let sources = self.classifier.classify(deduplicate_sources(evidence.sources));
        let trusted_source_count = sources.iter().filter(|s| s.trusted()).count();

        let verdict = self.gate.evaluate(prepared.strict_mode_active(), &sources);
        let strict_mode_rejection = verdict.is_rejection();
        let assistant_text = match verdict {
            crate::grounding::StrictVerdict::Rejected { message } => {
                info!(
                    conversation_id = %prepared.conversation_id,
                    sources = sources.len(),
                    trusted = trusted_source_count,
                    "[StrictMode] Answer rejected"
                );
                message
            },
            _ => annotated,
        };

        let debug_info = DebugInfo {
            strategy: prepared.kind().as_str().to_string(),
            search_queries: metadata.as_ref().and_then(|m| m.search_queries.clone()),
            support_count: metadata.as_ref().map_or(0, |m| m.supports.len()),
            chunk_count: metadata.as_ref().map_or(0, |m| m.chunks.len()),
            raw_source_count,
            deduplicated_source_count: sources.len(),
            trusted_source_count,
            elapsed_ms: prepared.elapsed_ms(),
        };

        info!(
            conversation_id = %prepared.conversation_id,
            elapsed_ms = debug_info.elapsed_ms,
            "[Pipeline] Answer ready: {} sources ({} trusted)",
            sources.len(),
            trusted_source_count
        );

        GroundedAnswer {
            conversation_id: prepared.conversation_id.clone(),
            strategy: prepared.kind(),
            assistant_text,
            sources,
            strict_mode_rejection,
            no_evidence: false,
            debug: debug_info,
        }
    }

    /// Whole pipeline in one call, for the buffered endpoint.
    pub async fn run(&self, request: ConversationRequest) -> Result<GroundedAnswer, GatewayError> {
        let prepared = self.prepare(request);
        let evidence = self.fetch_evidence(&prepared).await?;
        if let Some(answer) = self.no_evidence_answer(&prepared, &evidence) {
            return Ok(answer);
        }
        Ok(self.finish(&prepared, evidence))
    }
}
