#![allow(clippy::unwrap_used, reason = "test helpers")]

use crate::providers::{EvidenceProvider, EvidenceStrategy, ProviderFactory};
use async_trait::async_trait;
use grounded_types::{
    EvidenceChunk, EvidenceResult, GatewayError, GroundingMetadata, GroundingSpan, GroundingSupport,
    Message, ProviderError, Source,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the stub provider does when called.
#[derive(Clone)]
pub enum Scripted {
    Answer(EvidenceResult),
    Fail(ProviderError),
    Hang(Duration),
}

/// Factory returning a scripted provider and recording selected strategies.
pub struct StubFactory {
    script: Scripted,
    pub calls: Arc<AtomicUsize>,
    pub strategies: Arc<Mutex<Vec<EvidenceStrategy>>>,
}

impl StubFactory {
    pub fn new(script: Scripted) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            strategies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn answering(result: EvidenceResult) -> Self {
        Self::new(Scripted::Answer(result))
    }
}

impl ProviderFactory for StubFactory {
    fn create(&self, strategy: &EvidenceStrategy) -> Result<Box<dyn EvidenceProvider>, GatewayError> {
        self.strategies.lock().unwrap().push(strategy.clone());
        Ok(Box::new(StubProvider {
            script: self.script.clone(),
            calls: self.calls.clone(),
        }))
    }
}

struct StubProvider {
    script: Scripted,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl EvidenceProvider for StubProvider {
    async fn get_evidence_and_answer(
        &self,
        _conversation_id: &str,
        _messages: &[Message],
    ) -> Result<EvidenceResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Scripted::Answer(result) => Ok(result.clone()),
            Scripted::Fail(err) => Err(err.clone()),
            Scripted::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(EvidenceResult::default())
            },
        }
    }
}

/// Two-sentence answer backed by one official and one unofficial source.
pub fn grounded_result() -> EvidenceResult {
    let chunks = vec![
        EvidenceChunk { title: "Mevzuat".to_string(), uri: "https://www.mevzuat.gov.tr/4857".to_string() },
        EvidenceChunk { title: "Blog".to_string(), uri: "https://hukukblog.example.com/yazi".to_string() },
    ];
    EvidenceResult {
        answer_text: "Fact one. Fact two.".to_string(),
        sources: chunks.iter().map(Source::from).collect(),
        grounding_metadata: Some(GroundingMetadata {
            supports: vec![
                GroundingSupport { segment: GroundingSpan::new(0, 9), evidence_indices: vec![0] },
                GroundingSupport { segment: GroundingSpan::new(10, 19), evidence_indices: vec![0, 1] },
            ],
            chunks,
            search_queries: Some(vec!["fact".to_string()]),
        }),
    }
}

/// Answer with nothing to ground it on.
pub fn empty_result() -> EvidenceResult {
    EvidenceResult { answer_text: "Unsupported answer.".to_string(), ..EvidenceResult::default() }
}
