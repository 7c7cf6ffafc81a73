//! Strict mode gate.
//!
//! A veto is a soft outcome: the answer text is replaced with an explanation,
//! sources are still returned, and the request succeeds.

use grounded_types::models::StrictModeConfig;
use grounded_types::Source;

/// Outcome of the strict mode check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrictVerdict {
    /// Gate not active for this request.
    Skipped,
    Passed,
    Rejected { message: String },
}

impl StrictVerdict {
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[derive(Debug, Clone)]
pub struct StrictModeGate {
    min_sources: usize,
    min_trusted: usize,
    trusted_domains: Vec<String>,
}

impl StrictModeGate {
    pub fn new(config: StrictModeConfig, trusted_domains: Vec<String>) -> Self {
        Self { min_sources: config.min_sources, min_trusted: config.min_trusted, trusted_domains }
    }

    /// `active` is false when strict mode is off or the strategy is file search.
    pub fn evaluate(&self, active: bool, sources: &[Source]) -> StrictVerdict {
        if !active {
            return StrictVerdict::Skipped;
        }

        let total = sources.len();
        let trusted = sources.iter().filter(|s| s.trusted()).count();
        if total >= self.min_sources && trusted >= self.min_trusted {
            return StrictVerdict::Passed;
        }

        StrictVerdict::Rejected { message: self.rejection_message(total, trusted) }
    }

    fn rejection_message(&self, total: usize, trusted: usize) -> String {
        let domains = self
            .trusted_domains
            .iter()
            .map(|d| format!("- {}", d))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Strict mode: this answer was withheld because it is not backed by enough \
             verifiable evidence.\n\n\
             Required: at least {} sources, including at least {} from official domains.\n\
             Found: {} sources, {} from official domains.\n\n\
             Official domains:\n{}\n\n\
             Try rephrasing the question, or turn strict mode off to see the unverified answer.",
            self.min_sources, self.min_trusted, total, trusted, domains
        )
    }
}
