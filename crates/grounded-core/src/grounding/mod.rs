//! Post-processing of provider output: citations, de-duplication, trust, strict mode.

pub mod citations;
pub mod sources;
pub mod strict_mode;
pub mod trust;

pub use citations::insert_citations;
pub use sources::{deduplicate_sources, normalize_uri};
pub use strict_mode::{StrictModeGate, StrictVerdict};
pub use trust::DomainTrustClassifier;
