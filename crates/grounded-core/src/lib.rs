//! # Grounded Core
//!
//! The grounding gateway: everything between an HTTP request and a cited answer.
//!
//! ```text
//! validation ─► rate_limit ─► providers (under timeout) ─► grounding ─► handlers / stream
//! ```
//!
//! - **`validation`** - request body parsing with collected violations
//! - **`rate_limit`** - per-client, per-endpoint fixed windows
//! - **`providers`** - web, file-store and direct evidence providers
//! - **`timeout`** - provider deadline
//! - **`grounding`** - citation markers, de-duplication, trust, strict mode
//! - **`pipeline`** - the shared answer pipeline
//! - **`stream`** - SSE event protocol and its single-writer state machine
//! - **`server`** / **`handlers`** / **`middleware`** - the axum surface

pub mod grounding;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod providers;
pub mod rate_limit;
pub mod server;
pub mod stream;
pub mod timeout;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use pipeline::{GroundedAnswer, Pipeline};
pub use providers::{EvidenceProvider, EvidenceStrategy, HttpProviderFactory, ProviderFactory, StrategyKind};
pub use rate_limit::{Endpoint, RateLimiter};
pub use server::{build_router, AppState};
