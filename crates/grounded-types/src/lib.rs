//! # Grounded Types
//!
//! Core types, configuration, and error definitions for the Grounded Gateway.
//!
//! - **`error`** - Typed error taxonomy surfaced by the gateway
//! - **`models`** - Conversation requests, grounding metadata, sources, configuration
//!
//! ## Architecture Role
//!
//! `grounded-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!        grounded-types (this crate)
//!                │
//!                ▼
//!          grounded-core
//!                │
//!                ▼
//!         grounded-server
//! ```

pub mod error;
pub mod models;

pub use error::{
    GatewayError, ProviderError, ProviderErrorCode, ValidationError, Violation,
};

pub use models::{
    ConversationRequest, EvidenceChunk, EvidenceResult, GatewayConfig, GroundingMetadata,
    GroundingSpan, GroundingSupport, Message, ModelProvider, Role, Source,
};
