//! Domain models.

pub mod config;
pub mod conversation;
pub mod grounding;

pub use config::{
    EvidenceConfig, EvidenceMode, GatewayConfig, GeminiConfig, OpenAiConfig, RateLimitConfig,
    StreamConfig, StrictModeConfig,
};
pub use conversation::{ConversationRequest, Message, ModelProvider, Role};
pub use grounding::{
    EvidenceChunk, EvidenceResult, GroundingMetadata, GroundingSpan, GroundingSupport, Source,
};
