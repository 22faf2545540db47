//! Outbound ports - Interfaces that the application requires from external systems

mod llm_port;
mod narrator_port;
mod random_port;
mod world_store_port;

pub use llm_port::{ChatMessage, LlmError, LlmPort, LlmRequest, LlmResponse, MessageRole};
#[cfg(test)]
pub use narrator_port::MockNarratorPort;
pub use narrator_port::{
    CompanionArchetype, CompanionProfile, IntentAnalysis, NarrationContext, NarrationKind,
    NarratorError, NarratorPort, RecruitDecision,
};
pub use random_port::RandomPort;
#[cfg(test)]
pub use world_store_port::MockWorldStorePort;
pub use world_store_port::{StoreError, WorldStorePort};
