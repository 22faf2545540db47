//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite world store
//! - Ollama: LLM client, retry wrapper, and the narrator built on them
//! - Random: dice sources
//! - Config: Application configuration
//! - State: Shared application state

pub mod config;
pub mod llm_narrator;
pub mod ollama;
pub mod persistence;
pub mod random;
pub mod resilient_llm;
pub mod state;
