//! RPG Engine - turn-based text role-playing game core
//!
//! The engine drives a character through creation, free-form story turns,
//! battles, loot, a shop, companions and reputation. Prose comes from an
//! optional LLM narrator; every rule is deterministic and lives in the
//! domain and application layers.

pub mod application;
pub mod domain;
pub mod infrastructure;
