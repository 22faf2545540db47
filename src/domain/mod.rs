//! Domain layer - Core game rules with no I/O
//!
//! This layer contains:
//! - Entities: Character, InventoryEntry, ReputationChange, StoryEvent, shop and item tables
//! - Value Objects: identifiers, action tags, reputation tiers, classes and races

pub mod entities;
pub mod value_objects;
