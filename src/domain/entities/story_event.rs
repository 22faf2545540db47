//! StoryEvent entity - immutable records of notable occurrences
//!
//! Story events form the audit trail of a session: battle victories,
//! recruitments, dismissals, completed quests. They are only ever appended
//! and read back for progression queries such as the adventure count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::CharacterId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    pub seq: i64,
    pub owner_id: CharacterId,
    /// Category tag, e.g. `battle_victory` or `permanent_event`
    pub event_type: String,
    pub description: String,
    pub location: String,
    pub turn: u32,
    pub reputation_delta: i32,
    pub gold_delta: i64,
    pub timestamp: DateTime<Utc>,
}

/// A story event about to be appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStoryEvent {
    pub owner_id: CharacterId,
    pub event_type: String,
    pub description: String,
    pub location: String,
    pub turn: u32,
    pub reputation_delta: i32,
    pub gold_delta: i64,
}

impl NewStoryEvent {
    pub fn new(
        owner_id: CharacterId,
        event_type: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        turn: u32,
    ) -> Self {
        Self {
            owner_id,
            event_type: event_type.into(),
            description: description.into(),
            location: location.into(),
            turn,
            reputation_delta: 0,
            gold_delta: 0,
        }
    }

    pub fn with_deltas(mut self, reputation_delta: i32, gold_delta: i64) -> Self {
        self.reputation_delta = reputation_delta;
        self.gold_delta = gold_delta;
        self
    }
}
