//! Reputation change log - append-only, one record per mutation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::CharacterId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationChange {
    pub seq: i64,
    pub owner_id: CharacterId,
    pub old_value: i32,
    pub new_value: i32,
    pub delta: i32,
    pub reason: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

impl ReputationChange {
    /// "battle victory: +2 (10 → 12) - Misty Woods"
    pub fn describe(&self) -> String {
        let sign = if self.delta > 0 { "+" } else { "" };
        format!(
            "{}: {}{} ({} → {}) - {}",
            self.reason, sign, self.delta, self.old_value, self.new_value, self.location
        )
    }
}
