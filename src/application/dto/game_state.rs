//! Session state threaded through the orchestrator
//!
//! `GameState` is a plain value. Every step takes it by value and hands back
//! an updated copy; nothing holds on to it between steps.

use serde::{Deserialize, Serialize};

use crate::application::dto::SubsystemResult;
use crate::application::ports::outbound::CompanionArchetype;
use crate::domain::value_objects::{ActionTag, CharacterClass, CharacterId, Race, StartingStats};

/// A decision the player has been asked to make. At most one is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingDecision {
    RecruitOffer { archetype: CompanionArchetype },
    /// Companions offered for dismissal, in the order they were listed
    DismissChoice { candidates: Vec<(CharacterId, String)> },
    InventoryOpen,
}

/// Parsed character-creation input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    pub race: Race,
    pub class: CharacterClass,
    pub age: u32,
}

/// A draft with everything needed to persist the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedCharacter {
    pub draft: CharacterDraft,
    pub stats: StartingStats,
    pub starting_location: String,
    pub backstory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// The state the next step will dispatch
    pub action: ActionTag,
    pub player_id: Option<CharacterId>,
    pub companion_ids: Vec<CharacterId>,
    pub current_location: String,
    pub current_objective: String,
    /// Mirror of the player's gold, refreshed whenever a subsystem changes it
    pub gold: i64,
    pub pending: Option<PendingDecision>,
    pub last_result: Option<SubsystemResult>,
    pub draft: Option<PreparedCharacter>,
    pub last_input: String,
    pub turn: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            action: ActionTag::CharacterCreation,
            player_id: None,
            companion_ids: Vec::new(),
            current_location: String::new(),
            current_objective: String::new(),
            gold: 0,
            pending: None,
            last_result: None,
            draft: None,
            last_input: String::new(),
            turn: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.player_id.is_some()
    }

    pub fn with_action(mut self, action: ActionTag) -> Self {
        self.action = action;
        self
    }

    pub fn with_pending(mut self, pending: Option<PendingDecision>) -> Self {
        self.pending = pending;
        self
    }

    pub fn with_result(mut self, result: SubsystemResult) -> Self {
        self.last_result = Some(result);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.current_location = location.into();
        self
    }

    pub fn with_gold(mut self, gold: i64) -> Self {
        self.gold = gold;
        self
    }

    pub fn with_companion(mut self, id: CharacterId) -> Self {
        if !self.companion_ids.contains(&id) {
            self.companion_ids.push(id);
        }
        self
    }

    pub fn without_companion(mut self, id: CharacterId) -> Self {
        self.companion_ids.retain(|existing| *existing != id);
        self
    }

    /// Record a fresh line of player input and advance the turn counter
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.last_input = input.into();
        self.turn += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_in_character_creation() {
        let state = GameState::new();
        assert_eq!(state.action, ActionTag::CharacterCreation);
        assert!(!state.is_initialized());
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_companion_updates_do_not_duplicate() {
        let id = CharacterId::new();
        let state = GameState::new().with_companion(id).with_companion(id);
        assert_eq!(state.companion_ids, vec![id]);

        let state = state.without_companion(id);
        assert!(state.companion_ids.is_empty());
    }

    #[test]
    fn test_functional_update_leaves_original_untouched() {
        let original = GameState::new().with_location("Harbor Town");
        let moved = original.clone().with_location("Old Mill").with_input("look around");
        assert_eq!(original.current_location, "Harbor Town");
        assert_eq!(original.turn, 0);
        assert_eq!(moved.current_location, "Old Mill");
        assert_eq!(moved.turn, 1);
    }
}
