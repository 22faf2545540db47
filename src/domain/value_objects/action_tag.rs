//! Action tags - the states of the game state machine
//!
//! Every state the orchestrator can be in is one variant here, and the
//! transition table below is the single source of truth for which state may
//! follow which. `WaitInput` is always an admissible successor so an
//! unexpected result can never strand a session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    CharacterCreation,
    MainStoryStart,
    WaitInput,
    IntentAnalysis,
    StoryContinue,
    Battle,
    CompanionOpportunity,
    CompanionDecision,
    CompanionAccept,
    CompanionReject,
    CompanionList,
    CompanionDismiss,
    CompanionDismissDecision,
    Inventory,
    InventoryAction,
    UsePotion,
    UseHeal,
    ItemReward,
    ShopPurchase,
    ReputationCheck,
}

impl ActionTag {
    pub const ALL: [ActionTag; 20] = [
        ActionTag::CharacterCreation,
        ActionTag::MainStoryStart,
        ActionTag::WaitInput,
        ActionTag::IntentAnalysis,
        ActionTag::StoryContinue,
        ActionTag::Battle,
        ActionTag::CompanionOpportunity,
        ActionTag::CompanionDecision,
        ActionTag::CompanionAccept,
        ActionTag::CompanionReject,
        ActionTag::CompanionList,
        ActionTag::CompanionDismiss,
        ActionTag::CompanionDismissDecision,
        ActionTag::Inventory,
        ActionTag::InventoryAction,
        ActionTag::UsePotion,
        ActionTag::UseHeal,
        ActionTag::ItemReward,
        ActionTag::ShopPurchase,
        ActionTag::ReputationCheck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CharacterCreation => "character_creation",
            Self::MainStoryStart => "main_story_start",
            Self::WaitInput => "wait_input",
            Self::IntentAnalysis => "intent_analysis",
            Self::StoryContinue => "story_continue",
            Self::Battle => "battle",
            Self::CompanionOpportunity => "companion_opportunity",
            Self::CompanionDecision => "companion_decision",
            Self::CompanionAccept => "companion_accept",
            Self::CompanionReject => "companion_reject",
            Self::CompanionList => "companion_list",
            Self::CompanionDismiss => "companion_dismiss",
            Self::CompanionDismissDecision => "companion_dismiss_decision",
            Self::Inventory => "inventory",
            Self::InventoryAction => "inventory_action",
            Self::UsePotion => "use_potion",
            Self::UseHeal => "use_heal",
            Self::ItemReward => "item_reward",
            Self::ShopPurchase => "shop_purchase",
            Self::ReputationCheck => "reputation_check",
        }
    }

    /// Map a symbolic tag to a state. Unknown tags become `WaitInput`.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == normalized)
            .unwrap_or(Self::WaitInput)
    }

    /// States that consume a line of player input before acting
    pub fn awaits_input(self) -> bool {
        matches!(
            self,
            Self::CharacterCreation
                | Self::WaitInput
                | Self::CompanionDecision
                | Self::CompanionDismissDecision
                | Self::InventoryAction
        )
    }

    /// The transition table
    pub fn successors(self) -> &'static [ActionTag] {
        use ActionTag::*;
        match self {
            CharacterCreation => &[CharacterCreation, MainStoryStart],
            MainStoryStart => &[WaitInput],
            WaitInput => &[IntentAnalysis, WaitInput],
            IntentAnalysis => &[
                StoryContinue,
                Battle,
                CompanionOpportunity,
                CompanionList,
                CompanionDismiss,
                Inventory,
                ItemReward,
                ShopPurchase,
                ReputationCheck,
                WaitInput,
            ],
            CompanionOpportunity => &[CompanionDecision, WaitInput],
            CompanionDecision => &[CompanionAccept, CompanionReject],
            CompanionAccept | CompanionReject => &[WaitInput],
            CompanionDismiss => &[CompanionDismissDecision, WaitInput],
            CompanionDismissDecision => &[CompanionDismissDecision, WaitInput],
            Inventory => &[InventoryAction],
            InventoryAction => &[UsePotion, UseHeal, WaitInput],
            UsePotion | UseHeal => &[InventoryAction],
            Battle => &[ItemReward],
            ItemReward => &[WaitInput],
            ShopPurchase | ReputationCheck | StoryContinue | CompanionList => &[WaitInput],
        }
    }

    /// `WaitInput` is always allowed as the fail-safe, and `CharacterCreation`
    /// is always allowed so an uninitialized session can restart.
    pub fn allows(self, next: ActionTag) -> bool {
        next == Self::WaitInput || next == Self::CharacterCreation || self.successors().contains(&next)
    }

    /// Tags the intent classifier may route to
    pub fn is_intent_target(self) -> bool {
        self != Self::WaitInput && Self::IntentAnalysis.successors().contains(&self)
    }
}

impl std::fmt::Display for ActionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_round_trips_every_tag() {
        for tag in ActionTag::ALL {
            assert_eq!(ActionTag::from_tag(tag.as_str()), tag);
        }
    }

    #[test]
    fn test_unknown_tag_routes_to_wait_input() {
        assert_eq!(ActionTag::from_tag("dance_party"), ActionTag::WaitInput);
        assert_eq!(ActionTag::from_tag(""), ActionTag::WaitInput);
        assert_eq!(ActionTag::from_tag("  BATTLE "), ActionTag::Battle);
    }

    #[test]
    fn test_every_state_has_a_successor() {
        for tag in ActionTag::ALL {
            assert!(!tag.successors().is_empty(), "{} is a dead end", tag);
        }
    }

    #[test]
    fn test_every_non_input_state_is_reachable_from_start() {
        let mut seen = vec![ActionTag::CharacterCreation];
        let mut frontier = vec![ActionTag::CharacterCreation];
        while let Some(tag) = frontier.pop() {
            for next in tag.successors() {
                if !seen.contains(next) {
                    seen.push(*next);
                    frontier.push(*next);
                }
            }
        }
        for tag in ActionTag::ALL {
            assert!(seen.contains(&tag), "{} is unreachable", tag);
        }
    }

    #[test]
    fn test_intent_targets() {
        assert!(ActionTag::Battle.is_intent_target());
        assert!(ActionTag::ReputationCheck.is_intent_target());
        assert!(!ActionTag::UsePotion.is_intent_target());
        assert!(!ActionTag::CompanionAccept.is_intent_target());
        assert!(!ActionTag::WaitInput.is_intent_target());
    }

    #[test]
    fn test_fail_safe_is_always_allowed() {
        for tag in ActionTag::ALL {
            assert!(tag.allows(ActionTag::WaitInput));
        }
        assert!(!ActionTag::Battle.allows(ActionTag::ShopPurchase));
    }
}
