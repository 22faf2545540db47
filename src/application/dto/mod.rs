//! Data Transfer Objects - Session state and subsystem results
//!
//! DTOs live in the application layer: they are what the orchestrator
//! threads between steps and hands to the presentation loop.

mod game_state;
mod outcomes;

pub use game_state::{CharacterDraft, GameState, PendingDecision, PreparedCharacter};
pub use outcomes::{
    BattleOutcome, BattleRewards, GrantedItem, InventoryOutcome, MemberBattleReport,
    PurchaseReceipt, Restores, SubsystemResult,
};
