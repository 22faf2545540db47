//! Application services - Use case implementations
//!
//! Each subsystem is a service that depends only on outbound ports. The
//! `GameEngine` in `game_orchestrator` wires them together and drives the
//! turn state machine.

pub mod battle_service;
pub mod character_creation_service;
pub mod companion_service;
mod game_error;
pub mod game_orchestrator;
pub mod inventory_service;
pub mod item_reward_service;
pub mod narration_service;
pub mod reputation_service;
pub mod shop_service;
pub mod story_context_service;

pub use game_error::GameError;
pub use game_orchestrator::GameEngine;
pub use narration_service::{
    fallback_companion, fallback_text, NarrationService, FALLBACK_STARTING_LOCATION,
};

// Re-export service traits and their implementations
#[allow(unused_imports)]
pub use battle_service::{BattleService, BattleServiceImpl};
#[allow(unused_imports)]
pub use companion_service::{CompanionService, CompanionServiceImpl};
#[allow(unused_imports)]
pub use inventory_service::{InventoryService, InventoryServiceImpl};
#[allow(unused_imports)]
pub use reputation_service::{ReputationService, ReputationServiceImpl};
#[allow(unused_imports)]
pub use shop_service::{ShopService, ShopServiceImpl};
pub use story_context_service::{InitializationError, StoryContext, StoryContextService};
