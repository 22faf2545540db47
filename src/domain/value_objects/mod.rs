//! Value objects - Immutable objects defined by their attributes

mod action_tag;
mod character_class;
pub mod game_constants;
mod ids;
pub mod reputation;

pub use action_tag::ActionTag;
pub use character_class::{CharacterClass, CombatArchetype, Race, StartingStats};
pub use ids::*;
pub use reputation::{
    apply_to_price, can_access_service, ReputationAction, ReputationImpact, ReputationTier,
    ServiceKind, SpecialAction,
};
