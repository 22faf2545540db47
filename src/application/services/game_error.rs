//! Error taxonomy shared by the game subsystems
//!
//! Only `Persistence` is fatal to a session. Every other variant is turned
//! into a player-facing message by the orchestrator, with the game state
//! left as it was.

use crate::application::ports::outbound::StoreError;
use crate::domain::value_objects::ReputationTier;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not enough gold: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("Not enough {item} in stock: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: i32,
        available: i32,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Access to {service} denied at {tier} standing")]
    AccessDenied {
        service: &'static str,
        tier: ReputationTier,
    },
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl GameError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Text shown to the player for a recoverable failure
    pub fn player_message(&self) -> String {
        match self {
            Self::NotFound(what) => format!("You can't do that right now: {} is nowhere to be found.", what),
            Self::InsufficientFunds { needed, available } => format!(
                "You don't have enough gold. You need {} gold but only carry {}.",
                needed, available
            ),
            Self::InsufficientStock {
                item,
                requested,
                available,
            } => format!(
                "The merchant only has {} {} in stock (you asked for {}).",
                available, item, requested
            ),
            Self::Validation(message) => message.clone(),
            Self::AccessDenied { service, tier } => format!(
                "Nobody will offer you {} while your reputation is {}.",
                service, tier
            ),
            Self::Persistence(message) => format!("The world store failed: {}", message),
        }
    }
}

impl From<StoreError> for GameError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{} {}", entity, id)),
            StoreError::Invalid(message) => Self::Validation(message),
            StoreError::Database(message) => Self::Persistence(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_persistence_is_fatal() {
        assert!(GameError::Persistence("disk gone".into()).is_fatal());
        assert!(!GameError::NotFound("x".into()).is_fatal());
        assert!(!GameError::InsufficientFunds { needed: 10, available: 5 }.is_fatal());
    }

    #[test]
    fn test_stock_shortfall_names_the_merchant() {
        let error = GameError::InsufficientStock {
            item: "reinforced shield".into(),
            requested: 4,
            available: 3,
        };
        assert_eq!(
            error.player_message(),
            "The merchant only has 3 reinforced shield in stock (you asked for 4)."
        );
    }

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        let missing: GameError = StoreError::NotFound {
            entity: "character",
            id: "abc".into(),
        }
        .into();
        assert_eq!(missing, GameError::NotFound("character abc".into()));

        let broken: GameError = StoreError::Database("locked".into()).into();
        assert!(broken.is_fatal());
    }
}
