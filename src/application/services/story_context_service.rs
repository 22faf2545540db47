//! Story context - what the narrator needs to know about the session

use std::sync::Arc;

use crate::application::dto::GameState;
use crate::application::ports::outbound::{NarrationContext, StoreError, WorldStorePort};
use crate::application::services::GameError;
use crate::domain::entities::{Character, CharacterKind};
use crate::domain::value_objects::game_constants::event_types;
use crate::domain::value_objects::reputation::status_message;
use crate::domain::value_objects::{CharacterId, ReputationTier};

const RECENT_EVENT_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InitializationError {
    #[error("No active player in this session")]
    NoActivePlayer,
    #[error("Player record {0} is missing")]
    PlayerMissing(CharacterId),
    #[error("World store unavailable: {0}")]
    Store(StoreError),
}

impl From<InitializationError> for GameError {
    fn from(error: InitializationError) -> Self {
        match error {
            InitializationError::Store(e) => e.into(),
            other => Self::NotFound(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryContext {
    pub player: Character,
    pub companions: Vec<Character>,
    pub location: String,
    pub objective: String,
    pub recent_events: Vec<String>,
    pub turn: u32,
    pub adventure_count: u32,
    pub reputation: i32,
    pub tier: ReputationTier,
}

impl StoryContext {
    pub fn player_summary(&self) -> String {
        format!("{} | {}", self.player.summary(), self.player.vitals())
    }

    pub fn party_summaries(&self) -> Vec<String> {
        if self.companions.is_empty() {
            return vec!["adventuring alone".to_string()];
        }
        self.companions
            .iter()
            .map(|c| format!("{} | {}", c.summary(), c.vitals()))
            .collect()
    }

    pub fn narration(&self, input: &str) -> NarrationContext {
        let mut facts = vec![
            self.player_summary(),
            status_message(self.reputation),
            format!("turn {}, adventures so far: {}", self.turn, self.adventure_count),
        ];
        facts.extend(self.recent_events.iter().map(|event| format!("recently: {}", event)));

        NarrationContext::new(&self.player.name, &self.location, self.reputation)
            .with_objective(&self.objective)
            .with_party(self.companions.iter().map(|c| c.name.clone()).collect())
            .with_input(input)
            .with_facts(facts)
    }
}

pub struct StoryContextService {
    store: Arc<dyn WorldStorePort>,
}

impl StoryContextService {
    pub fn new(store: Arc<dyn WorldStorePort>) -> Self {
        Self { store }
    }

    pub async fn build(&self, state: &GameState) -> Result<StoryContext, InitializationError> {
        let player_id = state.player_id.ok_or(InitializationError::NoActivePlayer)?;
        let store_error = |e: StoreError| match e {
            StoreError::NotFound { .. } => InitializationError::PlayerMissing(player_id),
            other => InitializationError::Store(other),
        };

        let player = self.store.get_character(player_id).await.map_err(store_error)?;
        let companions = self
            .store
            .get_party_status()
            .await
            .map_err(store_error)?
            .into_iter()
            .filter(|member| member.kind == CharacterKind::Companion)
            .collect();
        let recent_events = self
            .store
            .get_recent_events(player_id, RECENT_EVENT_LIMIT)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|event| event.description)
            .collect();
        let adventure_count = self
            .store
            .count_events(player_id, event_types::PERMANENT_EVENT)
            .await
            .map_err(store_error)?;

        let location = if state.current_location.is_empty() {
            player.current_location.clone()
        } else {
            state.current_location.clone()
        };

        Ok(StoryContext {
            reputation: player.reputation,
            tier: ReputationTier::from_score(player.reputation),
            player,
            companions,
            location,
            objective: state.current_objective.clone(),
            recent_events,
            turn: state.turn,
            adventure_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewCharacter, NewStoryEvent};
    use crate::infrastructure::persistence::SqliteWorldStore;

    #[tokio::test]
    async fn test_uninitialized_session_is_an_error() {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let service = StoryContextService::new(store);

        let result = service.build(&GameState::new()).await;
        assert_eq!(result.unwrap_err(), InitializationError::NoActivePlayer);

        let mut state = GameState::new();
        let ghost = CharacterId::new();
        state.player_id = Some(ghost);
        assert_eq!(
            service.build(&state).await.unwrap_err(),
            InitializationError::PlayerMissing(ghost)
        );
    }

    #[tokio::test]
    async fn test_context_for_solo_player() {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let player_id = store
            .create_character(
                NewCharacter::new("Aria", CharacterKind::Player, "elf", "mage")
                    .at("Harbor Town")
                    .in_party()
                    .with_wealth(25, 300),
            )
            .await
            .unwrap();
        for turn in 1..=7 {
            store
                .add_story_event(NewStoryEvent::new(
                    player_id,
                    event_types::PERMANENT_EVENT,
                    format!("event {}", turn),
                    "Harbor Town",
                    turn,
                ))
                .await
                .unwrap();
        }

        let mut state = GameState::new();
        state.player_id = Some(player_id);
        state.current_objective = "Begin a new adventure".to_string();
        state.turn = 7;

        let context = StoryContextService::new(store).build(&state).await.unwrap();

        assert_eq!(context.location, "Harbor Town");
        assert_eq!(context.party_summaries(), vec!["adventuring alone"]);
        assert_eq!(context.recent_events.len(), 5);
        assert_eq!(context.recent_events[0], "event 7");
        assert_eq!(context.adventure_count, 7);
        assert_eq!(context.tier, ReputationTier::Friendly);

        let narration = context.narration("look around");
        assert_eq!(narration.player, "Aria");
        assert_eq!(narration.objective, "Begin a new adventure");
        assert!(narration.party.is_empty());
        assert!(narration.facts.iter().any(|f| f == "Reputation: 25 (Friendly)"));
    }
}
