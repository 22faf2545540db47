//! Companion Service - Recruitment and dismissal under the party cap
//!
//! The party holds the player plus at most `MAX_COMPANIONS` companions.
//! Companions are never deleted: dismissal only takes them out of the party
//! and leaves them at the edge of the current location.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::application::dto::{GameState, PendingDecision, SubsystemResult};
use crate::application::ports::outbound::{
    CompanionArchetype, NarrationContext, RecruitDecision, WorldStorePort,
};
use crate::application::services::{GameError, NarrationService};
use crate::domain::entities::{Character, CharacterKind, NewCharacter, NewStoryEvent};
use crate::domain::value_objects::game_constants::{event_types, MAX_COMPANIONS};
use crate::domain::value_objects::CharacterId;

const ACCEPT_WORDS: [&str; 4] = ["yes", "accept", "sure", "join"];
const REJECT_WORDS: [&str; 4] = ["no", "reject", "decline", "refuse"];
const CANCEL_WORDS: [&str; 4] = ["cancel", "stop", "back", "never mind"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecruitmentOffer {
    PartyFull { companions: usize },
    Open { archetype: CompanionArchetype },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recruitment {
    pub companion: Character,
    pub personality: String,
    pub reason_for_joining: String,
    pub reputation_change: Option<(i32, i32)>,
}

impl Recruitment {
    pub fn message(&self) -> String {
        let c = &self.companion;
        let mut text = format!(
            "{} the {} {} (Lv.{}) joins the party! {}\nPersonality: {}. Reason for joining: {}.",
            c.name, c.race, c.class, c.level, c.backstory, self.personality, self.reason_for_joining
        );
        if let Some((delta, now)) = self.reputation_change {
            text.push_str(&format!("\nReputation {:+} (now {}).", delta, now));
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DismissalOutcome {
    Cancelled,
    Reprompt(String),
    Dismissed {
        name: String,
        location: String,
        farewell: String,
    },
    NotInParty,
}

impl DismissalOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Cancelled => "You decide to keep the party as it is. What will you do?".to_string(),
            Self::Reprompt(prompt) => prompt.clone(),
            Self::Dismissed {
                name,
                location,
                farewell,
            } => format!("{}\n{} heads off towards {}.", farewell, name, location),
            Self::NotInParty => "There is no such companion in your party.".to_string(),
        }
    }
}

fn has_word(input: &str, words: &[&str]) -> bool {
    let lower = input.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| words.contains(&word))
}

/// Keyword reading of a reply to a recruitment offer
pub fn parse_recruit_decision(input: &str) -> Option<RecruitDecision> {
    if has_word(input, &ACCEPT_WORDS) {
        Some(RecruitDecision::Accept)
    } else if has_word(input, &REJECT_WORDS) {
        Some(RecruitDecision::Reject)
    } else {
        None
    }
}

fn is_cancel(input: &str) -> bool {
    let lower = input.to_lowercase();
    CANCEL_WORDS.iter().any(|word| lower.contains(word))
}

/// Reputation effect of taking on a companion, keyed to who answers the call
pub fn recruit_reputation_change(reputation: i32) -> Option<(i32, &'static str)> {
    if reputation <= -20 {
        Some((-2, "recruited a villain"))
    } else if reputation <= 0 {
        None
    } else {
        Some((3, "recruited a good companion"))
    }
}

pub fn farewell(name: &str, reputation: i32) -> String {
    if reputation <= -20 {
        format!("{} spits on the ground and leaves without a word.", name)
    } else if reputation <= 0 {
        format!("{} shrugs. \"Suit yourself. Good luck out there.\"", name)
    } else {
        format!(
            "{} smiles warmly. \"It was an honour. Call on me if you ever need help.\"",
            name
        )
    }
}

#[async_trait]
pub trait CompanionService: Send + Sync {
    /// Open a recruitment offer, or report a full party without one
    async fn open_recruitment(&self, state: GameState) -> Result<(GameState, RecruitmentOffer), GameError>;

    /// Keywords first, then the narrator's classifier
    async fn decide(&self, input: &str, context: &NarrationContext) -> RecruitDecision;

    /// `None` when the party filled up in the meantime
    async fn accept(
        &self,
        state: GameState,
        context: &NarrationContext,
    ) -> Result<(GameState, Option<Recruitment>), GameError>;

    fn reject(&self, state: GameState) -> GameState;

    /// Companions currently in the party
    async fn list(&self) -> Result<Vec<Character>, GameError>;

    /// List dismissable companions and open the choice
    async fn begin_dismissal(&self, state: GameState) -> Result<(GameState, Vec<Character>), GameError>;

    /// Interpret the reply to a dismissal prompt
    async fn resolve_dismissal(
        &self,
        state: GameState,
        input: &str,
    ) -> Result<(GameState, DismissalOutcome), GameError>;

    async fn dismiss(
        &self,
        state: GameState,
        companion_id: CharacterId,
    ) -> Result<(GameState, DismissalOutcome), GameError>;
}

pub struct CompanionServiceImpl {
    store: Arc<dyn WorldStorePort>,
    narration: Arc<NarrationService>,
}

impl CompanionServiceImpl {
    pub fn new(store: Arc<dyn WorldStorePort>, narration: Arc<NarrationService>) -> Self {
        Self { store, narration }
    }

    fn player_id(state: &GameState) -> Result<CharacterId, GameError> {
        state
            .player_id
            .ok_or_else(|| GameError::NotFound("active player".to_string()))
    }
}

#[async_trait]
impl CompanionService for CompanionServiceImpl {
    #[instrument(skip(self, state))]
    async fn open_recruitment(&self, state: GameState) -> Result<(GameState, RecruitmentOffer), GameError> {
        let player = self.store.get_character(Self::player_id(&state)?).await?;
        let companions = self.list().await?.len();

        if companions >= MAX_COMPANIONS {
            debug!(companions, "Party full, no recruitment offer");
            return Ok((state.with_pending(None), RecruitmentOffer::PartyFull { companions }));
        }

        let archetype = CompanionArchetype::from_reputation(player.reputation);
        let state = state.with_pending(Some(PendingDecision::RecruitOffer { archetype }));
        Ok((state, RecruitmentOffer::Open { archetype }))
    }

    async fn decide(&self, input: &str, context: &NarrationContext) -> RecruitDecision {
        match parse_recruit_decision(input) {
            Some(decision) => decision,
            None => self.narration.classify_decision(input, context).await,
        }
    }

    #[instrument(skip(self, state, context))]
    async fn accept(
        &self,
        state: GameState,
        context: &NarrationContext,
    ) -> Result<(GameState, Option<Recruitment>), GameError> {
        let player_id = Self::player_id(&state)?;
        let player = self.store.get_character(player_id).await?;

        if self.list().await?.len() >= MAX_COMPANIONS {
            return Ok((state.with_pending(None), None));
        }

        let archetype = match &state.pending {
            Some(PendingDecision::RecruitOffer { archetype }) => *archetype,
            _ => CompanionArchetype::from_reputation(player.reputation),
        };
        let profile = self.narration.generate_companion(archetype, context).await;

        let companion_id = self
            .store
            .create_character(
                NewCharacter::new(&profile.name, CharacterKind::Companion, &profile.race, &profile.class)
                    .with_vitals(profile.max_hp, profile.max_mp)
                    .with_stats(profile.strength, profile.agility, profile.intelligence)
                    .with_level(profile.level)
                    .at(&state.current_location)
                    .in_party()
                    .with_backstory(&profile.backstory),
            )
            .await?;

        let reputation_change = match recruit_reputation_change(player.reputation) {
            Some((delta, reason)) => {
                let now = self
                    .store
                    .update_reputation(player_id, delta, reason, &state.current_location)
                    .await?;
                Some((delta, now))
            }
            None => None,
        };

        self.store
            .add_story_event(
                NewStoryEvent::new(
                    player_id,
                    event_types::PERMANENT_EVENT,
                    format!("companion recruit: {} the {} {}", profile.name, profile.race, profile.class),
                    &state.current_location,
                    state.turn,
                )
                .with_deltas(reputation_change.map(|(delta, _)| delta).unwrap_or(0), 0),
            )
            .await?;

        let companion = self.store.get_character(companion_id).await?;
        info!(companion = %companion.name, "Companion recruited");

        let state = state
            .with_companion(companion_id)
            .with_pending(None)
            .with_result(SubsystemResult::Recruited {
                companion_id,
                name: companion.name.clone(),
            });
        Ok((
            state,
            Some(Recruitment {
                companion,
                personality: profile.personality,
                reason_for_joining: profile.reason_for_joining,
                reputation_change,
            }),
        ))
    }

    fn reject(&self, state: GameState) -> GameState {
        state.with_pending(None)
    }

    async fn list(&self) -> Result<Vec<Character>, GameError> {
        let party = self.store.get_party_status().await?;
        Ok(party
            .into_iter()
            .filter(|member| member.kind == CharacterKind::Companion)
            .collect())
    }

    #[instrument(skip(self, state))]
    async fn begin_dismissal(&self, state: GameState) -> Result<(GameState, Vec<Character>), GameError> {
        let companions = self.list().await?;
        if companions.is_empty() {
            return Ok((state.with_pending(None), companions));
        }

        let candidates = companions.iter().map(|c| (c.id, c.name.clone())).collect();
        let state = state.with_pending(Some(PendingDecision::DismissChoice { candidates }));
        Ok((state, companions))
    }

    #[instrument(skip(self, state))]
    async fn resolve_dismissal(
        &self,
        state: GameState,
        input: &str,
    ) -> Result<(GameState, DismissalOutcome), GameError> {
        if is_cancel(input) {
            return Ok((state.with_pending(None), DismissalOutcome::Cancelled));
        }

        let candidates = match &state.pending {
            Some(PendingDecision::DismissChoice { candidates }) => candidates.clone(),
            _ => Vec::new(),
        };
        if candidates.is_empty() {
            return Ok((state.with_pending(None), DismissalOutcome::NotInParty));
        }

        let choice = input
            .split(|c: char| !c.is_ascii_digit())
            .find_map(|token| token.parse::<usize>().ok());

        match choice {
            Some(n) if (1..=candidates.len()).contains(&n) => {
                let (companion_id, _) = candidates[n - 1];
                self.dismiss(state, companion_id).await
            }
            _ => Ok((
                state,
                DismissalOutcome::Reprompt(format!(
                    "Enter a number between 1 and {}, or 'cancel'.",
                    candidates.len()
                )),
            )),
        }
    }

    #[instrument(skip(self, state))]
    async fn dismiss(
        &self,
        state: GameState,
        companion_id: CharacterId,
    ) -> Result<(GameState, DismissalOutcome), GameError> {
        let player_id = Self::player_id(&state)?;

        let companion = match self.store.get_character(companion_id).await {
            Ok(companion) => companion,
            Err(e) => match GameError::from(e) {
                GameError::NotFound(_) => {
                    let state = state.without_companion(companion_id).with_pending(None);
                    return Ok((state, DismissalOutcome::NotInParty));
                }
                other => return Err(other),
            },
        };
        if companion.kind != CharacterKind::Companion || !companion.is_in_party {
            let state = state.without_companion(companion_id).with_pending(None);
            return Ok((state, DismissalOutcome::NotInParty));
        }

        let player = self.store.get_character(player_id).await?;
        let new_location = format!("{} outskirts", state.current_location);
        self.store
            .set_party_membership(companion_id, false, &new_location)
            .await?;
        self.store
            .add_story_event(NewStoryEvent::new(
                player_id,
                event_types::PERMANENT_EVENT,
                format!("companion dismiss: parted ways with {}", companion.name),
                &state.current_location,
                state.turn,
            ))
            .await?;

        info!(companion = %companion.name, "Companion dismissed");

        let outcome = DismissalOutcome::Dismissed {
            name: companion.name.clone(),
            location: new_location,
            farewell: farewell(&companion.name, player.reputation),
        };
        let state = state
            .without_companion(companion_id)
            .with_pending(None)
            .with_result(SubsystemResult::Dismissed {
                companion_id,
                name: companion.name,
            });
        Ok((state, outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::ports::outbound::{MockNarratorPort, NarratorError};
    use crate::infrastructure::persistence::SqliteWorldStore;

    struct Fixture {
        store: Arc<SqliteWorldStore>,
        service: CompanionServiceImpl,
        state: GameState,
    }

    fn offline_narration() -> Arc<NarrationService> {
        let mut narrator = MockNarratorPort::new();
        narrator
            .expect_generate_companion()
            .returning(|_, _| Err(NarratorError::Unavailable("offline".into())));
        narrator
            .expect_classify_decision()
            .returning(|_, _| Ok(RecruitDecision::Accept));
        Arc::new(NarrationService::new(Arc::new(narrator), Duration::from_secs(1)))
    }

    async fn setup(reputation: i32) -> Fixture {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let player_id = store
            .create_character(
                NewCharacter::new("Aria", CharacterKind::Player, "elf", "mage")
                    .in_party()
                    .with_wealth(reputation, 300),
            )
            .await
            .unwrap();
        let mut state = GameState::new().with_location("Harbor Town");
        state.player_id = Some(player_id);
        Fixture {
            service: CompanionServiceImpl::new(store.clone(), offline_narration()),
            store,
            state,
        }
    }

    fn context() -> NarrationContext {
        NarrationContext::new("Aria", "Harbor Town", 0)
    }

    async fn recruit(f: &Fixture, state: GameState) -> GameState {
        let (state, offer) = f.service.open_recruitment(state).await.unwrap();
        assert!(matches!(offer, RecruitmentOffer::Open { .. }));
        let (state, recruitment) = f.service.accept(state, &context()).await.unwrap();
        assert!(recruitment.is_some());
        state
    }

    #[test]
    fn test_decision_keywords() {
        assert_eq!(parse_recruit_decision("Yes, join us!"), Some(RecruitDecision::Accept));
        assert_eq!(parse_recruit_decision("no thanks"), Some(RecruitDecision::Reject));
        assert_eq!(parse_recruit_decision("I decline"), Some(RecruitDecision::Reject));
        assert_eq!(parse_recruit_decision("hmm, tell me more"), None);
        assert_eq!(parse_recruit_decision("nobody"), None);
    }

    #[test]
    fn test_recruit_reputation_change_bands() {
        assert_eq!(recruit_reputation_change(-20), Some((-2, "recruited a villain")));
        assert_eq!(recruit_reputation_change(0), None);
        assert_eq!(recruit_reputation_change(1), Some((3, "recruited a good companion")));
    }

    #[tokio::test]
    async fn test_accept_creates_party_member_with_fallback_profile() {
        let f = setup(30).await;
        let state = recruit(&f, f.state.clone()).await;

        assert_eq!(state.companion_ids.len(), 1);
        assert!(state.pending.is_none());
        let companion = f.store.get_character(state.companion_ids[0]).await.unwrap();
        assert_eq!(companion.kind, CharacterKind::Companion);
        assert!(companion.is_in_party);
        assert_eq!((companion.max_hp, companion.max_mp, companion.level), (100, 30, 2));
        assert_eq!(companion.current_location, "Harbor Town");

        let player = f.store.get_character(state.player_id.unwrap()).await.unwrap();
        assert_eq!(player.reputation, 33);
        assert_eq!(
            f.store
                .count_events(player.id, event_types::PERMANENT_EVENT)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_neutral_recruit_leaves_reputation_alone() {
        let f = setup(0).await;
        let state = recruit(&f, f.state.clone()).await;
        let player_id = state.player_id.unwrap();
        assert!(f.store.get_reputation_history(player_id, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_party_cap_is_enforced() {
        let f = setup(10).await;
        let state = recruit(&f, f.state.clone()).await;
        let state = recruit(&f, state).await;

        let (state, offer) = f.service.open_recruitment(state).await.unwrap();
        assert_eq!(offer, RecruitmentOffer::PartyFull { companions: 2 });
        assert!(state.pending.is_none());

        let (state, recruitment) = f.service.accept(state, &context()).await.unwrap();
        assert!(recruitment.is_none());
        assert_eq!(state.companion_ids.len(), 2);
        assert_eq!(f.service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dismissal_flow() {
        let f = setup(-30).await;
        let state = recruit(&f, f.state.clone()).await;
        let companion_id = state.companion_ids[0];

        let (state, listed) = f.service.begin_dismissal(state).await.unwrap();
        assert_eq!(listed.len(), 1);

        let (state, outcome) = f.service.resolve_dismissal(state, "number 5").await.unwrap();
        assert!(matches!(outcome, DismissalOutcome::Reprompt(_)));
        assert!(state.pending.is_some());

        let (state, outcome) = f.service.resolve_dismissal(state, "1").await.unwrap();
        match outcome {
            DismissalOutcome::Dismissed { location, farewell, .. } => {
                assert_eq!(location, "Harbor Town outskirts");
                assert!(farewell.contains("without a word"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(state.companion_ids.is_empty());
        assert!(state.pending.is_none());

        let companion = f.store.get_character(companion_id).await.unwrap();
        assert!(!companion.is_in_party);
        assert_eq!(companion.current_location, "Harbor Town outskirts");
    }

    #[tokio::test]
    async fn test_dismissing_absent_companion_is_a_no_op() {
        let f = setup(0).await;
        let (state, outcome) = f.service.dismiss(f.state.clone(), CharacterId::new()).await.unwrap();
        assert_eq!(outcome, DismissalOutcome::NotInParty);
        assert_eq!(state.companion_ids, f.state.companion_ids);

        let state = recruit(&f, f.state.clone()).await;
        let companion_id = state.companion_ids[0];
        let (state, _) = f.service.dismiss(state, companion_id).await.unwrap();
        let (_, again) = f.service.dismiss(state, companion_id).await.unwrap();
        assert_eq!(again, DismissalOutcome::NotInParty);
    }

    #[tokio::test]
    async fn test_cancel_dismissal() {
        let f = setup(0).await;
        let state = recruit(&f, f.state.clone()).await;
        let (state, _) = f.service.begin_dismissal(state).await.unwrap();
        let (state, outcome) = f.service.resolve_dismissal(state, "never mind").await.unwrap();
        assert_eq!(outcome, DismissalOutcome::Cancelled);
        assert_eq!(state.companion_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_decision_goes_to_classifier() {
        let f = setup(0).await;
        let decision = f.service.decide("perhaps, why not", &context()).await;
        assert_eq!(decision, RecruitDecision::Accept);
    }
}
