//! Game Orchestrator - the turn state machine
//!
//! `GameEngine::step` takes the session state and one line of player input
//! and drives the state machine until it needs input again. The line is
//! consumed by the first input-awaiting state; every state after that runs
//! on what the previous ones left in the `GameState`.
//!
//! Transitions are checked against `ActionTag::allows`. A subsystem that
//! asks for an inadmissible successor is overridden to `WaitInput`, and a
//! recoverable `GameError` becomes a message for the player plus the same
//! fail-safe. Only persistence failures leave `step` as errors.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::application::dto::{GameState, PendingDecision, SubsystemResult};
use crate::application::ports::outbound::{
    NarrationContext, NarrationKind, NarratorPort, RandomPort, RecruitDecision, WorldStorePort,
};
use crate::application::services::battle_service::{BattleService, BattleServiceImpl};
use crate::application::services::character_creation_service::{
    character_sheet, creation_help, creation_prompt, parse_character_input, CharacterCreationService,
    OPENING_OBJECTIVE,
};
use crate::application::services::companion_service::{
    CompanionService, CompanionServiceImpl, DismissalOutcome, RecruitmentOffer,
};
use crate::application::services::inventory_service::{
    InventoryCommand, InventoryService, InventoryServiceImpl,
};
use crate::application::services::item_reward_service::ItemRewardService;
use crate::application::services::reputation_service::{ReputationService, ReputationServiceImpl};
use crate::application::services::shop_service::{parse_quantity, ShopService, ShopServiceImpl};
use crate::application::services::story_context_service::{InitializationError, StoryContextService};
use crate::application::services::{GameError, NarrationService};
use crate::domain::entities::{match_catalog_entry, NewStoryEvent, QuestKind};
use crate::domain::value_objects::game_constants::{event_types, STARTING_GOLD, STARTING_REPUTATION};
use crate::domain::value_objects::{ActionTag, CharacterId};

/// Upper bound on dispatches within one step
const MAX_DISPATCHES: usize = 32;

/// Important events containing one of these are kept as permanent story events
const PERMANENT_KEYWORDS: [&str; 5] = [
    "companion recruit",
    "companion dismiss",
    "boss kill",
    "level up",
    "quest complete",
];

const INVENTORY_MENU: &str = "Inventory: 'use potion', 'heal' (priest spell) or 'close'.";

pub struct GameEngine {
    store: Arc<dyn WorldStorePort>,
    narration: Arc<NarrationService>,
    story_context: StoryContextService,
    creation: CharacterCreationService,
    rewards: ItemRewardService,
    battle: Arc<dyn BattleService>,
    inventory: Arc<dyn InventoryService>,
    shop: Arc<dyn ShopService>,
    companions: Arc<dyn CompanionService>,
    reputation: Arc<dyn ReputationService>,
}

impl GameEngine {
    pub fn new(
        store: Arc<dyn WorldStorePort>,
        narrator: Arc<dyn NarratorPort>,
        random: Arc<dyn RandomPort>,
        narrator_timeout: Duration,
    ) -> Self {
        let narration = Arc::new(NarrationService::new(narrator, narrator_timeout));

        Self {
            story_context: StoryContextService::new(store.clone()),
            creation: CharacterCreationService::new(store.clone(), narration.clone()),
            rewards: ItemRewardService::new(store.clone(), random.clone()),
            battle: Arc::new(BattleServiceImpl::new(store.clone(), random)),
            inventory: Arc::new(InventoryServiceImpl::new(store.clone())),
            shop: Arc::new(ShopServiceImpl::new(store.clone())),
            companions: Arc::new(CompanionServiceImpl::new(store.clone(), narration.clone())),
            reputation: Arc::new(ReputationServiceImpl::new(store.clone())),
            narration,
            store,
        }
    }

    /// Messages shown before the first step of a new session
    pub fn intro(&self) -> Vec<String> {
        vec![
            "Welcome to the realm, adventurer.".to_string(),
            creation_prompt(),
        ]
    }

    /// Advance the session by one line of player input
    #[instrument(skip(self, state, input), fields(action = state.action.as_str(), turn = state.turn))]
    pub async fn step(&self, state: GameState, input: &str) -> Result<(GameState, Vec<String>), GameError> {
        let mut messages = Vec::new();
        let mut state = state;
        let mut input = Some(input.trim());

        for _ in 0..MAX_DISPATCHES {
            let current = state.action;
            let line = if current.awaits_input() {
                match input.take() {
                    Some(line) => line,
                    None => return Ok((state, messages)),
                }
            } else {
                ""
            };

            let next_state = match self.dispatch(current, state.clone(), line, &mut messages).await {
                Ok(next_state) => next_state,
                Err(e) if e.is_fatal() => {
                    error!(error = %e, action = current.as_str(), "Fatal error, ending step");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, action = current.as_str(), "Subsystem failed, recovering");
                    messages.push(e.player_message());
                    state.with_pending(None).with_action(recovery_target(current))
                }
            };

            let next = next_state.action;
            state = if current.allows(next) {
                debug!(from = current.as_str(), to = next.as_str(), "Transition");
                next_state
            } else {
                warn!(
                    from = current.as_str(),
                    to = next.as_str(),
                    "Inadmissible transition, falling back to wait_input"
                );
                next_state.with_action(ActionTag::WaitInput)
            };
        }

        warn!("Dispatch limit reached, falling back to wait_input");
        Ok((state.with_action(ActionTag::WaitInput), messages))
    }

    async fn dispatch(
        &self,
        action: ActionTag,
        state: GameState,
        input: &str,
        out: &mut Vec<String>,
    ) -> Result<GameState, GameError> {
        match action {
            ActionTag::CharacterCreation => self.character_creation(state, input, out).await,
            ActionTag::MainStoryStart => self.main_story_start(state, out).await,
            ActionTag::WaitInput => Ok(wait_input(state, input, out)),
            ActionTag::IntentAnalysis => self.intent_analysis(state, out).await,
            ActionTag::StoryContinue => self.story_continue(state, out).await,
            ActionTag::Battle => self.battle(state, out).await,
            ActionTag::ItemReward => self.item_reward(state, out).await,
            ActionTag::CompanionOpportunity => self.companion_opportunity(state, out).await,
            ActionTag::CompanionDecision => self.companion_decision(state, input).await,
            ActionTag::CompanionAccept => self.companion_accept(state, out).await,
            ActionTag::CompanionReject => self.companion_reject(state, out).await,
            ActionTag::CompanionList => self.companion_list(state, out).await,
            ActionTag::CompanionDismiss => self.companion_dismiss(state, out).await,
            ActionTag::CompanionDismissDecision => self.companion_dismiss_decision(state, input, out).await,
            ActionTag::Inventory => self.open_inventory(state, out).await,
            ActionTag::InventoryAction => Ok(inventory_action(state, input, out)),
            ActionTag::UsePotion => self.use_potion(state, out).await,
            ActionTag::UseHeal => self.use_heal(state, out).await,
            ActionTag::ShopPurchase => self.shop_purchase(state, out).await,
            ActionTag::ReputationCheck => self.reputation_check(state, out).await,
        }
    }

    async fn narration_context(&self, state: &GameState) -> Result<NarrationContext, GameError> {
        Ok(self.story_context.build(state).await?.narration(&state.last_input))
    }

    // ===== Character creation =====

    async fn character_creation(
        &self,
        state: GameState,
        input: &str,
        out: &mut Vec<String>,
    ) -> Result<GameState, GameError> {
        if input.is_empty() {
            out.push(creation_prompt());
            return Ok(state.with_action(ActionTag::CharacterCreation));
        }
        if input.eq_ignore_ascii_case("help") {
            out.push(creation_help());
            return Ok(state.with_action(ActionTag::CharacterCreation));
        }

        let draft = parse_character_input(input)?;
        let prepared = self.creation.prepare(draft).await;
        out.push(character_sheet(&prepared));

        Ok(GameState {
            draft: Some(prepared),
            ..state
        }
        .with_action(ActionTag::MainStoryStart))
    }

    async fn main_story_start(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let Some(prepared) = state.draft.clone() else {
            out.push(creation_prompt());
            return Ok(state.with_action(ActionTag::CharacterCreation));
        };

        let player_id = self.creation.create_player(&prepared).await?;
        info!(player_id = %player_id, location = %prepared.starting_location, "Adventure begins");

        let state = GameState {
            player_id: Some(player_id),
            companion_ids: Vec::new(),
            current_objective: OPENING_OBJECTIVE.to_string(),
            draft: None,
            ..state
        }
        .with_location(&prepared.starting_location)
        .with_gold(STARTING_GOLD);

        let context = NarrationContext::new(&prepared.draft.name, &state.current_location, STARTING_REPUTATION)
            .with_objective(OPENING_OBJECTIVE)
            .with_facts(vec![prepared.backstory.clone()]);
        out.push(self.narration.narrate(NarrationKind::CreationStory, &context).await);

        Ok(state.with_action(ActionTag::WaitInput))
    }

    // ===== Intent analysis =====

    async fn intent_analysis(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let context = match self.story_context.build(&state).await {
            Ok(context) => context,
            Err(InitializationError::Store(e)) => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Session not initialized, returning to character creation");
                out.push("Your adventure has not begun yet. Create your character first.".to_string());
                out.push(creation_prompt());
                return Ok(state.with_pending(None).with_action(ActionTag::CharacterCreation));
            }
        };
        let player_id = context.player.id;

        let analysis = self
            .narration
            .classify_intent(&state.last_input, &context.narration(&state.last_input))
            .await;
        debug!(action = analysis.action.as_str(), reason = %analysis.reason, "Intent classified");
        if !analysis.story_response.trim().is_empty() {
            out.push(analysis.story_response.trim().to_string());
        }

        let mut state = state;
        if let Some(location) = analysis
            .location_update
            .as_deref()
            .map(str::trim)
            .filter(|location| !location.is_empty())
        {
            info!(location, "Party moves on");
            state = state.with_location(location);
        }

        if let Some(reputation) = self
            .reputation
            .apply_intent(player_id, &analysis, &state.current_location)
            .await?
        {
            debug!(reputation, "Reputation after action");
        }

        if let Some(event) = analysis.important_event.as_deref() {
            self.record_important_event(&state, player_id, event, out).await?;
        }

        let next = if analysis.action.is_intent_target() {
            analysis.action
        } else {
            ActionTag::WaitInput
        };
        Ok(state.with_result(SubsystemResult::Intent(analysis)).with_action(next))
    }

    async fn record_important_event(
        &self,
        state: &GameState,
        player_id: CharacterId,
        event: &str,
        out: &mut Vec<String>,
    ) -> Result<(), GameError> {
        let lower = event.to_lowercase();
        if PERMANENT_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
            self.store
                .add_story_event(NewStoryEvent::new(
                    player_id,
                    event_types::PERMANENT_EVENT,
                    event,
                    &state.current_location,
                    state.turn,
                ))
                .await?;
        }

        if lower.contains("quest complete") {
            let reward = self
                .rewards
                .quest_reward(player_id, QuestKind::from_text(event), &state.current_location, state.turn)
                .await?;
            out.push(reward.message());
        }
        Ok(())
    }

    async fn story_continue(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let context = self.narration_context(&state).await?;
        out.push(self.narration.narrate(NarrationKind::StoryContinue, &context).await);
        Ok(state.with_action(ActionTag::WaitInput))
    }

    // ===== Battle and rewards =====

    async fn battle(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let player_id = require_player(&state)?;
        let outcome = self
            .battle
            .fight(player_id, &state.current_location, state.turn)
            .await?;

        let summary = outcome.summary_lines();
        let context = self
            .narration_context(&state)
            .await?
            .with_party(outcome.participants())
            .with_facts(summary.clone());
        out.push(self.narration.narrate(NarrationKind::BattleScene, &context).await);
        out.push(summary.join("\n"));

        Ok(state
            .with_gold(outcome.gold_after)
            .with_result(SubsystemResult::Battle(outcome))
            .with_action(ActionTag::ItemReward))
    }

    async fn item_reward(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let player_id = require_player(&state)?;
        let granted = match &state.last_result {
            Some(SubsystemResult::Battle(outcome)) => {
                self.rewards
                    .battle_rewards(player_id, outcome.total_damage, outcome.critical_hitters.len())
                    .await?
            }
            _ => self.rewards.exploration_rewards(player_id).await?,
        };

        if granted.is_empty() {
            out.push("You search around but find nothing worth keeping.".to_string());
        } else {
            let names: Vec<String> = granted.iter().map(ToString::to_string).collect();
            out.push(format!("You obtained: {}", names.join(", ")));
        }

        Ok(state
            .with_result(SubsystemResult::Rewards(granted))
            .with_action(ActionTag::WaitInput))
    }

    // ===== Companions =====

    async fn companion_opportunity(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let (state, offer) = self.companions.open_recruitment(state).await?;

        match offer {
            RecruitmentOffer::PartyFull { companions } => {
                out.push(format!(
                    "Your party is full ({} companions). Dismiss someone before taking on another.",
                    companions
                ));
                Ok(state.with_action(ActionTag::WaitInput))
            }
            RecruitmentOffer::Open { archetype } => {
                let context = self
                    .narration_context(&state)
                    .await?
                    .with_facts(vec![format!("the newcomer is a {}", archetype.description())]);
                out.push(self.narration.narrate(NarrationKind::CompanionOpportunity, &context).await);
                Ok(state.with_action(ActionTag::CompanionDecision))
            }
        }
    }

    async fn companion_decision(&self, state: GameState, input: &str) -> Result<GameState, GameError> {
        let context = self.narration_context(&state).await?.with_input(input);
        let next = match self.companions.decide(input, &context).await {
            RecruitDecision::Accept => ActionTag::CompanionAccept,
            RecruitDecision::Reject => ActionTag::CompanionReject,
        };
        Ok(state.with_action(next))
    }

    async fn companion_accept(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let context = self.narration_context(&state).await?;
        let (state, recruitment) = self.companions.accept(state, &context).await?;

        match recruitment {
            Some(recruitment) => out.push(recruitment.message()),
            None => out.push("Your party filled up before the newcomer could join.".to_string()),
        }
        Ok(state.with_action(ActionTag::WaitInput))
    }

    async fn companion_reject(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let context = self.narration_context(&state).await?;
        out.push(self.narration.narrate(NarrationKind::CompanionReject, &context).await);
        Ok(self.companions.reject(state).with_action(ActionTag::WaitInput))
    }

    async fn companion_list(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let companions = self.companions.list().await?;

        if companions.is_empty() {
            out.push("You are adventuring alone. Look for travellers who might join you.".to_string());
        } else {
            let mut lines = vec!["Your companions:".to_string()];
            for companion in &companions {
                lines.push(format!("  {} | {}", companion.summary(), companion.vitals()));
                if !companion.backstory.is_empty() {
                    lines.push(format!("    {}", companion.backstory));
                }
            }
            out.push(lines.join("\n"));
        }
        Ok(state.with_action(ActionTag::WaitInput))
    }

    async fn companion_dismiss(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let (state, companions) = self.companions.begin_dismissal(state).await?;

        if companions.is_empty() {
            out.push("You have no companions to part ways with.".to_string());
            return Ok(state.with_action(ActionTag::WaitInput));
        }

        let mut lines = vec!["Who should leave the party?".to_string()];
        for (index, companion) in companions.iter().enumerate() {
            lines.push(format!(
                "  {}. {} ({}, Lv.{})",
                index + 1,
                companion.name,
                companion.class,
                companion.level
            ));
        }
        lines.push("Enter a number, or 'cancel'.".to_string());
        out.push(lines.join("\n"));

        Ok(state.with_action(ActionTag::CompanionDismissDecision))
    }

    async fn companion_dismiss_decision(
        &self,
        state: GameState,
        input: &str,
        out: &mut Vec<String>,
    ) -> Result<GameState, GameError> {
        let (state, outcome) = self.companions.resolve_dismissal(state, input).await?;
        out.push(outcome.message());

        let next = match outcome {
            DismissalOutcome::Reprompt(_) => ActionTag::CompanionDismissDecision,
            _ => ActionTag::WaitInput,
        };
        Ok(state.with_action(next))
    }

    // ===== Inventory =====

    async fn open_inventory(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let player_id = require_player(&state)?;
        out.push(self.inventory.display(player_id).await?);
        out.push(INVENTORY_MENU.to_string());

        Ok(state
            .with_pending(Some(PendingDecision::InventoryOpen))
            .with_action(ActionTag::InventoryAction))
    }

    async fn use_potion(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let player_id = require_player(&state)?;
        let outcome = self.inventory.use_potion(player_id).await?;
        out.push(outcome.message());
        out.push(INVENTORY_MENU.to_string());

        Ok(state
            .with_result(SubsystemResult::Inventory(outcome))
            .with_action(ActionTag::InventoryAction))
    }

    async fn use_heal(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let outcome = self.inventory.use_heal_spell().await?;
        out.push(outcome.message());
        out.push(INVENTORY_MENU.to_string());

        Ok(state
            .with_result(SubsystemResult::Inventory(outcome))
            .with_action(ActionTag::InventoryAction))
    }

    // ===== Shop and reputation =====

    async fn shop_purchase(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let player_id = require_player(&state)?;

        let Some(entry) = match_catalog_entry(&state.last_input) else {
            let player = self.store.get_character(player_id).await?;
            out.push("The merchant isn't sure what you're after. Here is what's for sale:".to_string());
            out.push(self.shop.display(player.reputation));
            return Ok(state.with_action(ActionTag::WaitInput));
        };

        let receipt = self
            .shop
            .purchase(player_id, entry.name, parse_quantity(&state.last_input))
            .await?;
        out.push(receipt.message());

        Ok(state
            .with_gold(receipt.gold_after)
            .with_result(SubsystemResult::Purchase(receipt))
            .with_action(ActionTag::WaitInput))
    }

    async fn reputation_check(&self, state: GameState, out: &mut Vec<String>) -> Result<GameState, GameError> {
        let player_id = require_player(&state)?;
        out.push(self.reputation.report(player_id).await?);
        Ok(state.with_action(ActionTag::WaitInput))
    }
}

fn require_player(state: &GameState) -> Result<CharacterId, GameError> {
    state
        .player_id
        .ok_or_else(|| GameError::NotFound("active player".to_string()))
}

/// Where a failed dispatch resumes
fn recovery_target(failed: ActionTag) -> ActionTag {
    match failed {
        ActionTag::CharacterCreation | ActionTag::MainStoryStart => ActionTag::CharacterCreation,
        _ => ActionTag::WaitInput,
    }
}

fn wait_input(state: GameState, input: &str, out: &mut Vec<String>) -> GameState {
    if input.is_empty() {
        out.push("What will you do?".to_string());
        return state.with_action(ActionTag::WaitInput);
    }
    state.with_input(input).with_action(ActionTag::IntentAnalysis)
}

fn inventory_action(state: GameState, input: &str, out: &mut Vec<String>) -> GameState {
    match InventoryCommand::parse(input) {
        InventoryCommand::Close => {
            out.push("You close your pack.".to_string());
            state.with_pending(None).with_action(ActionTag::WaitInput)
        }
        InventoryCommand::UsePotion => state.with_action(ActionTag::UsePotion),
        InventoryCommand::UseHeal => state.with_action(ActionTag::UseHeal),
    }
}
