//! Narrator adapters
//!
//! `LlmNarrator` turns narration and classification requests into chat
//! prompts for an `LlmPort` and parses the JSON replies. `OfflineNarrator`
//! refuses every request so the engine runs on its deterministic fallbacks.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::outbound::{
    ChatMessage, CompanionArchetype, CompanionProfile, IntentAnalysis, LlmPort, LlmRequest,
    NarrationContext, NarrationKind, NarratorError, NarratorPort, RecruitDecision,
};
use crate::domain::value_objects::{ActionTag, ReputationImpact};

const PROSE_TEMPERATURE: f32 = 0.8;
const CLASSIFY_TEMPERATURE: f32 = 0.2;
const PROSE_MAX_TOKENS: u32 = 400;
const JSON_MAX_TOKENS: u32 = 600;

pub struct LlmNarrator {
    llm: Arc<dyn LlmPort>,
}

impl LlmNarrator {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    async fn ask(&self, system: String, user: String, temperature: f32, max_tokens: u32) -> Result<String, NarratorError> {
        let request = LlmRequest::new(vec![ChatMessage::user(user)])
            .with_system_prompt(system)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);

        let response = self
            .llm
            .generate(request)
            .await
            .map_err(|e| NarratorError::Unavailable(e.to_string()))?;
        debug!(model = %response.model, tokens = response.tokens_used, "Narrator reply received");
        Ok(response.content)
    }

    async fn ask_json<T: for<'de> Deserialize<'de>>(&self, system: String, user: String) -> Result<T, NarratorError> {
        let raw = self.ask(system, user, CLASSIFY_TEMPERATURE, JSON_MAX_TOKENS).await?;
        parse_json_reply(&raw)
    }
}

#[async_trait]
impl NarratorPort for LlmNarrator {
    async fn narrate(&self, kind: NarrationKind, context: &NarrationContext) -> Result<String, NarratorError> {
        let text = self
            .ask(
                narration_system_prompt(kind, context),
                narration_instruction(kind).to_string(),
                PROSE_TEMPERATURE,
                PROSE_MAX_TOKENS,
            )
            .await?;
        let text = strip_code_fences(&text).trim().to_string();
        if text.is_empty() {
            return Err(NarratorError::InvalidOutput("empty narration".into()));
        }
        Ok(text)
    }

    async fn classify_intent(
        &self,
        input: &str,
        context: &NarrationContext,
    ) -> Result<IntentAnalysis, NarratorError> {
        let reply: IntentReply = self
            .ask_json(intent_prompt(context), format!("Player input: \"{}\"", input))
            .await?;
        Ok(reply.into_analysis())
    }

    async fn classify_decision(
        &self,
        input: &str,
        _context: &NarrationContext,
    ) -> Result<RecruitDecision, NarratorError> {
        let system = format!(
            "Decide whether the player accepts an offer for a traveller to join their party.\n\
             Player reply: \"{}\"\n\
             Answer with JSON only: {{\"decision\": \"accept\"}} or {{\"decision\": \"reject\"}}",
            input
        );
        let reply: DecisionReply = self.ask_json(system, "Classify the reply.".to_string()).await?;
        Ok(match reply.decision.trim().to_lowercase().as_str() {
            "accept" => RecruitDecision::Accept,
            _ => RecruitDecision::Reject,
        })
    }

    async fn generate_companion(
        &self,
        archetype: CompanionArchetype,
        context: &NarrationContext,
    ) -> Result<CompanionProfile, NarratorError> {
        let reply: CompanionReply = self
            .ask_json(
                companion_prompt(archetype, context),
                format!("Create a {} companion.", archetype.description()),
            )
            .await?;
        Ok(reply.into())
    }
}

/// Narrator that is never available
pub struct OfflineNarrator;

#[async_trait]
impl NarratorPort for OfflineNarrator {
    async fn narrate(&self, _: NarrationKind, _: &NarrationContext) -> Result<String, NarratorError> {
        Err(NarratorError::Unavailable("offline mode".into()))
    }

    async fn classify_intent(&self, _: &str, _: &NarrationContext) -> Result<IntentAnalysis, NarratorError> {
        Err(NarratorError::Unavailable("offline mode".into()))
    }

    async fn classify_decision(&self, _: &str, _: &NarrationContext) -> Result<RecruitDecision, NarratorError> {
        Err(NarratorError::Unavailable("offline mode".into()))
    }

    async fn generate_companion(
        &self,
        _: CompanionArchetype,
        _: &NarrationContext,
    ) -> Result<CompanionProfile, NarratorError> {
        Err(NarratorError::Unavailable("offline mode".into()))
    }
}

// ===== Prompts =====

fn context_block(context: &NarrationContext) -> String {
    let mut block = String::new();
    block.push_str(&format!("PLAYER: {}\n", context.player));
    if !context.location.is_empty() {
        block.push_str(&format!("LOCATION: {}\n", context.location));
    }
    if !context.objective.is_empty() {
        block.push_str(&format!("OBJECTIVE: {}\n", context.objective));
    }
    if !context.party.is_empty() {
        block.push_str(&format!("PARTY: {}\n", context.party.join(", ")));
    }
    block.push_str(&format!(
        "REPUTATION: {} ({}); people treat the player in a {} manner\n",
        context.reputation,
        context.tier,
        context.tier.tone()
    ));
    for fact in &context.facts {
        block.push_str(&format!("- {}\n", fact));
    }
    if !context.player_input.is_empty() {
        block.push_str(&format!("PLAYER SAID: \"{}\"\n", context.player_input));
    }
    block
}

fn narration_system_prompt(kind: NarrationKind, context: &NarrationContext) -> String {
    let mut prompt = String::from("You are the narrator of a text fantasy role-playing game.\n\n");
    prompt.push_str(&context_block(context));
    prompt.push('\n');
    if kind == NarrationKind::StartingLocation {
        prompt.push_str("Reply with the place name only, no punctuation or commentary.\n");
    } else {
        prompt.push_str("Write in the second person, in plain prose, no lists or headings.\n");
    }
    prompt
}

fn narration_instruction(kind: NarrationKind) -> &'static str {
    match kind {
        NarrationKind::StartingLocation => "Name a fitting starting town or village for this character.",
        NarrationKind::Backstory => "Write a two or three sentence backstory for this character.",
        NarrationKind::CreationStory => {
            "Open the adventure: describe the starting location and hint at the objective. End by asking what the player does."
        }
        NarrationKind::StoryContinue => {
            "Continue the story from the player's input in about three sentences. End by asking what the player does."
        }
        NarrationKind::BattleScene => {
            "Describe the battle vividly using the listed results. Do not change any numbers."
        }
        NarrationKind::CompanionOpportunity => {
            "A traveller approaches and offers to join the party. Describe them briefly and ask whether the player accepts."
        }
        NarrationKind::CompanionReject => "The player turned the traveller down. Describe the parting in one or two sentences.",
    }
}

fn intent_prompt(context: &NarrationContext) -> String {
    let mut prompt = String::from("You analyse player input for a text role-playing game.\n\n");
    prompt.push_str(&context_block(context));
    prompt.push_str(
        "\nChoose next_action by these rules, first match wins:\n\
         1. shop_purchase: buying something\n\
         2. reputation_check: asking about reputation or standing\n\
         3. companion_list: asking about the party or companions\n\
         4. companion_dismiss: sending a companion away\n\
         5. inventory: bag, items, using a potion\n\
         6. battle: fighting, attacking, entering danger\n\
         7. companion_opportunity: looking for new companions\n\
         8. story_continue: moving, exploring, talking\n\
         9. item_reward: collecting spoils after a fight or search\n\n\
         Good deeds have positive reputation impact, evil deeds negative, everything else neutral.\n\
         Answer with JSON only:\n\
         {\"next_action\": \"...\", \"reason\": \"...\", \"story_response\": \"...\", \
         \"location_update\": \"new place or empty\", \"reputation_impact\": \"positive|negative|neutral\", \
         \"important_event\": \"notable event or empty\"}\n",
    );
    prompt
}

fn companion_prompt(archetype: CompanionArchetype, context: &NarrationContext) -> String {
    let mut prompt = String::from("You create companions for a text role-playing game.\n\n");
    prompt.push_str(&context_block(context));
    prompt.push_str(&format!(
        "\nThe companion must be a {} whose morals fit the player's reputation.\n",
        archetype.description()
    ));
    prompt.push_str(
        "Answer with JSON only:\n\
         {\"name\": \"...\", \"race\": \"...\", \"class\": \"...\", \"level\": 2, \"max_hp\": 100, \
         \"max_mp\": 30, \"strength\": 10, \"agility\": 10, \"intelligence\": 10, \"backstory\": \"...\", \
         \"personality\": \"...\", \"reason_for_joining\": \"...\"}\n",
    );
    prompt
}

// ===== Replies =====

/// Models like to wrap JSON in markdown fences
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_json_reply<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, NarratorError> {
    let body = strip_code_fences(raw);
    // tolerate chatter around the object
    let object = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    };
    serde_json::from_str(object).map_err(|e| NarratorError::InvalidOutput(e.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
}

#[derive(Debug, Deserialize)]
struct IntentReply {
    next_action: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    story_response: String,
    #[serde(default)]
    location_update: Option<String>,
    #[serde(default)]
    reputation_impact: String,
    #[serde(default)]
    important_event: Option<String>,
}

impl IntentReply {
    fn into_analysis(self) -> IntentAnalysis {
        IntentAnalysis {
            action: ActionTag::from_tag(&self.next_action),
            reason: self.reason,
            story_response: self.story_response,
            location_update: non_empty(self.location_update),
            reputation_impact: ReputationImpact::from_label(&self.reputation_impact),
            important_event: non_empty(self.important_event),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DecisionReply {
    decision: String,
}

#[derive(Debug, Deserialize)]
struct CompanionReply {
    name: String,
    #[serde(default)]
    race: String,
    #[serde(default)]
    class: String,
    #[serde(default = "default_level")]
    level: i32,
    #[serde(default = "default_hp")]
    max_hp: i32,
    #[serde(default = "default_mp")]
    max_mp: i32,
    #[serde(default = "default_stat")]
    strength: i32,
    #[serde(default = "default_stat")]
    agility: i32,
    #[serde(default = "default_stat")]
    intelligence: i32,
    #[serde(default)]
    backstory: String,
    #[serde(default)]
    personality: String,
    #[serde(default)]
    reason_for_joining: String,
}

fn default_level() -> i32 {
    2
}

fn default_hp() -> i32 {
    100
}

fn default_mp() -> i32 {
    30
}

fn default_stat() -> i32 {
    10
}

impl From<CompanionReply> for CompanionProfile {
    fn from(reply: CompanionReply) -> Self {
        Self {
            name: reply.name,
            race: reply.race.to_lowercase(),
            class: reply.class.to_lowercase(),
            level: reply.level,
            max_hp: reply.max_hp,
            max_mp: reply.max_mp,
            strength: reply.strength,
            agility: reply.agility,
            intelligence: reply.intelligence,
            backstory: reply.backstory,
            personality: reply.personality,
            reason_for_joining: reply.reason_for_joining,
        }
    }
}
