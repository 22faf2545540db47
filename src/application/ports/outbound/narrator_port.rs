//! Narrator port - the prose-generation and classification collaborator
//!
//! The narrator is slow and unreliable by nature. Nothing in the core calls
//! it directly; `NarrationService` wraps every call with a timeout and a
//! deterministic fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ActionTag, ReputationImpact, ReputationTier};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NarratorError {
    #[error("Narrator unavailable: {0}")]
    Unavailable(String),
    #[error("Narrator timed out after {0}s")]
    Timeout(u64),
    #[error("Narrator returned unusable output: {0}")]
    InvalidOutput(String),
}

/// What kind of prose is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NarrationKind {
    StartingLocation,
    Backstory,
    CreationStory,
    StoryContinue,
    BattleScene,
    CompanionOpportunity,
    CompanionReject,
}

/// Structured situation data handed to the narrator, and the only input the
/// fallback templates may draw from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationContext {
    pub player: String,
    pub location: String,
    pub objective: String,
    pub party: Vec<String>,
    pub reputation: i32,
    pub tier: ReputationTier,
    pub player_input: String,
    /// Subsystem-specific lines, e.g. per-member battle summaries
    pub facts: Vec<String>,
}

impl NarrationContext {
    pub fn new(player: impl Into<String>, location: impl Into<String>, reputation: i32) -> Self {
        Self {
            player: player.into(),
            location: location.into(),
            objective: String::new(),
            party: Vec::new(),
            reputation,
            tier: ReputationTier::from_score(reputation),
            player_input: String::new(),
            facts: Vec::new(),
        }
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = objective.into();
        self
    }

    pub fn with_party(mut self, party: Vec<String>) -> Self {
        self.party = party;
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.player_input = input.into();
        self
    }

    pub fn with_facts(mut self, facts: Vec<String>) -> Self {
        self.facts = facts;
        self
    }
}

/// The classifier's reading of a line of player input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub action: ActionTag,
    pub reason: String,
    pub story_response: String,
    pub location_update: Option<String>,
    pub reputation_impact: ReputationImpact,
    pub important_event: Option<String>,
}

impl IntentAnalysis {
    /// Safe default used whenever classification fails
    pub fn fallback() -> Self {
        Self {
            action: ActionTag::StoryContinue,
            reason: "classification unavailable".to_string(),
            story_response: "Assessing the situation...".to_string(),
            location_update: None,
            reputation_impact: ReputationImpact::Neutral,
            important_event: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecruitDecision {
    Accept,
    Reject,
}

/// The kind of person who answers a recruitment call, decided by reputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanionArchetype {
    Villain,
    GreyFigure,
    OrdinaryAdventurer,
    Hero,
}

impl CompanionArchetype {
    pub fn from_reputation(reputation: i32) -> Self {
        match reputation {
            r if r <= -20 => Self::Villain,
            r if r <= 0 => Self::GreyFigure,
            r if r <= 40 => Self::OrdinaryAdventurer,
            _ => Self::Hero,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Villain => "villain or criminal",
            Self::GreyFigure => "morally grey drifter",
            Self::OrdinaryAdventurer => "ordinary adventurer",
            Self::Hero => "righteous hero",
        }
    }
}

/// A companion as generated by the narrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionProfile {
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: i32,
    pub max_hp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub backstory: String,
    pub personality: String,
    pub reason_for_joining: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarratorPort: Send + Sync {
    /// Free prose for the given situation
    async fn narrate(&self, kind: NarrationKind, context: &NarrationContext) -> Result<String, NarratorError>;

    /// Map free text to an action tag plus side information
    async fn classify_intent(
        &self,
        input: &str,
        context: &NarrationContext,
    ) -> Result<IntentAnalysis, NarratorError>;

    /// Decide whether an ambiguous reply accepts a recruitment offer
    async fn classify_decision(
        &self,
        input: &str,
        context: &NarrationContext,
    ) -> Result<RecruitDecision, NarratorError>;

    async fn generate_companion(
        &self,
        archetype: CompanionArchetype,
        context: &NarrationContext,
    ) -> Result<CompanionProfile, NarratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_archetype_bands() {
        assert_eq!(CompanionArchetype::from_reputation(-20), CompanionArchetype::Villain);
        assert_eq!(CompanionArchetype::from_reputation(-19), CompanionArchetype::GreyFigure);
        assert_eq!(CompanionArchetype::from_reputation(0), CompanionArchetype::GreyFigure);
        assert_eq!(CompanionArchetype::from_reputation(40), CompanionArchetype::OrdinaryAdventurer);
        assert_eq!(CompanionArchetype::from_reputation(41), CompanionArchetype::Hero);
    }
}
