//! Narration Service - Bounded, always-answering access to the narrator
//!
//! Every narrator call runs under a timeout. When the narrator fails, times
//! out or returns something unusable, the service answers from a local
//! template built only from the `NarrationContext`, so callers never see a
//! narrator error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::application::ports::outbound::{
    CompanionArchetype, CompanionProfile, IntentAnalysis, NarrationContext, NarrationKind,
    NarratorError, NarratorPort, RecruitDecision,
};

pub const FALLBACK_STARTING_LOCATION: &str = "Adventurer's Village";

pub struct NarrationService {
    narrator: Arc<dyn NarratorPort>,
    timeout: Duration,
}

impl NarrationService {
    pub fn new(narrator: Arc<dyn NarratorPort>, timeout: Duration) -> Self {
        Self { narrator, timeout }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, NarratorError>
    where
        F: Future<Output = Result<T, NarratorError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(NarratorError::Timeout(self.timeout.as_secs())),
        }
    }

    /// Prose for the situation; never empty
    #[instrument(skip(self, context), fields(kind = ?kind))]
    pub async fn narrate(&self, kind: NarrationKind, context: &NarrationContext) -> String {
        match self.bounded(self.narrator.narrate(kind, context)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Narrator returned empty text, using fallback");
                fallback_text(kind, context)
            }
            Err(e) => {
                warn!(error = %e, "Narration failed, using fallback");
                fallback_text(kind, context)
            }
        }
    }

    /// Classifier reading of the input, or the safe default
    #[instrument(skip(self, context))]
    pub async fn classify_intent(&self, input: &str, context: &NarrationContext) -> IntentAnalysis {
        match self.bounded(self.narrator.classify_intent(input, context)).await {
            Ok(analysis) => {
                debug!(action = %analysis.action, reason = %analysis.reason, "Intent classified");
                analysis
            }
            Err(e) => {
                warn!(error = %e, "Intent classification failed, continuing the story");
                IntentAnalysis::fallback()
            }
        }
    }

    /// An unreadable answer to a recruitment offer counts as a refusal
    #[instrument(skip(self, context))]
    pub async fn classify_decision(&self, input: &str, context: &NarrationContext) -> RecruitDecision {
        match self.bounded(self.narrator.classify_decision(input, context)).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "Decision classification failed, treating as reject");
                RecruitDecision::Reject
            }
        }
    }

    #[instrument(skip(self, context), fields(archetype = ?archetype))]
    pub async fn generate_companion(
        &self,
        archetype: CompanionArchetype,
        context: &NarrationContext,
    ) -> CompanionProfile {
        match self.bounded(self.narrator.generate_companion(archetype, context)).await {
            Ok(profile) => match validate_profile(profile) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(error = %e, "Generated companion rejected, using fallback");
                    fallback_companion(archetype)
                }
            },
            Err(e) => {
                warn!(error = %e, "Companion generation failed, using fallback");
                fallback_companion(archetype)
            }
        }
    }
}

fn validate_profile(mut profile: CompanionProfile) -> Result<CompanionProfile, NarratorError> {
    profile.name = profile.name.trim().to_string();
    if profile.name.is_empty() {
        return Err(NarratorError::InvalidOutput("companion has no name".into()));
    }
    if profile.level < 1 || profile.max_hp <= 0 || profile.max_mp < 0 {
        return Err(NarratorError::InvalidOutput(format!(
            "implausible stats for {}: level={}, hp={}, mp={}",
            profile.name, profile.level, profile.max_hp, profile.max_mp
        )));
    }
    if profile.race.trim().is_empty() {
        profile.race = "human".to_string();
    }
    if profile.class.trim().is_empty() {
        profile.class = "warrior".to_string();
    }
    Ok(profile)
}

/// Deterministic stand-in used when the narrator cannot produce a companion
pub fn fallback_companion(archetype: CompanionArchetype) -> CompanionProfile {
    let (name, race, class, personality, reason) = match archetype {
        CompanionArchetype::Villain => (
            "Varek",
            "human",
            "rogue",
            "cold and calculating",
            "smells profit in your company",
        ),
        CompanionArchetype::GreyFigure => (
            "Sable",
            "half-elf",
            "archer",
            "guarded but fair",
            "has nowhere better to be",
        ),
        CompanionArchetype::OrdinaryAdventurer => (
            "Tomas",
            "human",
            "warrior",
            "steady and good-humoured",
            "wants to see the world",
        ),
        CompanionArchetype::Hero => (
            "Elira",
            "elf",
            "priest",
            "kind and resolute",
            "has heard of your good deeds",
        ),
    };
    CompanionProfile {
        name: name.to_string(),
        race: race.to_string(),
        class: class.to_string(),
        level: 2,
        max_hp: 100,
        max_mp: 30,
        strength: 10,
        agility: 10,
        intelligence: 10,
        backstory: format!("A {} who crossed paths with the party.", archetype.description()),
        personality: personality.to_string(),
        reason_for_joining: reason.to_string(),
    }
}

/// Template text for a narration kind, built only from the context
pub fn fallback_text(kind: NarrationKind, context: &NarrationContext) -> String {
    let location = if context.location.is_empty() {
        "the road"
    } else {
        context.location.as_str()
    };
    match kind {
        NarrationKind::StartingLocation => FALLBACK_STARTING_LOCATION.to_string(),
        NarrationKind::Backstory => {
            let origin = context.facts.first().map(String::as_str).unwrap_or("wanderer");
            format!("{} is a {} setting out from {}.", context.player, origin, location)
        }
        NarrationKind::CreationStory => {
            let mut text = format!("{} arrives in {}.", context.player, location);
            if !context.objective.is_empty() {
                text.push_str(&format!(" Objective: {}.", context.objective));
            }
            text.push_str(" What will you do?");
            text
        }
        NarrationKind::StoryContinue => {
            format!("The adventure continues in {}. What will you do?", location)
        }
        NarrationKind::BattleScene => {
            let fighters = if context.party.is_empty() {
                context.player.clone()
            } else {
                context.party.join(", ")
            };
            format!(
                "Enemies attack in {}! {} stand their ground and drive them off.",
                location, fighters
            )
        }
        NarrationKind::CompanionOpportunity => format!(
            "In {}, a traveller approaches {} and offers to join the party. Will you accept? (yes/no)",
            location, context.player
        ),
        NarrationKind::CompanionReject => format!(
            "{} declines the offer. The traveller nods and disappears into {}.",
            context.player, location
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::MockNarratorPort;
    use crate::domain::value_objects::ActionTag;

    const ALL_KINDS: [NarrationKind; 7] = [
        NarrationKind::StartingLocation,
        NarrationKind::Backstory,
        NarrationKind::CreationStory,
        NarrationKind::StoryContinue,
        NarrationKind::BattleScene,
        NarrationKind::CompanionOpportunity,
        NarrationKind::CompanionReject,
    ];

    fn context() -> NarrationContext {
        NarrationContext::new("Aria", "Harbor Town", 10).with_objective("Find the lost relic")
    }

    fn failing_narrator() -> MockNarratorPort {
        let mut narrator = MockNarratorPort::new();
        narrator
            .expect_narrate()
            .returning(|_, _| Err(NarratorError::Unavailable("offline".into())));
        narrator
            .expect_classify_intent()
            .returning(|_, _| Err(NarratorError::InvalidOutput("not json".into())));
        narrator
            .expect_classify_decision()
            .returning(|_, _| Err(NarratorError::Unavailable("offline".into())));
        narrator
            .expect_generate_companion()
            .returning(|_, _| Err(NarratorError::Unavailable("offline".into())));
        narrator
    }

    #[test]
    fn test_every_fallback_is_non_empty() {
        let empty = NarrationContext::new("", "", 0);
        for kind in ALL_KINDS {
            assert!(!fallback_text(kind, &context()).is_empty());
            assert!(!fallback_text(kind, &empty).is_empty());
        }
    }

    #[tokio::test]
    async fn test_narrator_failure_yields_fallback_text() {
        let service = NarrationService::new(Arc::new(failing_narrator()), Duration::from_secs(1));
        for kind in ALL_KINDS {
            let text = service.narrate(kind, &context()).await;
            assert_eq!(text, fallback_text(kind, &context()));
        }
    }

    #[tokio::test]
    async fn test_classification_failures_use_safe_defaults() {
        let service = NarrationService::new(Arc::new(failing_narrator()), Duration::from_secs(1));

        let analysis = service.classify_intent("dance wildly", &context()).await;
        assert_eq!(analysis.action, ActionTag::StoryContinue);
        assert_eq!(analysis.story_response, "Assessing the situation...");

        let decision = service.classify_decision("hmm, maybe", &context()).await;
        assert_eq!(decision, RecruitDecision::Reject);

        let companion = service
            .generate_companion(CompanionArchetype::Hero, &context())
            .await;
        assert_eq!(companion, fallback_companion(CompanionArchetype::Hero));
        assert_eq!((companion.max_hp, companion.max_mp, companion.level), (100, 30, 2));
    }

    #[tokio::test]
    async fn test_empty_narration_uses_fallback() {
        let mut narrator = MockNarratorPort::new();
        narrator.expect_narrate().returning(|_, _| Ok("   ".to_string()));
        let service = NarrationService::new(Arc::new(narrator), Duration::from_secs(1));

        let text = service.narrate(NarrationKind::StoryContinue, &context()).await;
        assert_eq!(text, "The adventure continues in Harbor Town. What will you do?");
    }

    #[tokio::test]
    async fn test_invalid_companion_is_replaced() {
        let mut narrator = MockNarratorPort::new();
        narrator.expect_generate_companion().returning(|archetype, _| {
            let mut profile = fallback_companion(archetype);
            profile.name = " ".to_string();
            Ok(profile)
        });
        let service = NarrationService::new(Arc::new(narrator), Duration::from_secs(1));

        let companion = service
            .generate_companion(CompanionArchetype::Villain, &context())
            .await;
        assert_eq!(companion.name, "Varek");
    }

    struct SlowNarrator;

    #[async_trait::async_trait]
    impl NarratorPort for SlowNarrator {
        async fn narrate(&self, _: NarrationKind, _: &NarrationContext) -> Result<String, NarratorError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }

        async fn classify_intent(&self, _: &str, _: &NarrationContext) -> Result<IntentAnalysis, NarratorError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(NarratorError::Unavailable("slow".into()))
        }

        async fn classify_decision(&self, _: &str, _: &NarrationContext) -> Result<RecruitDecision, NarratorError> {
            Ok(RecruitDecision::Accept)
        }

        async fn generate_companion(
            &self,
            archetype: CompanionArchetype,
            _: &NarrationContext,
        ) -> Result<CompanionProfile, NarratorError> {
            Ok(fallback_companion(archetype))
        }
    }

    #[tokio::test]
    async fn test_slow_narrator_times_out_to_fallback() {
        let service = NarrationService::new(Arc::new(SlowNarrator), Duration::from_millis(20));

        let text = service.narrate(NarrationKind::StoryContinue, &context()).await;
        assert_eq!(text, fallback_text(NarrationKind::StoryContinue, &context()));

        let analysis = service.classify_intent("anything", &context()).await;
        assert_eq!(analysis, IntentAnalysis::fallback());
    }
}
