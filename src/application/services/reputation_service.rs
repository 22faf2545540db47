//! Reputation Service - standing reports and intent-driven reputation changes

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::application::ports::outbound::{IntentAnalysis, WorldStorePort};
use crate::application::services::GameError;
use crate::domain::value_objects::reputation::status_message;
use crate::domain::value_objects::{CharacterId, ReputationAction, ReputationTier};

const HISTORY_LIMIT: u32 = 5;

const HINTS: [&str; 2] = [
    "Completing quests, helping people and defeating powerful foes raise your reputation.",
    "Theft, violence and betraying companions lower it.",
];

#[async_trait]
pub trait ReputationService: Send + Sync {
    /// Multi-line standing report for the reputation check
    async fn report(&self, player_id: CharacterId) -> Result<String, GameError>;

    /// Apply the reputation consequence of a classified intent.
    ///
    /// A recognized deed in the important event outweighs the classifier's
    /// generic impact. Returns the new score, or `None` when nothing changed.
    async fn apply_intent(
        &self,
        player_id: CharacterId,
        analysis: &IntentAnalysis,
        location: &str,
    ) -> Result<Option<i32>, GameError>;
}

pub struct ReputationServiceImpl {
    store: Arc<dyn WorldStorePort>,
}

impl ReputationServiceImpl {
    pub fn new(store: Arc<dyn WorldStorePort>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReputationService for ReputationServiceImpl {
    #[instrument(skip(self), fields(player_id = %player_id))]
    async fn report(&self, player_id: CharacterId) -> Result<String, GameError> {
        let player = self.store.get_character(player_id).await?;
        let tier = ReputationTier::from_score(player.reputation);
        let history = self
            .store
            .get_reputation_history(player_id, HISTORY_LIMIT)
            .await?;

        let mut lines = vec![
            status_message(player.reputation),
            format!(
                "Prices: {:.0}% of list | Cooperation: {:.0}%",
                tier.price_modifier() * 100.0,
                tier.cooperation() * 100.0
            ),
            format!("People speak to you in a {} tone.", tier.tone()),
            "Recent changes:".to_string(),
        ];
        if history.is_empty() {
            lines.push("  no changes yet".to_string());
        } else {
            lines.extend(history.iter().map(|change| format!("  - {}", change.describe())));
        }
        lines.extend(HINTS.iter().map(|hint| hint.to_string()));

        Ok(lines.join("\n"))
    }

    #[instrument(skip(self, analysis), fields(player_id = %player_id))]
    async fn apply_intent(
        &self,
        player_id: CharacterId,
        analysis: &IntentAnalysis,
        location: &str,
    ) -> Result<Option<i32>, GameError> {
        let deed = analysis.important_event.as_deref().and_then(ReputationAction::detect);
        let change = match deed {
            Some(action) => Some((action.delta(), action.reason())),
            None => analysis.reputation_impact.change(),
        };

        let Some((delta, reason)) = change else {
            return Ok(None);
        };
        let reputation = self
            .store
            .update_reputation(player_id, delta, reason, location)
            .await?;
        debug!(delta, reason, reputation, "Reputation changed by player action");
        Ok(Some(reputation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CharacterKind, NewCharacter};
    use crate::domain::value_objects::ReputationImpact;
    use crate::infrastructure::persistence::SqliteWorldStore;

    async fn setup(reputation: i32) -> (Arc<SqliteWorldStore>, ReputationServiceImpl, CharacterId) {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let player_id = store
            .create_character(
                NewCharacter::new("Aria", CharacterKind::Player, "elf", "mage")
                    .in_party()
                    .with_wealth(reputation, 300),
            )
            .await
            .unwrap();
        (store.clone(), ReputationServiceImpl::new(store), player_id)
    }

    #[tokio::test]
    async fn test_report_without_history() {
        let (_store, service, player_id) = setup(0).await;

        let report = service.report(player_id).await.unwrap();

        assert!(report.starts_with("Reputation: 0 (Neutral)"));
        assert!(report.contains("Prices: 100% of list"));
        assert!(report.contains("no changes yet"));
    }

    #[tokio::test]
    async fn test_report_lists_recent_changes() {
        let (store, service, player_id) = setup(10).await;
        store
            .update_reputation(player_id, 5, "good deed", "Misty Woods")
            .await
            .unwrap();

        let report = service.report(player_id).await.unwrap();

        assert!(report.contains("good deed: +5 (10 → 15) - Misty Woods"));
        assert!(!report.contains("no changes yet"));
    }

    #[tokio::test]
    async fn test_detected_deed_outweighs_generic_impact() {
        let (_store, service, player_id) = setup(0).await;
        let mut analysis = IntentAnalysis::fallback();
        analysis.reputation_impact = ReputationImpact::Positive;
        analysis.important_event = Some("boss kill: the lich falls".to_string());

        let reputation = service
            .apply_intent(player_id, &analysis, "Crypt")
            .await
            .unwrap();

        assert_eq!(reputation, Some(20));
    }

    #[tokio::test]
    async fn test_neutral_intent_changes_nothing() {
        let (store, service, player_id) = setup(0).await;

        let reputation = service
            .apply_intent(player_id, &IntentAnalysis::fallback(), "Village")
            .await
            .unwrap();

        assert_eq!(reputation, None);
        assert!(store
            .get_reputation_history(player_id, 5)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_negative_impact_applies_small_penalty() {
        let (_store, service, player_id) = setup(0).await;
        let mut analysis = IntentAnalysis::fallback();
        analysis.reputation_impact = ReputationImpact::Negative;

        let reputation = service
            .apply_intent(player_id, &analysis, "Market")
            .await
            .unwrap();

        assert_eq!(reputation, Some(-2));
    }
}
