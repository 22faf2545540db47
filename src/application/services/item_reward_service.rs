//! Item rewards for battles, exploration and completed quests

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::dto::GrantedItem;
use crate::application::ports::outbound::{RandomPort, WorldStorePort};
use crate::application::services::GameError;
use crate::domain::entities::{ItemTemplate, NewStoryEvent, QuestKind, REWARD_ITEMS};
use crate::domain::value_objects::game_constants::{event_types, MAX_REWARD_ITEMS, RARE_ITEM_KEEP_CHANCE};
use crate::domain::value_objects::CharacterId;

#[derive(Debug, Clone, PartialEq)]
pub struct QuestReward {
    pub kind: QuestKind,
    pub item: GrantedItem,
    pub reputation_after: i32,
}

impl QuestReward {
    pub fn message(&self) -> String {
        format!(
            "{} complete! Reputation +{} (now {}). Reward: {}.",
            capitalize(self.kind.label()),
            self.kind.reputation_reward(),
            self.reputation_after,
            self.item
        )
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Number of draws after a battle: 1, 2 above 100 damage, 3 above 150,
/// plus one per two critical hits, capped.
pub fn battle_reward_count(total_damage: i64, crits: usize) -> usize {
    let base = if total_damage > 150 {
        3
    } else if total_damage > 100 {
        2
    } else {
        1
    };
    (base + crits / 2).min(MAX_REWARD_ITEMS)
}

pub struct ItemRewardService {
    store: Arc<dyn WorldStorePort>,
    random: Arc<dyn RandomPort>,
}

impl ItemRewardService {
    pub fn new(store: Arc<dyn WorldStorePort>, random: Arc<dyn RandomPort>) -> Self {
        Self { store, random }
    }

    async fn grant(
        &self,
        owner_id: CharacterId,
        template: &ItemTemplate,
        quantity: i32,
    ) -> Result<GrantedItem, GameError> {
        self.store.add_item(owner_id, template.to_new_item(quantity)).await?;
        Ok(GrantedItem {
            name: template.name.to_string(),
            item_type: template.item_type.to_string(),
            quantity,
        })
    }

    #[instrument(skip(self))]
    pub async fn battle_rewards(
        &self,
        owner_id: CharacterId,
        total_damage: i64,
        crits: usize,
    ) -> Result<Vec<GrantedItem>, GameError> {
        let draws = battle_reward_count(total_damage, crits);
        let mut granted = Vec::new();

        for _ in 0..draws {
            let template = &REWARD_ITEMS[self.random.pick_index(REWARD_ITEMS.len())];
            let quantity = self.random.random_range(1, 3);
            if template.is_rare() && !self.random.chance(RARE_ITEM_KEEP_CHANCE) {
                debug!(item = template.name, "Rare reward slipped away");
                continue;
            }
            granted.push(self.grant(owner_id, template, quantity).await?);
        }

        info!(draws, granted = granted.len(), "Battle rewards granted");
        Ok(granted)
    }

    #[instrument(skip(self))]
    pub async fn exploration_rewards(&self, owner_id: CharacterId) -> Result<Vec<GrantedItem>, GameError> {
        let commons: Vec<&ItemTemplate> = REWARD_ITEMS.iter().filter(|t| t.is_common()).collect();
        let draws = self.random.random_range(1, 2);
        let mut granted = Vec::new();

        for _ in 0..draws {
            let template = commons[self.random.pick_index(commons.len())];
            let quantity = self.random.random_range(1, 2);
            granted.push(self.grant(owner_id, template, quantity).await?);
        }
        Ok(granted)
    }

    #[instrument(skip(self))]
    pub async fn quest_reward(
        &self,
        owner_id: CharacterId,
        kind: QuestKind,
        location: &str,
        turn: u32,
    ) -> Result<QuestReward, GameError> {
        let reputation_after = self
            .store
            .update_reputation(
                owner_id,
                kind.reputation_reward(),
                &format!("{} complete", kind.label()),
                location,
            )
            .await?;

        let table = kind.reward_table();
        let template = &table[self.random.pick_index(table.len())];
        let item = self.grant(owner_id, template, 1).await?;

        self.store
            .add_story_event(
                NewStoryEvent::new(
                    owner_id,
                    event_types::QUEST_COMPLETE,
                    format!("Completed a {} and received {}", kind.label(), item.name),
                    location,
                    turn,
                )
                .with_deltas(kind.reputation_reward(), 0),
            )
            .await?;

        info!(quest = kind.label(), item = %item.name, "Quest reward granted");
        Ok(QuestReward {
            kind,
            item,
            reputation_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CharacterKind, NewCharacter};
    use crate::infrastructure::persistence::SqliteWorldStore;
    use crate::infrastructure::random::FixedRandom;

    async fn setup(random: FixedRandom) -> (Arc<SqliteWorldStore>, ItemRewardService, CharacterId) {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let player_id = store
            .create_character(NewCharacter::new("Aria", CharacterKind::Player, "elf", "mage").in_party())
            .await
            .unwrap();
        let service = ItemRewardService::new(store.clone(), Arc::new(random));
        (store, service, player_id)
    }

    #[test]
    fn test_battle_reward_count() {
        assert_eq!(battle_reward_count(50, 0), 1);
        assert_eq!(battle_reward_count(101, 1), 2);
        assert_eq!(battle_reward_count(151, 3), 4);
        assert_eq!(battle_reward_count(400, 9), MAX_REWARD_ITEMS);
    }

    #[tokio::test]
    async fn test_battle_rewards_are_stored() {
        // pick index 0 (healing potion), quantity 1
        let (store, service, player_id) = setup(FixedRandom::constant(0.0)).await;

        let granted = service.battle_rewards(player_id, 120, 0).await.unwrap();
        assert_eq!(granted.len(), 2);
        assert!(granted.iter().all(|item| item.name == "healing potion" && item.quantity == 1));

        let inventory = store.get_inventory(player_id).await.unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_rare_rewards_usually_slip_away() {
        // pick index 9 (ring), then fail the 30% keep roll
        let (store, service, player_id) = setup(FixedRandom::constant(0.95)).await;

        let granted = service.battle_rewards(player_id, 10, 0).await.unwrap();
        assert!(granted.is_empty());
        assert!(store.get_inventory(player_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exploration_draws_only_common_items() {
        let (_store, service, player_id) = setup(FixedRandom::new(vec![0.99, 0.99, 0.0])).await;

        let granted = service.exploration_rewards(player_id).await.unwrap();
        assert_eq!(granted.len(), 2);
        for item in &granted {
            let template = REWARD_ITEMS.iter().find(|t| t.name == item.name).unwrap();
            assert!(template.is_common());
            assert!((1..=2).contains(&item.quantity));
        }
    }

    #[tokio::test]
    async fn test_quest_reward_raises_reputation_and_logs_event() {
        let (store, service, player_id) = setup(FixedRandom::constant(0.0)).await;

        let reward = service
            .quest_reward(player_id, QuestKind::Main, "Castle Gate", 7)
            .await
            .unwrap();

        assert_eq!(reward.reputation_after, 15);
        assert_eq!(reward.item.name, "legendary sword");
        assert_eq!(store.count_events(player_id, event_types::QUEST_COMPLETE).await.unwrap(), 1);
        let history = store.get_reputation_history(player_id, 1).await.unwrap();
        assert_eq!(history[0].reason, "main quest complete");
    }
}
