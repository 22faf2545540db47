//! Battle Service - Resolves one round of combat for the whole party
//!
//! Every living party member takes damage, pays a class-dependent MP cost
//! and deals damage, with independent critical and special-move rolls.
//! The party always wins; rewards scale with the damage dealt and the
//! player's reputation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::application::dto::{BattleOutcome, BattleRewards, MemberBattleReport};
use crate::application::ports::outbound::{RandomPort, WorldStorePort};
use crate::application::services::GameError;
use crate::domain::entities::{Character, CharacterKind, NewStoryEvent};
use crate::domain::value_objects::game_constants::{
    event_types, CRITICAL_CHANCE, CRITICAL_MULTIPLIER, SPECIAL_ACTION_CHANCE,
};
use crate::domain::value_objects::{CharacterId, CombatArchetype};

/// Inclusive roll ranges for one combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CombatRanges {
    damage_taken: (i32, i32),
    mp_cost: (i32, i32),
    damage_dealt: (i32, i32),
    special_bonus: (i32, i32),
}

const SOLO_RANGES: CombatRanges = CombatRanges {
    damage_taken: (10, 30),
    mp_cost: (5, 20),
    damage_dealt: (30, 60),
    special_bonus: (15, 25),
};

fn party_ranges(class: &str) -> CombatRanges {
    let (mp_cost, damage_dealt) = match CombatArchetype::of(class) {
        CombatArchetype::Healer => ((8, 20), (15, 30)),
        CombatArchetype::Caster => ((10, 25), (30, 55)),
        CombatArchetype::Fighter if class.to_lowercase().contains("warrior") => ((3, 15), (25, 50)),
        _ => ((3, 15), (20, 40)),
    };
    CombatRanges {
        damage_taken: (5, 35),
        mp_cost,
        damage_dealt,
        special_bonus: (10, 20),
    }
}

fn reputation_multiplier(reputation: i32) -> f64 {
    if reputation >= 60 {
        1.5
    } else if reputation >= 20 {
        1.2
    } else if reputation <= -40 {
        0.8
    } else {
        1.0
    }
}

/// Rewards for a won battle, a pure function of the battle aggregates
pub fn calculate_rewards(total_damage: i64, crits: usize, specials: usize, reputation: i32) -> BattleRewards {
    let bonus = 5 * crits as i64 + 3 * specials as i64;
    let base_exp = 20 + total_damage / 10 + bonus;
    let base_gold = 10 + total_damage / 20 + bonus;
    let multiplier = reputation_multiplier(reputation);

    BattleRewards {
        experience: (base_exp as f64 * multiplier) as i64,
        gold: (base_gold as f64 * multiplier) as i64,
        reputation_delta: if total_damage > 100 { 2 } else { 1 },
    }
}

#[async_trait]
pub trait BattleService: Send + Sync {
    /// Fight one battle with the current party and apply its consequences
    async fn fight(
        &self,
        player_id: CharacterId,
        location: &str,
        turn: u32,
    ) -> Result<BattleOutcome, GameError>;
}

pub struct BattleServiceImpl {
    store: Arc<dyn WorldStorePort>,
    random: Arc<dyn RandomPort>,
}

impl BattleServiceImpl {
    pub fn new(store: Arc<dyn WorldStorePort>, random: Arc<dyn RandomPort>) -> Self {
        Self { store, random }
    }

    fn roll(&self, (min, max): (i32, i32)) -> i32 {
        self.random.random_range(min, max)
    }

    async fn resolve_member(
        &self,
        member: &Character,
        ranges: CombatRanges,
    ) -> Result<MemberBattleReport, GameError> {
        let damage_taken = self.roll(ranges.damage_taken);
        let (hp_after, standing) = self.store.apply_damage(member.id, damage_taken).await?;

        let mp_spent = self.roll(ranges.mp_cost);
        let (_, mp_after) = self.store.heal(member.id, 0, -mp_spent).await?;

        let mut damage_dealt = self.roll(ranges.damage_dealt);
        let critical = self.random.chance(CRITICAL_CHANCE);
        if critical {
            damage_dealt = (damage_dealt as f64 * CRITICAL_MULTIPLIER) as i32;
        }
        let special = self.random.chance(SPECIAL_ACTION_CHANCE);
        if special {
            damage_dealt += self.roll(ranges.special_bonus);
        }

        Ok(MemberBattleReport {
            character_id: member.id,
            name: member.name.clone(),
            class: member.class.clone(),
            damage_taken,
            mp_spent: member.mp.min(mp_spent),
            damage_dealt,
            critical,
            special,
            hp_after,
            mp_after,
            standing,
        })
    }
}

#[async_trait]
impl BattleService for BattleServiceImpl {
    #[instrument(skip(self), fields(player_id = %player_id))]
    async fn fight(
        &self,
        player_id: CharacterId,
        location: &str,
        turn: u32,
    ) -> Result<BattleOutcome, GameError> {
        let player = self.store.get_character(player_id).await?;

        let mut party = self.store.get_party_status().await?;
        if !party.iter().any(|member| member.id == player_id) {
            party.push(player.clone());
        }
        let solo = party.iter().all(|member| member.kind == CharacterKind::Player);

        let mut members = Vec::new();
        for member in party.iter().filter(|member| member.is_alive()) {
            let ranges = if solo { SOLO_RANGES } else { party_ranges(&member.class) };
            members.push(self.resolve_member(member, ranges).await?);
        }

        let total_damage: i64 = members.iter().map(|m| m.damage_dealt as i64).sum();
        let critical_hitters: Vec<String> =
            members.iter().filter(|m| m.critical).map(|m| m.name.clone()).collect();
        let special_users: Vec<String> =
            members.iter().filter(|m| m.special).map(|m| m.name.clone()).collect();

        let rewards = calculate_rewards(
            total_damage,
            critical_hitters.len(),
            special_users.len(),
            player.reputation,
        );
        debug!(total_damage, solo, ?rewards, "Battle resolved");

        let gold_after = self.store.update_gold(player_id, rewards.gold).await?;
        let reputation_after = self
            .store
            .update_reputation(player_id, rewards.reputation_delta, "battle victory", location)
            .await?;
        self.store
            .add_story_event(
                NewStoryEvent::new(
                    player_id,
                    event_types::BATTLE_VICTORY,
                    format!("Won a battle in {} dealing {} damage", location, total_damage),
                    location,
                    turn,
                )
                .with_deltas(rewards.reputation_delta, rewards.gold),
            )
            .await?;

        info!(total_damage, gold = rewards.gold, "Battle won");

        Ok(BattleOutcome {
            members,
            total_damage,
            critical_hitters,
            special_users,
            solo,
            rewards,
            gold_after,
            reputation_after,
        })
    }
}
