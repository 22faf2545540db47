//! Inventory Service - Inventory display, potions and the healing spell

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::application::dto::{InventoryOutcome, Restores};
use crate::application::ports::outbound::WorldStorePort;
use crate::application::services::GameError;
use crate::domain::entities::Character;
use crate::domain::value_objects::game_constants::{
    item_types, HEALING_POTION_AMOUNT, HEAL_SPELL_AMOUNT, HEAL_SPELL_COST, MANA_POTION_AMOUNT,
};
use crate::domain::value_objects::{CharacterId, CombatArchetype};

/// What the player asked for while the inventory is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryCommand {
    Close,
    UsePotion,
    UseHeal,
}

impl InventoryCommand {
    /// Anything unrecognised closes the inventory
    pub fn parse(input: &str) -> Self {
        let lower = input.to_lowercase();
        let mentions = |keywords: &[&str]| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| keywords.iter().any(|k| word.starts_with(k)))
        };

        if mentions(&["close", "exit", "leave"]) {
            Self::Close
        } else if mentions(&["potion", "hp", "mp", "recover"]) {
            Self::UsePotion
        } else if mentions(&["heal", "priest", "cure"]) {
            Self::UseHeal
        } else {
            Self::Close
        }
    }
}

#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Stacks by type and name, plus party HP/MP and the available commands
    async fn display(&self, player_id: CharacterId) -> Result<String, GameError>;

    /// Drink one HP potion (or, failing that, one MP potion) for the whole party
    async fn use_potion(&self, player_id: CharacterId) -> Result<InventoryOutcome, GameError>;

    /// A healer heals the most wounded party member
    async fn use_heal_spell(&self) -> Result<InventoryOutcome, GameError>;
}

pub struct InventoryServiceImpl {
    store: Arc<dyn WorldStorePort>,
}

impl InventoryServiceImpl {
    pub fn new(store: Arc<dyn WorldStorePort>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InventoryService for InventoryServiceImpl {
    #[instrument(skip(self))]
    async fn display(&self, player_id: CharacterId) -> Result<String, GameError> {
        let player = self.store.get_character(player_id).await?;
        let inventory = self.store.get_inventory(player_id).await?;
        let party = self.store.get_party_status().await?;

        let mut lines = vec![format!("Inventory of {} ({} gold)", player.name, player.gold)];
        if inventory.is_empty() {
            lines.push("  (empty)".to_string());
        }
        let mut current_type: Option<&str> = None;
        for entry in &inventory {
            if current_type != Some(entry.item_type.as_str()) {
                lines.push(format!("[{}]", entry.item_type.to_uppercase()));
                current_type = Some(entry.item_type.as_str());
            }
            let mut line = format!("  - {} x{}", entry.item_name, entry.quantity);
            if entry.unit_value > 0 {
                line.push_str(&format!(" (worth {} gold)", entry.unit_value));
            }
            lines.push(line);
        }

        lines.push("Party:".to_string());
        for member in &party {
            let status = if member.is_alive() { "" } else { " [down]" };
            lines.push(format!("  - {}: {}{}", member.name, member.vitals(), status));
        }
        lines.push("Commands: 'use potion', 'heal', 'close'".to_string());

        Ok(lines.join("\n"))
    }

    #[instrument(skip(self))]
    async fn use_potion(&self, player_id: CharacterId) -> Result<InventoryOutcome, GameError> {
        let inventory = self.store.get_inventory(player_id).await?;
        let potion = inventory
            .iter()
            .find(|entry| entry.item_type == item_types::HP_POTION)
            .or_else(|| inventory.iter().find(|entry| entry.item_type == item_types::MP_POTION));

        let Some(potion) = potion else {
            return Ok(InventoryOutcome::NoPotion);
        };
        let restores = if potion.item_type == item_types::HP_POTION {
            Restores::Hp
        } else {
            Restores::Mp
        };

        let party = self.store.get_party_status().await?;
        let mut healed = Vec::new();
        for member in party.iter().filter(|member| member.is_alive()) {
            match restores {
                Restores::Hp if member.missing_hp() > 0 => {
                    let amount = HEALING_POTION_AMOUNT.min(member.missing_hp());
                    self.store.heal(member.id, amount, 0).await?;
                    healed.push((member.name.clone(), amount));
                }
                Restores::Mp if member.missing_mp() > 0 => {
                    let amount = MANA_POTION_AMOUNT.min(member.missing_mp());
                    self.store.heal(member.id, 0, amount).await?;
                    healed.push((member.name.clone(), amount));
                }
                _ => {}
            }
        }

        // one unit per use, however many members it reached
        self.store.use_item(player_id, potion.id, 1).await?;
        debug!(potion = %potion.item_name, healed = healed.len(), "Potion used");

        Ok(InventoryOutcome::PotionUsed {
            potion: potion.item_name.clone(),
            restores,
            healed,
        })
    }

    #[instrument(skip(self))]
    async fn use_heal_spell(&self) -> Result<InventoryOutcome, GameError> {
        let party = self.store.get_party_status().await?;

        let Some(healer) = party.iter().find(|member| {
            member.is_alive()
                && member.mp >= HEAL_SPELL_COST
                && CombatArchetype::of(&member.class) == CombatArchetype::Healer
        }) else {
            return Ok(InventoryOutcome::NoHealer);
        };

        let target: Option<&Character> = party
            .iter()
            .filter(|member| member.is_damaged())
            .fold(None, |lowest: Option<&Character>, member| match lowest {
                Some(current) if current.hp_ratio() <= member.hp_ratio() => Some(current),
                _ => Some(member),
            });

        let Some(target) = target else {
            return Ok(InventoryOutcome::NothingToHeal {
                healer: healer.name.clone(),
            });
        };

        let amount = HEAL_SPELL_AMOUNT.min(target.missing_hp());
        self.store.heal(target.id, amount, 0).await?;
        self.store.heal(healer.id, 0, -HEAL_SPELL_COST).await?;

        Ok(InventoryOutcome::HealCast {
            healer: healer.name.clone(),
            target: target.name.clone(),
            amount,
        })
    }
}
