//! Structured results returned by the game subsystems
//!
//! The orchestrator keeps the most recent one on the `GameState` so a later
//! step (item rewards after a battle, for example) can read it.

use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::IntentAnalysis;
use crate::domain::value_objects::{CharacterId, ReputationTier};

/// One party member's part in a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBattleReport {
    pub character_id: CharacterId,
    pub name: String,
    pub class: String,
    pub damage_taken: i32,
    pub mp_spent: i32,
    pub damage_dealt: i32,
    pub critical: bool,
    pub special: bool,
    pub hp_after: i32,
    pub mp_after: i32,
    pub standing: bool,
}

impl MemberBattleReport {
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} ({}): dealt {} damage, took {} (HP {}), spent {} MP",
            self.name, self.class, self.damage_dealt, self.damage_taken, self.hp_after, self.mp_spent
        );
        if self.critical {
            line.push_str(" [critical]");
        }
        if self.special {
            line.push_str(" [special move]");
        }
        if !self.standing {
            line.push_str(" [down]");
        }
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRewards {
    pub experience: i64,
    pub gold: i64,
    pub reputation_delta: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub members: Vec<MemberBattleReport>,
    pub total_damage: i64,
    pub critical_hitters: Vec<String>,
    pub special_users: Vec<String>,
    pub solo: bool,
    pub rewards: BattleRewards,
    pub gold_after: i64,
    pub reputation_after: i32,
}

impl BattleOutcome {
    pub fn participants(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.members.iter().map(MemberBattleReport::summary_line).collect();
        lines.push(format!("Total damage dealt: {}", self.total_damage));
        if !self.critical_hitters.is_empty() {
            lines.push(format!("Critical hits: {}", self.critical_hitters.join(", ")));
        }
        if !self.special_users.is_empty() {
            lines.push(format!("Special moves: {}", self.special_users.join(", ")));
        }
        lines.push(format!(
            "Rewards: {} EXP, {} gold (now {}), reputation {:+} (now {})",
            self.rewards.experience,
            self.rewards.gold,
            self.gold_after,
            self.rewards.reputation_delta,
            self.reputation_after
        ));
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedItem {
    pub name: String,
    pub item_type: String,
    pub quantity: i32,
}

impl std::fmt::Display for GrantedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{}", self.name, self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub gold_after: i64,
    pub tier: ReputationTier,
}

impl PurchaseReceipt {
    pub fn message(&self) -> String {
        format!(
            "You bought {} x{} for {} gold ({} each at {} prices). Gold left: {}.",
            self.item_name,
            self.quantity,
            self.total_price,
            self.unit_price,
            self.tier.label(),
            self.gold_after
        )
    }
}

/// Which stat a potion restores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Restores {
    Hp,
    Mp,
}

impl Restores {
    pub fn label(self) -> &'static str {
        match self {
            Self::Hp => "HP",
            Self::Mp => "MP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryOutcome {
    PotionUsed {
        potion: String,
        restores: Restores,
        healed: Vec<(String, i32)>,
    },
    NoPotion,
    HealCast {
        healer: String,
        target: String,
        amount: i32,
    },
    NothingToHeal {
        healer: String,
    },
    NoHealer,
}

impl InventoryOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::PotionUsed {
                potion,
                restores,
                healed,
            } => {
                if healed.is_empty() {
                    format!(
                        "You used a {}. Everyone's {} was already full.",
                        potion,
                        restores.label()
                    )
                } else {
                    let parts: Vec<String> = healed
                        .iter()
                        .map(|(name, amount)| format!("{} (+{} {})", name, amount, restores.label()))
                        .collect();
                    format!("You used a {}: {}", potion, parts.join(", "))
                }
            }
            Self::NoPotion => "You have no potions to use.".to_string(),
            Self::HealCast {
                healer,
                target,
                amount,
            } => format!("{} casts heal on {}, restoring {} HP.", healer, target, amount),
            Self::NothingToHeal { healer } => {
                format!("{} readies a healing spell, but nobody needs it.", healer)
            }
            Self::NoHealer => "No healer in the party has enough MP to cast heal.".to_string(),
        }
    }
}

/// The last structured result a subsystem produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubsystemResult {
    Intent(IntentAnalysis),
    Battle(BattleOutcome),
    Rewards(Vec<GrantedItem>),
    Purchase(PurchaseReceipt),
    Inventory(InventoryOutcome),
    Recruited { companion_id: CharacterId, name: String },
    Dismissed { companion_id: CharacterId, name: String },
}
