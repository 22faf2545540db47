//! Fixed tuning values shared by the game subsystems

/// Party capacity: one player plus this many companions
pub const MAX_COMPANIONS: usize = 2;
pub const MAX_PARTY_SIZE: usize = MAX_COMPANIONS + 1;

pub const STARTING_GOLD: i64 = 300;
pub const STARTING_REPUTATION: i32 = 0;
pub const STARTING_LEVEL: i32 = 1;

pub const CRITICAL_CHANCE: f64 = 0.15;
pub const SPECIAL_ACTION_CHANCE: f64 = 0.20;
pub const CRITICAL_MULTIPLIER: f64 = 1.5;

pub const HEALING_POTION_AMOUNT: i32 = 50;
pub const MANA_POTION_AMOUNT: i32 = 30;
pub const HEAL_SPELL_AMOUNT: i32 = 70;
pub const HEAL_SPELL_COST: i32 = 10;

/// Chance that a rare (accessory / misc) reward draw is kept
pub const RARE_ITEM_KEEP_CHANCE: f64 = 0.3;
pub const MAX_REWARD_ITEMS: usize = 5;

/// Item type tags used across inventory, rewards and the shop
pub mod item_types {
    pub const HP_POTION: &str = "hp_potion";
    pub const MP_POTION: &str = "mp_potion";
    pub const ACCESSORY: &str = "accessory";
    pub const MISC: &str = "misc";
    pub const FOOD: &str = "food";
    pub const MATERIAL: &str = "material";
    pub const CURRENCY: &str = "currency";
}

/// Story event type tags
pub mod event_types {
    pub const BATTLE_VICTORY: &str = "battle_victory";
    pub const PERMANENT_EVENT: &str = "permanent_event";
    pub const QUEST_COMPLETE: &str = "quest_complete";
}
