//! Character entity - the player, companions and hostile NPCs

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::reputation::{MAX_REPUTATION, MIN_REPUTATION};
use crate::domain::value_objects::CharacterId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    Player,
    Companion,
    Npc,
}

impl CharacterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Companion => "companion",
            Self::Npc => "npc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "player" => Some(Self::Player),
            "companion" => Some(Self::Companion),
            "npc" => Some(Self::Npc),
            _ => None,
        }
    }
}

/// A persisted character record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub kind: CharacterKind,
    pub race: String,
    pub class: String,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub current_location: String,
    pub is_in_party: bool,
    pub relationship_level: i32,
    /// Only meaningful for the player
    pub reputation: i32,
    /// Only meaningful for the player
    pub gold: i64,
    pub backstory: String,
}

impl Character {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn missing_hp(&self) -> i32 {
        self.max_hp - self.hp
    }

    pub fn missing_mp(&self) -> i32 {
        self.max_mp - self.mp
    }

    pub fn is_damaged(&self) -> bool {
        self.is_alive() && self.hp < self.max_hp
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64
    }

    /// "Aria (elf mage, Lv.1)"
    pub fn summary(&self) -> String {
        format!("{} ({} {}, Lv.{})", self.name, self.race, self.class, self.level)
    }

    pub fn vitals(&self) -> String {
        format!("HP {}/{} | MP {}/{}", self.hp, self.max_hp, self.mp, self.max_mp)
    }
}

/// Data required to create a character. Invariants are checked by [`NewCharacter::validate`]
/// before anything is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCharacter {
    pub name: String,
    pub kind: CharacterKind,
    pub race: String,
    pub class: String,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub current_location: String,
    pub is_in_party: bool,
    pub relationship_level: i32,
    pub reputation: i32,
    pub gold: i64,
    pub backstory: String,
}

impl NewCharacter {
    pub fn new(
        name: impl Into<String>,
        kind: CharacterKind,
        race: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            race: race.into(),
            class: class.into(),
            level: 1,
            hp: 100,
            max_hp: 100,
            mp: 30,
            max_mp: 30,
            strength: 10,
            agility: 10,
            intelligence: 10,
            current_location: String::new(),
            is_in_party: false,
            relationship_level: 0,
            reputation: 0,
            gold: 0,
            backstory: String::new(),
        }
    }

    /// Full HP and MP at the given maximums
    pub fn with_vitals(mut self, max_hp: i32, max_mp: i32) -> Self {
        self.hp = max_hp;
        self.max_hp = max_hp;
        self.mp = max_mp;
        self.max_mp = max_mp;
        self
    }

    pub fn with_stats(mut self, strength: i32, agility: i32, intelligence: i32) -> Self {
        self.strength = strength;
        self.agility = agility;
        self.intelligence = intelligence;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.current_location = location.into();
        self
    }

    pub fn in_party(mut self) -> Self {
        self.is_in_party = true;
        self
    }

    pub fn with_wealth(mut self, reputation: i32, gold: i64) -> Self {
        self.reputation = reputation;
        self.gold = gold;
        self
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("character name cannot be empty".to_string());
        }
        if self.max_hp <= 0 || self.max_mp < 0 {
            return Err(format!(
                "invalid maximums for {}: max_hp={}, max_mp={}",
                self.name, self.max_hp, self.max_mp
            ));
        }
        if !(0..=self.max_hp).contains(&self.hp) {
            return Err(format!("hp {} outside [0, {}]", self.hp, self.max_hp));
        }
        if !(0..=self.max_mp).contains(&self.mp) {
            return Err(format!("mp {} outside [0, {}]", self.mp, self.max_mp));
        }
        if !(MIN_REPUTATION..=MAX_REPUTATION).contains(&self.reputation) {
            return Err(format!("reputation {} outside [-100, 100]", self.reputation));
        }
        if self.gold < 0 {
            return Err(format!("gold cannot be negative ({})", self.gold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewCharacter {
        NewCharacter::new("Aria", CharacterKind::Player, "elf", "mage").with_vitals(92, 106)
    }

    #[test]
    fn test_valid_character_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut hurt = sample();
        hurt.hp = 93;
        assert!(hurt.validate().is_err());

        let broke = sample().with_wealth(0, -1);
        assert!(broke.validate().is_err());

        let infamous = sample().with_wealth(-101, 0);
        assert!(infamous.validate().is_err());

        let mut nameless = sample();
        nameless.name = "  ".to_string();
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(CharacterKind::parse("companion"), Some(CharacterKind::Companion));
        assert_eq!(CharacterKind::parse("dragon"), None);
    }
}
