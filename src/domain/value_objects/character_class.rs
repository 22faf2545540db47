//! Playable classes and races, and the combat archetype of any class name

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Warrior,
    Mage,
    Rogue,
    Archer,
    Priest,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 5] = [
        CharacterClass::Warrior,
        CharacterClass::Mage,
        CharacterClass::Rogue,
        CharacterClass::Archer,
        CharacterClass::Priest,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Mage => "mage",
            Self::Rogue => "rogue",
            Self::Archer => "archer",
            Self::Priest => "priest",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Warrior => &["warrior", "fighter"],
            Self::Mage => &["mage", "wizard", "sorcerer"],
            Self::Rogue => &["rogue", "thief"],
            Self::Archer => &["archer", "ranger"],
            Self::Priest => &["priest", "cleric"],
        }
    }

    /// Recognize a class word anywhere in free text
    pub fn find_in(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let found = words(&lower).find_map(|word| {
            Self::ALL
                .iter()
                .copied()
                .find(|class| class.aliases().contains(&word))
        });
        found
    }

    /// (strength, agility, intelligence, hp bonus, mp bonus)
    pub fn base_stats(self) -> (i32, i32, i32, i32, i32) {
        match self {
            Self::Warrior => (12, 8, 6, 20, 0),
            Self::Mage => (6, 8, 12, 0, 30),
            Self::Rogue => (8, 12, 6, 10, 10),
            Self::Archer => (8, 11, 7, 15, 5),
            Self::Priest => (7, 7, 11, 15, 25),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Warrior => "high HP, close combat",
            Self::Mage => "high MP, offensive magic",
            Self::Rogue => "high agility, stealth and tricks",
            Self::Archer => "ranged attacks, precision",
            Self::Priest => "healing magic, support",
        }
    }
}

impl std::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Orc,
    Halfling,
}

impl Race {
    pub const ALL: [Race; 5] = [Race::Human, Race::Elf, Race::Dwarf, Race::Orc, Race::Halfling];

    pub fn name(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Elf => "elf",
            Self::Dwarf => "dwarf",
            Self::Orc => "orc",
            Self::Halfling => "halfling",
        }
    }

    pub fn find_in(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let found = words(&lower).find_map(|word| {
            let singular = word.strip_suffix('s').unwrap_or(word);
            Self::ALL
                .iter()
                .copied()
                .find(|race| race.name() == word || race.name() == singular || (*race == Race::Elf && word == "elven"))
        });
        found
    }

    /// (strength, agility, intelligence) adjustments
    pub fn modifiers(self) -> (i32, i32, i32) {
        match self {
            Self::Human => (0, 0, 0),
            Self::Elf => (-1, 2, 1),
            Self::Dwarf => (2, -1, 0),
            Self::Orc => (2, 0, -1),
            Self::Halfling => (-1, 2, 0),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Human => "balanced",
            Self::Elf => "agile and clever",
            Self::Dwarf => "strong and sturdy",
            Self::Orc => "brute strength",
            Self::Halfling => "small and quick",
        }
    }
}

impl std::fmt::Display for Race {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Stats a fresh player starts with.
///
/// HP and MP derive from the class base values before the race adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingStats {
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub hp: i32,
    pub mp: i32,
}

impl StartingStats {
    pub fn compute(class: CharacterClass, race: Race) -> Self {
        let (strength, agility, intelligence, hp_bonus, mp_bonus) = class.base_stats();
        let (str_mod, agi_mod, int_mod) = race.modifiers();
        Self {
            strength: strength + str_mod,
            agility: agility + agi_mod,
            intelligence: intelligence + int_mod,
            hp: 80 + hp_bonus + strength * 2,
            mp: 40 + mp_bonus + intelligence * 3,
        }
    }
}

/// How a class name behaves in combat and healing, for any class string
/// including the free-form ones companions arrive with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatArchetype {
    Healer,
    Caster,
    Fighter,
    Other,
}

impl CombatArchetype {
    pub fn of(class_name: &str) -> Self {
        let lower = class_name.to_lowercase();
        if ["priest", "cleric", "healer"].iter().any(|k| lower.contains(k)) {
            Self::Healer
        } else if ["mage", "wizard", "sorcerer", "warlock"].iter().any(|k| lower.contains(k)) {
            Self::Caster
        } else if ["warrior", "fighter", "knight", "paladin"].iter().any(|k| lower.contains(k)) {
            Self::Fighter
        } else {
            Self::Other
        }
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_stats_for_elf_mage() {
        let stats = StartingStats::compute(CharacterClass::Mage, Race::Elf);
        assert_eq!(stats.strength, 5);
        assert_eq!(stats.agility, 10);
        assert_eq!(stats.intelligence, 13);
        assert_eq!(stats.hp, 80 + 12);
        assert_eq!(stats.mp, 40 + 30 + 36);
    }

    #[test]
    fn test_starting_stats_for_human_warrior() {
        let stats = StartingStats::compute(CharacterClass::Warrior, Race::Human);
        assert_eq!(stats.hp, 124);
        assert_eq!(stats.mp, 58);
    }

    #[test]
    fn test_find_in_free_text() {
        assert_eq!(CharacterClass::find_in("I am a dwarven Cleric"), Some(CharacterClass::Priest));
        assert_eq!(Race::find_in("I am a dwarf cleric"), Some(Race::Dwarf));
        assert_eq!(Race::find_in("Aria the elven archer"), Some(Race::Elf));
        assert_eq!(CharacterClass::find_in("nothing to see"), None);
    }

    #[test]
    fn test_combat_archetype() {
        assert_eq!(CombatArchetype::of("Priest"), CombatArchetype::Healer);
        assert_eq!(CombatArchetype::of("battle cleric"), CombatArchetype::Healer);
        assert_eq!(CombatArchetype::of("dark wizard"), CombatArchetype::Caster);
        assert_eq!(CombatArchetype::of("warrior"), CombatArchetype::Fighter);
        assert_eq!(CombatArchetype::of("assassin"), CombatArchetype::Other);
    }
}
