//! Item tables - loot, quest rewards and class starting kits

use serde::{Deserialize, Serialize};

use crate::domain::entities::NewItem;
use crate::domain::value_objects::game_constants::item_types;
use crate::domain::value_objects::CharacterClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTemplate {
    pub name: &'static str,
    pub item_type: &'static str,
    pub description: &'static str,
    pub value: i64,
}

impl ItemTemplate {
    const fn new(name: &'static str, item_type: &'static str, description: &'static str, value: i64) -> Self {
        Self { name, item_type, description, value }
    }

    pub fn to_new_item(&self, quantity: i32) -> NewItem {
        NewItem::new(self.name, self.item_type, quantity, self.description, self.value)
    }

    pub fn is_rare(&self) -> bool {
        self.item_type == item_types::ACCESSORY || self.item_type == item_types::MISC
    }

    /// Consumables and materials found while exploring
    pub fn is_common(&self) -> bool {
        [
            item_types::HP_POTION,
            item_types::MP_POTION,
            item_types::FOOD,
            item_types::MATERIAL,
            item_types::CURRENCY,
        ]
        .contains(&self.item_type)
    }
}

pub const REWARD_ITEMS: [ItemTemplate; 10] = [
    ItemTemplate::new("healing potion", "hp_potion", "Restores 50 HP", 50),
    ItemTemplate::new("mana potion", "mp_potion", "Restores 30 MP", 50),
    ItemTemplate::new("greater healing potion", "hp_potion", "Restores 100 HP", 100),
    ItemTemplate::new("magic scroll", "scroll", "A single-use magic item", 75),
    ItemTemplate::new("silver coin", "currency", "Valuable coinage", 25),
    ItemTemplate::new("bread", "food", "Keeps hunger at bay", 10),
    ItemTemplate::new("iron ore", "material", "Used to forge weapons", 30),
    ItemTemplate::new("magic dust", "material", "Used to craft magic items", 40),
    ItemTemplate::new("old map", "misc", "Marks the location of a treasure", 200),
    ItemTemplate::new("ring", "accessory", "A ring that sharpens its wearer", 150),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestKind {
    Main,
    Side,
    Rescue,
}

impl QuestKind {
    /// Infer the quest kind from an event summary; unknown kinds are side quests
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("main") {
            Self::Main
        } else if lower.contains("rescue") {
            Self::Rescue
        } else {
            Self::Side
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Main => "main quest",
            Self::Side => "side quest",
            Self::Rescue => "rescue quest",
        }
    }

    pub fn reputation_reward(self) -> i32 {
        match self {
            Self::Main => 15,
            Self::Side => 5,
            Self::Rescue => 10,
        }
    }

    pub fn reward_table(self) -> &'static [ItemTemplate] {
        const MAIN: [ItemTemplate; 3] = [
            ItemTemplate::new("legendary sword", "weapon", "A blade steeped in ancient power", 500),
            ItemTemplate::new("magic armor", "armor", "Armor woven with protective wards", 400),
            ItemTemplate::new("ring of wisdom", "accessory", "Sharpens the mind of its wearer", 300),
        ];
        const SIDE: [ItemTemplate; 3] = [
            ItemTemplate::new("greater healing potion", "hp_potion", "Restores 100 HP", 100),
            ItemTemplate::new("magic scroll", "scroll", "A potent spell scroll", 75),
            ItemTemplate::new("silver coin", "currency", "Quest bounty", 50),
        ];
        const RESCUE: [ItemTemplate; 3] = [
            ItemTemplate::new("necklace of gratitude", "accessory", "A token of thanks for the rescue", 200),
            ItemTemplate::new("blessed potion", "hp_potion", "A potion carrying a god's blessing", 150),
            ItemTemplate::new("crystal of hope", "crystal", "A crystal glowing with hope", 250),
        ];
        match self {
            Self::Main => &MAIN,
            Self::Side => &SIDE,
            Self::Rescue => &RESCUE,
        }
    }
}

/// Equipment a freshly created character starts with
pub fn starting_kit(class: CharacterClass) -> Vec<NewItem> {
    match class {
        CharacterClass::Warrior => vec![
            NewItem::new("iron sword", "weapon", 1, "A sturdy blade of forged iron", 0),
            NewItem::new("leather armor", "armor", 1, "Basic protection", 0),
            NewItem::new("wooden shield", "shield", 1, "A solid wooden shield", 0),
            NewItem::new("healing potion", "hp_potion", 3, "Restores 50 HP", 50),
        ],
        CharacterClass::Mage => vec![
            NewItem::new("magic staff", "weapon", 1, "A staff that amplifies spellcraft", 0),
            NewItem::new("mage robe", "armor", 1, "A robe offering magical protection", 0),
            NewItem::new("spellbook: fireball", "spellbook", 1, "A book of fire magic", 0),
            NewItem::new("mana potion", "mp_potion", 5, "Restores 30 MP", 50),
        ],
        CharacterClass::Rogue => vec![
            NewItem::new("dagger", "weapon", 1, "A keen-edged dagger", 0),
            NewItem::new("leather armor", "armor", 1, "Quiet leather armor", 0),
            NewItem::new("tool kit", "tool", 1, "Lockpicks and assorted tools", 0),
            NewItem::new("poison vial", "consumable", 1, "Coats a weapon in poison", 0),
        ],
        CharacterClass::Archer => vec![
            NewItem::new("longbow", "weapon", 1, "An accurate long-range bow", 0),
            NewItem::new("arrow", "ammunition", 30, "A quiver of arrows", 0),
            NewItem::new("leather armor", "armor", 1, "Light leather armor", 0),
            NewItem::new("healing potion", "hp_potion", 2, "Restores 50 HP", 50),
        ],
        CharacterClass::Priest => vec![
            NewItem::new("holy staff", "weapon", 1, "A staff infused with healing magic", 0),
            NewItem::new("priest robe", "armor", 1, "A robe holding sacred power", 0),
            NewItem::new("holy water", "consumable", 3, "Effective against the undead", 0),
            NewItem::new("healing potion", "hp_potion", 4, "Restores 50 HP", 50),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rare_and_common_partition() {
        let rare: Vec<_> = REWARD_ITEMS.iter().filter(|t| t.is_rare()).map(|t| t.name).collect();
        assert_eq!(rare, vec!["old map", "ring"]);
        assert_eq!(REWARD_ITEMS.iter().filter(|t| t.is_common()).count(), 7);
    }

    #[test]
    fn test_quest_kind_from_text() {
        assert_eq!(QuestKind::from_text("Main quest complete!"), QuestKind::Main);
        assert_eq!(QuestKind::from_text("rescue quest complete"), QuestKind::Rescue);
        assert_eq!(QuestKind::from_text("quest complete"), QuestKind::Side);
    }

    #[test]
    fn test_every_class_gets_a_kit() {
        for class in CharacterClass::ALL {
            let kit = starting_kit(class);
            assert_eq!(kit.len(), 4);
            assert!(kit.iter().all(|item| item.quantity > 0));
        }
    }
}
