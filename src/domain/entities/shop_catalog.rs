//! Shop catalog - static reference data for the merchant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::CharacterId;

/// An item the shop sells. Stock is display-only; purchases never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopCatalogEntry {
    pub name: &'static str,
    pub base_price: u32,
    pub item_type: &'static str,
    pub description: &'static str,
    pub stock: u32,
}

pub const SHOP_CATALOG: [ShopCatalogEntry; 4] = [
    ShopCatalogEntry {
        name: "healing potion",
        base_price: 50,
        item_type: "hp_potion",
        description: "Restores 50 HP",
        stock: 10,
    },
    ShopCatalogEntry {
        name: "mana potion",
        base_price: 50,
        item_type: "mp_potion",
        description: "Restores 30 MP",
        stock: 10,
    },
    ShopCatalogEntry {
        name: "reinforced shield",
        base_price: 200,
        item_type: "shield",
        description: "A sturdy shield banded with iron",
        stock: 3,
    },
    ShopCatalogEntry {
        name: "dark crystal",
        base_price: 100,
        item_type: "crystal",
        description: "A crystal humming with dark power",
        stock: 5,
    },
];

/// Keyword → catalog item name, checked in order
const KEYWORDS: [(&str, &str); 8] = [
    ("potion", "healing potion"),
    ("heal", "healing potion"),
    ("hp", "healing potion"),
    ("mana", "mana potion"),
    ("mp", "mana potion"),
    ("shield", "reinforced shield"),
    ("crystal", "dark crystal"),
    ("dark", "dark crystal"),
];

pub fn find_catalog_entry(name: &str) -> Option<&'static ShopCatalogEntry> {
    SHOP_CATALOG.iter().find(|entry| entry.name.eq_ignore_ascii_case(name.trim()))
}

/// Pick the catalog item a free-text purchase request refers to.
/// "mana potion" must resolve to the mana potion, so the mana keywords win
/// whenever they are present.
pub fn match_catalog_entry(request: &str) -> Option<&'static ShopCatalogEntry> {
    let lower = request.to_lowercase();
    if let Some(exact) = SHOP_CATALOG.iter().find(|entry| lower.contains(entry.name)) {
        return Some(exact);
    }
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |keyword: &str| words.iter().any(|w| w.starts_with(keyword));
    let item_name = if mentions("mana") || mentions("mp") {
        Some("mana potion")
    } else {
        KEYWORDS
            .iter()
            .find(|(keyword, _)| mentions(*keyword))
            .map(|(_, item)| *item)
    };
    item_name.and_then(find_catalog_entry)
}

/// A completed purchase, as logged by the world store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopTransaction {
    pub buyer_id: CharacterId,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub reputation_at_purchase: i32,
    pub transaction_type: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_catalog_entry_by_keyword() {
        assert_eq!(match_catalog_entry("I want to buy a potion").map(|e| e.name), Some("healing potion"));
        assert_eq!(match_catalog_entry("buy 2 mana potions").map(|e| e.name), Some("mana potion"));
        assert_eq!(match_catalog_entry("some MP please").map(|e| e.name), Some("mana potion"));
        assert_eq!(match_catalog_entry("that shield").map(|e| e.name), Some("reinforced shield"));
        assert_eq!(match_catalog_entry("the dark thing").map(|e| e.name), Some("dark crystal"));
        assert!(match_catalog_entry("a horse").is_none());
    }

    #[test]
    fn test_find_catalog_entry_ignores_case() {
        assert_eq!(find_catalog_entry("Dark Crystal").map(|e| e.base_price), Some(100));
    }
}
