//! Inventory entries - stacks of items owned by a character

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CharacterId, InventoryEntryId};

/// A stack of identical items. Only stacks with `quantity > 0` exist;
/// the world store deletes an entry the moment it reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: InventoryEntryId,
    pub owner_id: CharacterId,
    pub item_name: String,
    pub item_type: String,
    pub quantity: i32,
    pub description: String,
    pub unit_value: i64,
}

impl InventoryEntry {
    /// Stacking key
    pub fn matches(&self, item_name: &str, item_type: &str) -> bool {
        self.item_name == item_name && self.item_type == item_type
    }
}

/// An item about to be added to someone's inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub item_type: String,
    pub quantity: i32,
    pub description: String,
    pub unit_value: i64,
}

impl NewItem {
    pub fn new(
        name: impl Into<String>,
        item_type: impl Into<String>,
        quantity: i32,
        description: impl Into<String>,
        unit_value: i64,
    ) -> Self {
        Self {
            name: name.into(),
            item_type: item_type.into(),
            quantity,
            description: description.into(),
            unit_value,
        }
    }
}
