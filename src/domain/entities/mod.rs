//! Domain entities - Core business objects with identity

mod character;
mod inventory;
mod item_catalog;
mod reputation_change;
mod shop_catalog;
mod story_event;

pub use character::{Character, CharacterKind, NewCharacter};
pub use inventory::{InventoryEntry, NewItem};
pub use item_catalog::{starting_kit, ItemTemplate, QuestKind, REWARD_ITEMS};
pub use reputation_change::ReputationChange;
pub use shop_catalog::{
    find_catalog_entry, match_catalog_entry, ShopCatalogEntry, ShopTransaction, SHOP_CATALOG,
};
pub use story_event::{NewStoryEvent, StoryEvent};
