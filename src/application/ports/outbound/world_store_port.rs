//! World store port - durable storage for characters, inventory and logs
//!
//! Every operation is atomic on its own: the implementation performs its
//! read-modify-write inside a single transaction. No operation spans more
//! than one call, so a caller that performs several mutations in a row must
//! tolerate observing the intermediate results.

use async_trait::async_trait;

use crate::domain::entities::{
    Character, InventoryEntry, NewCharacter, NewItem, NewStoryEvent, ReputationChange,
    ShopTransaction, StoryEvent,
};
use crate::domain::value_objects::{CharacterId, InventoryEntryId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Invalid data: {0}")]
    Invalid(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn character_not_found(id: CharacterId) -> Self {
        Self::NotFound {
            entity: "character",
            id: id.to_string(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorldStorePort: Send + Sync {
    async fn create_character(&self, character: NewCharacter) -> Result<CharacterId, StoreError>;

    async fn get_character(&self, id: CharacterId) -> Result<Character, StoreError>;

    /// Returns `(new_hp, still_alive)`; hp never drops below zero
    async fn apply_damage(&self, id: CharacterId, amount: i32) -> Result<(i32, bool), StoreError>;

    /// Returns `(new_hp, new_mp)`. Negative deltas consume; both stats stay in `[0, max]`.
    async fn heal(&self, id: CharacterId, hp_delta: i32, mp_delta: i32) -> Result<(i32, i32), StoreError>;

    /// Clamps to `[-100, 100]` and appends a change record
    async fn update_reputation(
        &self,
        id: CharacterId,
        delta: i32,
        reason: &str,
        location: &str,
    ) -> Result<i32, StoreError>;

    /// Floors at zero. Callers must check sufficiency before spending.
    async fn update_gold(&self, id: CharacterId, delta: i64) -> Result<i64, StoreError>;

    /// Merges into the `(owner, name, type)` stack when one exists
    async fn add_item(&self, owner_id: CharacterId, item: NewItem) -> Result<InventoryEntryId, StoreError>;

    /// `false` when the stack holds fewer than `quantity`; empties are deleted
    async fn use_item(
        &self,
        owner_id: CharacterId,
        entry_id: InventoryEntryId,
        quantity: i32,
    ) -> Result<bool, StoreError>;

    /// Stacks ordered by item type, then name
    async fn get_inventory(&self, owner_id: CharacterId) -> Result<Vec<InventoryEntry>, StoreError>;

    /// Members with `is_in_party`, ordered by class, then name
    async fn get_party_status(&self) -> Result<Vec<Character>, StoreError>;

    /// Move a character in or out of the party and relocate them
    async fn set_party_membership(
        &self,
        id: CharacterId,
        in_party: bool,
        location: &str,
    ) -> Result<(), StoreError>;

    async fn record_shop_transaction(&self, transaction: ShopTransaction) -> Result<(), StoreError>;

    async fn add_story_event(&self, event: NewStoryEvent) -> Result<(), StoreError>;

    /// Newest first
    async fn get_recent_events(&self, owner_id: CharacterId, limit: u32) -> Result<Vec<StoryEvent>, StoreError>;

    async fn count_events(&self, owner_id: CharacterId, event_type: &str) -> Result<u32, StoreError>;

    /// Newest first
    async fn get_reputation_history(
        &self,
        owner_id: CharacterId,
        limit: u32,
    ) -> Result<Vec<ReputationChange>, StoreError>;
}
