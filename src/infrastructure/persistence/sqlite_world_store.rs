//! SQLite world store
//!
//! Each port operation runs inside its own transaction so a read-modify-write
//! is never observed half-applied. The pool is capped at one connection:
//! the engine serves a single session and an in-memory database only exists
//! on the connection that created it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, instrument};

use crate::application::ports::outbound::{StoreError, WorldStorePort};
use crate::domain::entities::{
    Character, CharacterKind, InventoryEntry, NewCharacter, NewItem, NewStoryEvent,
    ReputationChange, ShopTransaction, StoryEvent,
};
use crate::domain::value_objects::reputation::clamp_reputation;
use crate::domain::value_objects::{CharacterId, InventoryEntryId};

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS characters (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        kind TEXT NOT NULL,
        race TEXT NOT NULL,
        class TEXT NOT NULL,
        level INTEGER NOT NULL DEFAULT 1,
        hp INTEGER NOT NULL,
        max_hp INTEGER NOT NULL,
        mp INTEGER NOT NULL,
        max_mp INTEGER NOT NULL,
        strength INTEGER NOT NULL DEFAULT 10,
        agility INTEGER NOT NULL DEFAULT 10,
        intelligence INTEGER NOT NULL DEFAULT 10,
        current_location TEXT NOT NULL DEFAULT '',
        is_in_party INTEGER NOT NULL DEFAULT 0,
        relationship_level INTEGER NOT NULL DEFAULT 0,
        reputation INTEGER NOT NULL DEFAULT 0,
        gold INTEGER NOT NULL DEFAULT 0,
        backstory TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        CHECK (hp >= 0 AND hp <= max_hp),
        CHECK (mp >= 0 AND mp <= max_mp),
        CHECK (reputation BETWEEN -100 AND 100),
        CHECK (gold >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL REFERENCES characters(id),
        item_name TEXT NOT NULL,
        item_type TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        description TEXT NOT NULL DEFAULT '',
        unit_value INTEGER NOT NULL DEFAULT 0,
        acquired_at TEXT NOT NULL,
        UNIQUE (owner_id, item_name, item_type)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS story_events (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id TEXT NOT NULL REFERENCES characters(id),
        event_type TEXT NOT NULL,
        description TEXT NOT NULL,
        location TEXT NOT NULL,
        turn INTEGER NOT NULL,
        reputation_delta INTEGER NOT NULL DEFAULT 0,
        gold_delta INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reputation_changes (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id TEXT NOT NULL REFERENCES characters(id),
        old_value INTEGER NOT NULL,
        new_value INTEGER NOT NULL,
        delta INTEGER NOT NULL,
        reason TEXT NOT NULL,
        location TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS shop_transactions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        buyer_id TEXT NOT NULL REFERENCES characters(id),
        item_name TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price INTEGER NOT NULL,
        total_price INTEGER NOT NULL,
        reputation_at_purchase INTEGER NOT NULL,
        transaction_type TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
];

pub struct SqliteWorldStore {
    pool: SqlitePool,
}

impl SqliteWorldStore {
    /// Wrap an existing pool, creating the schema if needed
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        Self::new(pool).await
    }

    /// Fresh, private database; used by tests and throwaway sessions
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Database(format!("bad timestamp '{}': {}", value, e)))
}

fn parse_character_id(value: &str) -> Result<CharacterId, StoreError> {
    CharacterId::parse(value).map_err(|e| StoreError::Database(format!("bad character id '{}': {}", value, e)))
}

fn map_character(row: &SqliteRow) -> Result<Character, StoreError> {
    let id: String = row.try_get("id").map_err(db_err)?;
    let kind: String = row.try_get("kind").map_err(db_err)?;
    Ok(Character {
        id: parse_character_id(&id)?,
        name: row.try_get("name").map_err(db_err)?,
        kind: CharacterKind::parse(&kind)
            .ok_or_else(|| StoreError::Database(format!("unknown character kind '{}'", kind)))?,
        race: row.try_get("race").map_err(db_err)?,
        class: row.try_get("class").map_err(db_err)?,
        level: row.try_get("level").map_err(db_err)?,
        hp: row.try_get("hp").map_err(db_err)?,
        max_hp: row.try_get("max_hp").map_err(db_err)?,
        mp: row.try_get("mp").map_err(db_err)?,
        max_mp: row.try_get("max_mp").map_err(db_err)?,
        strength: row.try_get("strength").map_err(db_err)?,
        agility: row.try_get("agility").map_err(db_err)?,
        intelligence: row.try_get("intelligence").map_err(db_err)?,
        current_location: row.try_get("current_location").map_err(db_err)?,
        is_in_party: row.try_get("is_in_party").map_err(db_err)?,
        relationship_level: row.try_get("relationship_level").map_err(db_err)?,
        reputation: row.try_get("reputation").map_err(db_err)?,
        gold: row.try_get("gold").map_err(db_err)?,
        backstory: row.try_get("backstory").map_err(db_err)?,
    })
}

fn map_inventory_entry(row: &SqliteRow) -> Result<InventoryEntry, StoreError> {
    let id: String = row.try_get("id").map_err(db_err)?;
    let owner_id: String = row.try_get("owner_id").map_err(db_err)?;
    Ok(InventoryEntry {
        id: InventoryEntryId::parse(&id)
            .map_err(|e| StoreError::Database(format!("bad inventory id '{}': {}", id, e)))?,
        owner_id: parse_character_id(&owner_id)?,
        item_name: row.try_get("item_name").map_err(db_err)?,
        item_type: row.try_get("item_type").map_err(db_err)?,
        quantity: row.try_get("quantity").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        unit_value: row.try_get("unit_value").map_err(db_err)?,
    })
}

#[async_trait]
impl WorldStorePort for SqliteWorldStore {
    #[instrument(skip(self, character), fields(name = %character.name, kind = character.kind.as_str()))]
    async fn create_character(&self, character: NewCharacter) -> Result<CharacterId, StoreError> {
        character.validate().map_err(StoreError::Invalid)?;
        let id = CharacterId::new();

        sqlx::query(
            r#"
            INSERT INTO characters (
                id, name, kind, race, class, level, hp, max_hp, mp, max_mp,
                strength, agility, intelligence, current_location, is_in_party,
                relationship_level, reputation, gold, backstory, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&character.name)
        .bind(character.kind.as_str())
        .bind(&character.race)
        .bind(&character.class)
        .bind(character.level)
        .bind(character.hp)
        .bind(character.max_hp)
        .bind(character.mp)
        .bind(character.max_mp)
        .bind(character.strength)
        .bind(character.agility)
        .bind(character.intelligence)
        .bind(&character.current_location)
        .bind(character.is_in_party)
        .bind(character.relationship_level)
        .bind(character.reputation)
        .bind(character.gold)
        .bind(&character.backstory)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        debug!(character_id = %id, "Character created");
        Ok(id)
    }

    async fn get_character(&self, id: CharacterId) -> Result<Character, StoreError> {
        let row = sqlx::query("SELECT * FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::character_not_found(id))?;
        map_character(&row)
    }

    #[instrument(skip(self))]
    async fn apply_damage(&self, id: CharacterId, amount: i32) -> Result<(i32, bool), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query("SELECT hp FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::character_not_found(id))?;
        let hp: i32 = row.try_get("hp").map_err(db_err)?;
        let new_hp = (hp as i64 - amount.max(0) as i64).max(0) as i32;

        sqlx::query("UPDATE characters SET hp = ? WHERE id = ?")
            .bind(new_hp)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok((new_hp, new_hp > 0))
    }

    #[instrument(skip(self))]
    async fn heal(&self, id: CharacterId, hp_delta: i32, mp_delta: i32) -> Result<(i32, i32), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query("SELECT hp, max_hp, mp, max_mp FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::character_not_found(id))?;
        let hp: i32 = row.try_get("hp").map_err(db_err)?;
        let max_hp: i32 = row.try_get("max_hp").map_err(db_err)?;
        let mp: i32 = row.try_get("mp").map_err(db_err)?;
        let max_mp: i32 = row.try_get("max_mp").map_err(db_err)?;

        let new_hp = (hp as i64 + hp_delta as i64).clamp(0, max_hp as i64) as i32;
        let new_mp = (mp as i64 + mp_delta as i64).clamp(0, max_mp as i64) as i32;

        sqlx::query("UPDATE characters SET hp = ?, mp = ? WHERE id = ?")
            .bind(new_hp)
            .bind(new_mp)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok((new_hp, new_mp))
    }

    #[instrument(skip(self))]
    async fn update_reputation(
        &self,
        id: CharacterId,
        delta: i32,
        reason: &str,
        location: &str,
    ) -> Result<i32, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query("SELECT reputation FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::character_not_found(id))?;
        let old_value: i32 = row.try_get("reputation").map_err(db_err)?;
        let new_value = clamp_reputation(old_value as i64 + delta as i64);

        sqlx::query("UPDATE characters SET reputation = ? WHERE id = ?")
            .bind(new_value)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO reputation_changes (owner_id, old_value, new_value, delta, reason, location, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(old_value)
        .bind(new_value)
        .bind(delta)
        .bind(reason)
        .bind(location)
        .bind(now())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        debug!(old_value, new_value, "Reputation updated");
        Ok(new_value)
    }

    #[instrument(skip(self))]
    async fn update_gold(&self, id: CharacterId, delta: i64) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query("SELECT gold FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::character_not_found(id))?;
        let gold: i64 = row.try_get("gold").map_err(db_err)?;
        let new_gold = gold.saturating_add(delta).max(0);

        sqlx::query("UPDATE characters SET gold = ? WHERE id = ?")
            .bind(new_gold)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok(new_gold)
    }

    #[instrument(skip(self, item), fields(item = %item.name, quantity = item.quantity))]
    async fn add_item(&self, owner_id: CharacterId, item: NewItem) -> Result<InventoryEntryId, StoreError> {
        if item.quantity <= 0 {
            return Err(StoreError::Invalid(format!(
                "cannot add {} {}",
                item.quantity, item.name
            )));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let owner = sqlx::query("SELECT id FROM characters WHERE id = ?")
            .bind(owner_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if owner.is_none() {
            return Err(StoreError::character_not_found(owner_id));
        }

        let existing = sqlx::query(
            "SELECT id FROM inventory WHERE owner_id = ? AND item_name = ? AND item_type = ?",
        )
        .bind(owner_id.to_string())
        .bind(&item.name)
        .bind(&item.item_type)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let entry_id = match existing {
            Some(row) => {
                let id: String = row.try_get("id").map_err(db_err)?;
                sqlx::query("UPDATE inventory SET quantity = quantity + ? WHERE id = ?")
                    .bind(item.quantity)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
                InventoryEntryId::parse(&id)
                    .map_err(|e| StoreError::Database(format!("bad inventory id '{}': {}", id, e)))?
            }
            None => {
                let id = InventoryEntryId::new();
                sqlx::query(
                    r#"
                    INSERT INTO inventory (id, owner_id, item_name, item_type, quantity, description, unit_value, acquired_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(owner_id.to_string())
                .bind(&item.name)
                .bind(&item.item_type)
                .bind(item.quantity)
                .bind(&item.description)
                .bind(item.unit_value)
                .bind(now())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
                id
            }
        };

        tx.commit().await.map_err(db_err)?;
        Ok(entry_id)
    }

    #[instrument(skip(self))]
    async fn use_item(
        &self,
        owner_id: CharacterId,
        entry_id: InventoryEntryId,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query("SELECT quantity FROM inventory WHERE id = ? AND owner_id = ?")
            .bind(entry_id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "inventory entry",
                id: entry_id.to_string(),
            })?;
        let current: i32 = row.try_get("quantity").map_err(db_err)?;

        if quantity <= 0 || quantity > current {
            return Ok(false);
        }

        let remaining = current - quantity;
        if remaining == 0 {
            sqlx::query("DELETE FROM inventory WHERE id = ?")
                .bind(entry_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        } else {
            sqlx::query("UPDATE inventory SET quantity = ? WHERE id = ?")
                .bind(remaining)
                .bind(entry_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;

        Ok(true)
    }

    async fn get_inventory(&self, owner_id: CharacterId) -> Result<Vec<InventoryEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM inventory WHERE owner_id = ? AND quantity > 0 ORDER BY item_type, item_name",
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_inventory_entry).collect()
    }

    async fn get_party_status(&self) -> Result<Vec<Character>, StoreError> {
        let rows = sqlx::query("SELECT * FROM characters WHERE is_in_party = 1 ORDER BY class, name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_character).collect()
    }

    #[instrument(skip(self))]
    async fn set_party_membership(
        &self,
        id: CharacterId,
        in_party: bool,
        location: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE characters SET is_in_party = ?, current_location = ? WHERE id = ?")
            .bind(in_party)
            .bind(location)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::character_not_found(id));
        }
        Ok(())
    }

    async fn record_shop_transaction(&self, transaction: ShopTransaction) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO shop_transactions (
                buyer_id, item_name, quantity, unit_price, total_price,
                reputation_at_purchase, transaction_type, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.buyer_id.to_string())
        .bind(&transaction.item_name)
        .bind(transaction.quantity)
        .bind(transaction.unit_price)
        .bind(transaction.total_price)
        .bind(transaction.reputation_at_purchase)
        .bind(&transaction.transaction_type)
        .bind(transaction.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn add_story_event(&self, event: NewStoryEvent) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO story_events (
                owner_id, event_type, description, location, turn,
                reputation_delta, gold_delta, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.owner_id.to_string())
        .bind(&event.event_type)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.turn as i64)
        .bind(event.reputation_delta)
        .bind(event.gold_delta)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_recent_events(&self, owner_id: CharacterId, limit: u32) -> Result<Vec<StoryEvent>, StoreError> {
        let rows = sqlx::query("SELECT * FROM story_events WHERE owner_id = ? ORDER BY seq DESC LIMIT ?")
            .bind(owner_id.to_string())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let created_at: String = row.try_get("created_at").map_err(db_err)?;
                let turn: i64 = row.try_get("turn").map_err(db_err)?;
                Ok(StoryEvent {
                    seq: row.try_get("seq").map_err(db_err)?,
                    owner_id,
                    event_type: row.try_get("event_type").map_err(db_err)?,
                    description: row.try_get("description").map_err(db_err)?,
                    location: row.try_get("location").map_err(db_err)?,
                    turn: turn.max(0) as u32,
                    reputation_delta: row.try_get("reputation_delta").map_err(db_err)?,
                    gold_delta: row.try_get("gold_delta").map_err(db_err)?,
                    timestamp: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }

    async fn count_events(&self, owner_id: CharacterId, event_type: &str) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM story_events WHERE owner_id = ? AND event_type = ?",
        )
        .bind(owner_id.to_string())
        .bind(event_type)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(count.max(0) as u32)
    }

    async fn get_reputation_history(
        &self,
        owner_id: CharacterId,
        limit: u32,
    ) -> Result<Vec<ReputationChange>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM reputation_changes WHERE owner_id = ? ORDER BY seq DESC LIMIT ?",
        )
        .bind(owner_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let created_at: String = row.try_get("created_at").map_err(db_err)?;
                Ok(ReputationChange {
                    seq: row.try_get("seq").map_err(db_err)?,
                    owner_id,
                    old_value: row.try_get("old_value").map_err(db_err)?,
                    new_value: row.try_get("new_value").map_err(db_err)?,
                    delta: row.try_get("delta").map_err(db_err)?,
                    reason: row.try_get("reason").map_err(db_err)?,
                    location: row.try_get("location").map_err(db_err)?,
                    timestamp: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteWorldStore {
        SqliteWorldStore::in_memory().await.unwrap()
    }

    fn hero() -> NewCharacter {
        NewCharacter::new("Aria", CharacterKind::Player, "elf", "mage")
            .with_vitals(100, 50)
            .at("Harbor Town")
            .in_party()
            .with_wealth(0, 300)
    }

    #[tokio::test]
    async fn test_create_and_get_character() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();

        let character = store.get_character(id).await.unwrap();
        assert_eq!(character.name, "Aria");
        assert_eq!(character.kind, CharacterKind::Player);
        assert_eq!(character.gold, 300);
        assert!(character.is_alive());
        assert!(character.is_in_party);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_character() {
        let store = store().await;
        let mut broken = hero();
        broken.hp = 150;
        let err = store.create_character(broken).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = store().await;
        let missing = CharacterId::new();
        assert!(matches!(store.get_character(missing).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(store.apply_damage(missing, 5).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(store.update_gold(missing, 5).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_apply_damage_clamps_at_zero() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();

        assert_eq!(store.apply_damage(id, 30).await.unwrap(), (70, true));
        assert_eq!(store.apply_damage(id, 500).await.unwrap(), (0, false));
        assert!(!store.get_character(id).await.unwrap().is_alive());
    }

    #[tokio::test]
    async fn test_heal_clamps_both_stats() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();
        store.apply_damage(id, 40).await.unwrap();

        assert_eq!(store.heal(id, 1000, 0).await.unwrap(), (100, 50));
        assert_eq!(store.heal(id, 0, -20).await.unwrap(), (100, 30));
        assert_eq!(store.heal(id, 0, -999).await.unwrap(), (100, 0));
        assert_eq!(store.heal(id, -250, 0).await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_update_reputation_clamps_and_logs() {
        let store = store().await;
        let id = store.create_character(hero().with_wealth(95, 0)).await.unwrap();

        assert_eq!(store.update_reputation(id, 50, "saved the city", "Harbor Town").await.unwrap(), 100);
        assert_eq!(store.update_reputation(id, -500, "betrayal", "Harbor Town").await.unwrap(), -100);

        let history = store.get_reputation_history(id, 5).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, "betrayal");
        assert_eq!(history[0].old_value, 100);
        assert_eq!(history[0].new_value, -100);
        assert_eq!(history[1].old_value, 95);
        assert_eq!(history[1].new_value, 100);
        assert_eq!(history[1].delta, 50);
    }

    #[tokio::test]
    async fn test_update_gold_floors_at_zero() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();

        assert_eq!(store.update_gold(id, -100).await.unwrap(), 200);
        assert_eq!(store.update_gold(id, -1000).await.unwrap(), 0);
        assert_eq!(store.update_gold(id, 25).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_add_item_stacks_by_name_and_type() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();

        let first = store
            .add_item(id, NewItem::new("healing potion", "hp_potion", 2, "Restores 50 HP", 50))
            .await
            .unwrap();
        let second = store
            .add_item(id, NewItem::new("healing potion", "hp_potion", 3, "Restores 50 HP", 50))
            .await
            .unwrap();
        store
            .add_item(id, NewItem::new("healing potion", "misc", 1, "A decoy", 1))
            .await
            .unwrap();

        assert_eq!(first, second);
        let inventory = store.get_inventory(id).await.unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].item_type, "hp_potion");
        assert_eq!(inventory[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_add_item_for_unknown_owner_is_not_found() {
        let store = store().await;
        let result = store
            .add_item(CharacterId::new(), NewItem::new("bread", "food", 1, "", 10))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_use_item_never_goes_negative() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();
        let entry = store
            .add_item(id, NewItem::new("bread", "food", 2, "", 10))
            .await
            .unwrap();

        assert!(!store.use_item(id, entry, 3).await.unwrap());
        assert_eq!(store.get_inventory(id).await.unwrap()[0].quantity, 2);

        assert!(store.use_item(id, entry, 1).await.unwrap());
        assert_eq!(store.get_inventory(id).await.unwrap()[0].quantity, 1);

        assert!(store.use_item(id, entry, 1).await.unwrap());
        assert!(store.get_inventory(id).await.unwrap().is_empty());

        assert!(matches!(store.use_item(id, entry, 1).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_party_status_orders_by_class_then_name() {
        let store = store().await;
        store.create_character(hero()).await.unwrap();
        let brom = NewCharacter::new("Brom", CharacterKind::Companion, "dwarf", "warrior").in_party();
        let cora = NewCharacter::new("Cora", CharacterKind::Companion, "human", "cleric").in_party();
        let ghost = NewCharacter::new("Ghost", CharacterKind::Companion, "human", "archer");
        store.create_character(brom).await.unwrap();
        let cora_id = store.create_character(cora).await.unwrap();
        store.create_character(ghost).await.unwrap();

        let names: Vec<String> = store
            .get_party_status()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Cora", "Aria", "Brom"]);

        store.set_party_membership(cora_id, false, "Harbor Town outskirts").await.unwrap();
        let cora = store.get_character(cora_id).await.unwrap();
        assert!(!cora.is_in_party);
        assert_eq!(cora.current_location, "Harbor Town outskirts");
        assert_eq!(store.get_party_status().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_story_events_newest_first_and_counted() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();

        for turn in 1..=3 {
            store
                .add_story_event(NewStoryEvent::new(id, "permanent_event", format!("event {}", turn), "Harbor Town", turn))
                .await
                .unwrap();
        }
        store
            .add_story_event(NewStoryEvent::new(id, "battle_victory", "won", "Harbor Town", 4).with_deltas(1, 20))
            .await
            .unwrap();

        let recent = store.get_recent_events(id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event_type, "battle_victory");
        assert_eq!(recent[0].gold_delta, 20);
        assert_eq!(recent[1].description, "event 3");
        assert_eq!(store.count_events(id, "permanent_event").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_record_shop_transaction() {
        let store = store().await;
        let id = store.create_character(hero()).await.unwrap();
        store
            .record_shop_transaction(ShopTransaction {
                buyer_id: id,
                item_name: "mana potion".into(),
                quantity: 2,
                unit_price: 50,
                total_price: 100,
                reputation_at_purchase: 0,
                transaction_type: "buy".into(),
                timestamp: Utc::now(),
            })
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop_transactions")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
