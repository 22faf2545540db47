//! SQLite persistence adapter
//!
//! One store implements `WorldStorePort` for characters, inventory,
//! reputation history, shop transactions and story events.

mod sqlite_world_store;

pub use sqlite_world_store::SqliteWorldStore;
