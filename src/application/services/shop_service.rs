//! Shop Service - Reputation-priced purchases from the static catalog
//!
//! A purchase checks, in order: the item exists, the shop carries that many,
//! the player's standing still gets them served, and the player can pay the
//! reputation-adjusted price. Only then are gold, inventory and the
//! transaction log touched.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::application::dto::PurchaseReceipt;
use crate::application::ports::outbound::WorldStorePort;
use crate::application::services::GameError;
use crate::domain::entities::{find_catalog_entry, NewItem, ShopTransaction, SHOP_CATALOG};
use crate::domain::value_objects::{
    apply_to_price, can_access_service, CharacterId, ReputationTier, ServiceKind,
};

/// First number in the request, or 1 when none is given.
/// Out-of-range values are passed through for `purchase` to reject.
pub fn parse_quantity(request: &str) -> i32 {
    request
        .split(|c: char| !c.is_ascii_digit())
        .find(|token| !token.is_empty())
        // digits only, so a parse failure means overflow
        .map(|token| token.parse::<i32>().unwrap_or(i32::MAX))
        .unwrap_or(1)
}

#[async_trait]
pub trait ShopService: Send + Sync {
    async fn purchase(
        &self,
        buyer_id: CharacterId,
        item_name: &str,
        quantity: i32,
    ) -> Result<PurchaseReceipt, GameError>;

    /// The catalog at the prices this reputation pays
    fn display(&self, reputation: i32) -> String;
}

pub struct ShopServiceImpl {
    store: Arc<dyn WorldStorePort>,
}

impl ShopServiceImpl {
    pub fn new(store: Arc<dyn WorldStorePort>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ShopService for ShopServiceImpl {
    #[instrument(skip(self), fields(buyer_id = %buyer_id))]
    async fn purchase(
        &self,
        buyer_id: CharacterId,
        item_name: &str,
        quantity: i32,
    ) -> Result<PurchaseReceipt, GameError> {
        let entry = find_catalog_entry(item_name)
            .ok_or_else(|| GameError::NotFound(format!("'{}' in the shop", item_name)))?;
        if quantity <= 0 {
            return Err(GameError::Validation(format!(
                "Cannot buy {} {}.",
                quantity, entry.name
            )));
        }
        if quantity as u32 > entry.stock {
            return Err(GameError::InsufficientStock {
                item: entry.name.to_string(),
                requested: quantity,
                available: entry.stock as i32,
            });
        }

        let buyer = self.store.get_character(buyer_id).await?;
        let unit_price = apply_to_price(entry.base_price, buyer.reputation) as i64;
        let total_price = unit_price * quantity as i64;

        let tier = ReputationTier::from_score(buyer.reputation);
        if !can_access_service(buyer.reputation, ServiceKind::BasicShop) {
            return Err(GameError::AccessDenied {
                service: ServiceKind::BasicShop.label(),
                tier,
            });
        }
        if buyer.gold < total_price {
            return Err(GameError::InsufficientFunds {
                needed: total_price,
                available: buyer.gold,
            });
        }

        let gold_after = self.store.update_gold(buyer_id, -total_price).await?;
        self.store
            .add_item(
                buyer_id,
                NewItem::new(entry.name, entry.item_type, quantity, entry.description, entry.base_price as i64),
            )
            .await?;
        self.store
            .record_shop_transaction(ShopTransaction {
                buyer_id,
                item_name: entry.name.to_string(),
                quantity,
                unit_price,
                total_price,
                reputation_at_purchase: buyer.reputation,
                transaction_type: "buy".to_string(),
                timestamp: Utc::now(),
            })
            .await?;

        info!(item = entry.name, quantity, total_price, gold_after, "Purchase completed");

        Ok(PurchaseReceipt {
            item_name: entry.name.to_string(),
            quantity,
            unit_price,
            total_price,
            gold_after,
            tier,
        })
    }

    fn display(&self, reputation: i32) -> String {
        let tier = ReputationTier::from_score(reputation);
        let mut lines = vec![
            format!("Merchant: \"{}\"", tier.greeting()),
            format!(
                "Prices at {} standing ({:.0}% of list):",
                tier.label(),
                tier.price_modifier() * 100.0
            ),
        ];
        for entry in SHOP_CATALOG.iter() {
            lines.push(format!(
                "  - {}: {} gold (list {}, stock {}) - {}",
                entry.name,
                apply_to_price(entry.base_price, reputation),
                entry.base_price,
                entry.stock,
                entry.description
            ));
        }
        lines.join("\n")
    }
}
