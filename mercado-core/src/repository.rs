use crate::error::CoreResult;
use async_trait::async_trait;
use mercado_shared::models::events::OrderEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Atomic stock counter over the product store. Implementations must apply
/// the delta in a single statement, never read-modify-write.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Add `quantity` back to the product's stock counter.
    /// Fails with `NotFound` if the product no longer exists.
    async fn increment(&self, product_id: Uuid, quantity: u32) -> CoreResult<()>;

    /// Remove `quantity` from the product's stock counter.
    /// Fails with `NotFound` if the product no longer exists, `Validation`
    /// if there is not enough stock left to take.
    async fn decrement(&self, product_id: Uuid, quantity: u32) -> CoreResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

/// Read-only view of the external product catalog. Order items hold a weak
/// reference to a product; the product may have been deleted independently.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn get(&self, product_id: Uuid) -> CoreResult<Option<ProductInfo>>;
}

/// Outbound notification hand-off. Delivery failures are the caller's problem
/// to swallow; emitting must never take down an order write.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn emit(&self, event: OrderEvent) -> CoreResult<()>;
}
