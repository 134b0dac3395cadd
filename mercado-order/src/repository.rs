use crate::changes::OrderPatch;
use crate::models::{Order, OrderStatus};
use async_trait::async_trait;
use mercado_core::CoreResult;
use uuid::Uuid;

/// Persistence contract for the order aggregate. Loads always include items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> CoreResult<Option<Order>>;

    /// Write only the fields present in the patch; absent fields keep their
    /// stored value. Always bumps `updated_at`.
    async fn apply_patch(&self, id: Uuid, patch: &OrderPatch) -> CoreResult<()>;

    /// Narrow write used by payment confirmation.
    async fn set_status(&self, id: Uuid, status: OrderStatus) -> CoreResult<()>;

    /// Remove the order and its dependents. Deletion order is payouts, then
    /// items, then the order row, inside one transaction.
    async fn delete_cascade(&self, id: Uuid) -> CoreResult<()>;
}
