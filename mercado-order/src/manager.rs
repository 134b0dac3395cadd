use crate::changes::OrderPatch;
use crate::locks::OrderLockRegistry;
use crate::models::{Order, OrderStatus};
use crate::policy;
use crate::repository::OrderRepository;
use chrono::Utc;
use mercado_core::identity::Actor;
use mercado_core::repository::{NotificationEmitter, StockLedger};
use mercado_core::{CoreError, CoreResult};
use mercado_shared::models::events::{OrderEvent, OrderEventKind};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of the best-effort stock walk. Item-level failures are counted and
/// reported, never rolled back: an order stuck in a half-applied status is
/// worse than an under-restored counter a later sweep can reconcile.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RestoreReport {
    pub restored: usize,
    pub failed: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub order: Order,
    pub restore: Option<RestoreReport>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DeleteOutcome {
    pub stock_restored: usize,
    pub stock_restore_reason: String,
}

/// Owns the order aggregate: applies status transitions, consults the
/// reconciliation policy, drives the stock ledger, persists, and hands
/// notifications off to the external emitter.
pub struct OrderLifecycleManager {
    orders: Arc<dyn OrderRepository>,
    ledger: Arc<dyn StockLedger>,
    notifier: Arc<dyn NotificationEmitter>,
    locks: OrderLockRegistry,
}

impl OrderLifecycleManager {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        ledger: Arc<dyn StockLedger>,
        notifier: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            orders,
            ledger,
            notifier,
            locks: OrderLockRegistry::new(),
        }
    }

    /// Apply a partial update to an order.
    ///
    /// Holds the order's lock across read, policy decision, stock mutation and
    /// persistence, so concurrent updates on the same order cannot both see
    /// the pre-update state and double-restore.
    pub async fn apply_update(
        &self,
        order_id: Uuid,
        patch: &OrderPatch,
        actor: &Actor,
    ) -> CoreResult<UpdateOutcome> {
        if patch.is_empty() {
            return Err(CoreError::Validation("update carries no fields".into()));
        }

        let _guard = self.locks.acquire(order_id).await;

        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("order {}", order_id)))?;

        self.authorize_update(&order, patch, actor)?;

        if actor.is_admin() {
            let violations = patch.off_table_transitions(&order);
            if !violations.is_empty() {
                // Administrative override is permitted; record it and move on.
                tracing::warn!(
                    order_id = %order_id,
                    actor = %actor.id,
                    ?violations,
                    "applying off-table transition as admin override"
                );
            }
        }

        let (new_status, new_payment, new_shipping) = patch.resolve(&order);
        let restores = policy::should_restore_on_status_update(
            order.status,
            new_status,
            order.payment_status,
            new_payment,
            order.shipping_status,
            new_shipping,
        );
        let reserves = patch
            .status
            .map(|new| policy::should_reserve_on_status_update(order.status, new))
            .unwrap_or(false);

        let restore = if restores {
            let reason = format!(
                "transition ({}, {}, {}) -> ({}, {}, {}) returns items to stock",
                order.status.as_str(),
                order.payment_status.as_str(),
                order.shipping_status.as_str(),
                new_status.as_str(),
                new_payment.as_str(),
                new_shipping.as_str(),
            );
            Some(self.restore_stock(&order, reason).await)
        } else if reserves {
            let reason = format!(
                "reinstating order from {} to {} takes items out of stock again",
                order.status.as_str(),
                new_status.as_str(),
            );
            Some(self.reserve_stock(&order, reason).await)
        } else {
            None
        };

        self.orders.apply_patch(order_id, patch).await?;

        let updated = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::Persistence(format!("order {} vanished mid-update", order_id)))?;

        self.emit_change_events(&order, &updated, patch).await;

        Ok(UpdateOutcome {
            order: updated,
            restore,
        })
    }

    /// Delete an order, restoring stock when the delete policy says the items
    /// never left inventory. Administrative role required.
    pub async fn delete_order(&self, order_id: Uuid, actor: &Actor) -> CoreResult<DeleteOutcome> {
        if !actor.is_admin() {
            return Err(CoreError::Authorization(
                "only administrators may delete orders".into(),
            ));
        }

        let _guard = self.locks.acquire(order_id).await;

        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("order {}", order_id)))?;

        let restores = policy::should_restore_on_delete(
            order.status,
            order.payment_status,
            order.shipping_status,
        );

        let (restored, reason) = if restores {
            let reason = format!(
                "order deleted at ({}, {}, {}); items had not left inventory",
                order.status.as_str(),
                order.payment_status.as_str(),
                order.shipping_status.as_str(),
            );
            let report = self.restore_stock(&order, reason).await;
            (report.restored, report.reason)
        } else {
            (
                0,
                format!(
                    "no restore: order at ({}, {}, {}) is fulfilled or paid and in motion",
                    order.status.as_str(),
                    order.payment_status.as_str(),
                    order.shipping_status.as_str(),
                ),
            )
        };

        self.orders.delete_cascade(order_id).await?;

        let event = OrderEvent {
            user_id: order.user_id.clone(),
            order_id,
            kind: OrderEventKind::OrderDeleted,
            payload: serde_json::json!({ "stock_restored": restored }),
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self.notifier.emit(event).await {
            tracing::warn!(order_id = %order_id, error = %e, "delete notification failed");
        }

        Ok(DeleteOutcome {
            stock_restored: restored,
            stock_restore_reason: reason,
        })
    }

    fn authorize_update(&self, order: &Order, patch: &OrderPatch, actor: &Actor) -> CoreResult<()> {
        if actor.is_admin() {
            return Ok(());
        }
        if !actor.is_same_user(&order.user_id) {
            return Err(CoreError::Authorization("not your order".into()));
        }
        // Owners get exactly one transition: cancel their own order while it
        // is still pending. Anything else on any dimension is refused.
        let cancel_only = patch.status == Some(OrderStatus::Cancelled)
            && patch.payment_status.is_none()
            && patch.shipping_status.is_none()
            && patch.notes.is_none();
        if !cancel_only {
            return Err(CoreError::Authorization(
                "customers may only cancel their order".into(),
            ));
        }
        if !matches!(
            order.status,
            OrderStatus::Pending | OrderStatus::PendingNoPayment
        ) {
            return Err(CoreError::Authorization(format!(
                "order in {} can no longer be cancelled by its owner",
                order.status.as_str()
            )));
        }
        Ok(())
    }

    /// Walk every item and increment its product's stock. One round trip per
    /// item; a failed item is logged and counted, the rest keep going.
    async fn restore_stock(&self, order: &Order, reason: String) -> RestoreReport {
        let mut restored = 0;
        let mut failed = 0;
        for item in &order.items {
            match self.ledger.increment(item.product_id, item.quantity).await {
                Ok(()) => restored += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        error = %e,
                        "stock restore failed for item"
                    );
                }
            }
        }
        RestoreReport {
            restored,
            failed,
            reason,
        }
    }

    /// The symmetric decrement when an order is reinstated out of a
    /// restock-triggering state. Same best-effort contract as restore.
    async fn reserve_stock(&self, order: &Order, reason: String) -> RestoreReport {
        let mut reserved = 0;
        let mut failed = 0;
        for item in &order.items {
            match self.ledger.decrement(item.product_id, item.quantity).await {
                Ok(()) => reserved += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        error = %e,
                        "stock re-reservation failed for item"
                    );
                }
            }
        }
        RestoreReport {
            restored: reserved,
            failed,
            reason,
        }
    }

    async fn emit_change_events(&self, before: &Order, after: &Order, patch: &OrderPatch) {
        for kind in patch.changed_kinds() {
            let payload = match kind {
                OrderEventKind::StatusChanged => serde_json::json!({
                    "from": before.status, "to": after.status,
                }),
                OrderEventKind::PaymentStatusChanged => serde_json::json!({
                    "from": before.payment_status, "to": after.payment_status,
                }),
                OrderEventKind::ShippingStatusChanged => serde_json::json!({
                    "from": before.shipping_status, "to": after.shipping_status,
                }),
                _ => serde_json::Value::Null,
            };
            let event = OrderEvent {
                user_id: after.user_id.clone(),
                order_id: after.id,
                kind,
                payload,
                timestamp: Utc::now().timestamp(),
            };
            if let Err(e) = self.notifier.emit(event).await {
                tracing::warn!(order_id = %after.id, ?kind, error = %e, "notification emit failed");
            }
        }
    }
}
