use crate::models::{Order, OrderStatus, PaymentStatus, ShippingStatus};
use mercado_shared::models::events::OrderEventKind;
use serde::{Deserialize, Serialize};

/// Explicit partial update for an order. Every field is an explicit
/// "provided or not" marker: `None` means leave the stored value alone,
/// never "null the field out".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_status: Option<ShippingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.payment_status.is_none()
            && self.shipping_status.is_none()
            && self.notes.is_none()
    }

    /// Resolve each dimension against the stored order: the proposed value if
    /// present, the current one otherwise. This is the tuple the
    /// reconciliation policy is evaluated on.
    pub fn resolve(&self, order: &Order) -> (OrderStatus, PaymentStatus, ShippingStatus) {
        (
            self.status.unwrap_or(order.status),
            self.payment_status.unwrap_or(order.payment_status),
            self.shipping_status.unwrap_or(order.shipping_status),
        )
    }

    /// Notification categories for the dimensions this patch actually carries.
    pub fn changed_kinds(&self) -> Vec<OrderEventKind> {
        let mut kinds = Vec::new();
        if self.status.is_some() {
            kinds.push(OrderEventKind::StatusChanged);
        }
        if self.payment_status.is_some() {
            kinds.push(OrderEventKind::PaymentStatusChanged);
        }
        if self.shipping_status.is_some() {
            kinds.push(OrderEventKind::ShippingStatusChanged);
        }
        kinds
    }

    /// Check each provided dimension against its transition table. Returns the
    /// offending transitions as strings; the caller decides whether they are
    /// hard failures or logged admin overrides.
    pub fn off_table_transitions(&self, order: &Order) -> Vec<String> {
        let mut violations = Vec::new();
        if let Some(new_status) = self.status {
            if new_status != order.status && !order.status.can_transition(new_status) {
                violations.push(format!(
                    "status {} -> {}",
                    order.status.as_str(),
                    new_status.as_str()
                ));
            }
        }
        if let Some(new_payment) = self.payment_status {
            if new_payment != order.payment_status
                && !order.payment_status.can_transition(new_payment)
            {
                violations.push(format!(
                    "payment_status {} -> {}",
                    order.payment_status.as_str(),
                    new_payment.as_str()
                ));
            }
        }
        if let Some(new_shipping) = self.shipping_status {
            if new_shipping != order.shipping_status
                && !order.shipping_status.can_transition(new_shipping)
            {
                violations.push(format!(
                    "shipping_status {} -> {}",
                    order.shipping_status.as_str(),
                    new_shipping.as_str()
                ));
            }
        }
        violations
    }
}
