use chrono::{DateTime, Utc};
use mercado_shared::pii::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse lifecycle stage of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    PendingNoPayment,
    Preparing,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
    Devolucion,
}

/// Whether money has been captured for the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Physical fulfillment progress, independent of the other two dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingStatus {
    Pending,
    Confirmed,
    Preparing,
    InTransit,
    Delivered,
    Returned,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::PendingNoPayment,
        OrderStatus::Preparing,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Devolucion,
    ];

    /// Transition table for administrative validation. Terminal states allow
    /// nothing here; admins may still override (logged, not rejected).
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[
                OrderStatus::Confirmed,
                OrderStatus::PendingNoPayment,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Confirmed => &[
                OrderStatus::Preparing,
                OrderStatus::Devolucion,
                OrderStatus::Cancelled,
            ],
            OrderStatus::PendingNoPayment => &[
                OrderStatus::Confirmed,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Preparing => &[OrderStatus::InTransit, OrderStatus::Devolucion],
            OrderStatus::InTransit => &[OrderStatus::Delivered, OrderStatus::Devolucion],
            OrderStatus::Delivered => &[OrderStatus::Completed, OrderStatus::Devolucion],
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Devolucion => &[],
        }
    }

    pub fn can_transition(self, to: OrderStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::PendingNoPayment => "PENDING_NO_PAYMENT",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Devolucion => "DEVOLUCION",
        }
    }
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn allowed_transitions(self) -> &'static [PaymentStatus] {
        match self {
            PaymentStatus::Pending => &[PaymentStatus::Paid, PaymentStatus::Failed],
            PaymentStatus::Paid => &[PaymentStatus::Refunded],
            PaymentStatus::Failed | PaymentStatus::Refunded => &[],
        }
    }

    pub fn can_transition(self, to: PaymentStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl ShippingStatus {
    pub const ALL: [ShippingStatus; 6] = [
        ShippingStatus::Pending,
        ShippingStatus::Confirmed,
        ShippingStatus::Preparing,
        ShippingStatus::InTransit,
        ShippingStatus::Delivered,
        ShippingStatus::Returned,
    ];

    /// Forward chain plus "any state may go to RETURNED".
    pub fn can_transition(self, to: ShippingStatus) -> bool {
        if to == ShippingStatus::Returned {
            return true;
        }
        matches!(
            (self, to),
            (ShippingStatus::Pending, ShippingStatus::Confirmed)
                | (ShippingStatus::Confirmed, ShippingStatus::Preparing)
                | (ShippingStatus::Preparing, ShippingStatus::InTransit)
                | (ShippingStatus::InTransit, ShippingStatus::Delivered)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShippingStatus::Pending => "PENDING",
            ShippingStatus::Confirmed => "CONFIRMED",
            ShippingStatus::Preparing => "PREPARING",
            ShippingStatus::InTransit => "IN_TRANSIT",
            ShippingStatus::Delivered => "DELIVERED",
            ShippingStatus::Returned => "RETURNED",
        }
    }
}

/// Contact data copied onto the order at creation time. Immutable afterwards;
/// later edits to the customer's account never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
    pub address: String,
}

/// An individual purchased line. `product_id` is a weak reference: the product
/// may be deleted independently, so stock restores tolerate a missing product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    /// Unit price snapshot at purchase time, never recomputed.
    pub price: Decimal,
}

impl OrderItem {
    pub fn new(order_id: Uuid, product_id: Uuid, quantity: u32, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            quantity,
            price,
        }
    }
}

/// The order aggregate. Owned by the lifecycle manager; all mutation goes
/// through status-transition operations or deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub items: Vec<OrderItem>,
    /// May include discounts/fees; fixed at creation, the core never
    /// recomputes it from the items.
    pub total: Decimal,
    pub customer: CustomerSnapshot,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: String, customer: CustomerSnapshot, total: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_status: ShippingStatus::Pending,
            items: Vec::new(),
            total,
            customer,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_item(&mut self, item: OrderItem) {
        self.items.push(item);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Devolucion).unwrap(),
            "\"DEVOLUCION\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::PendingNoPayment).unwrap(),
            "\"PENDING_NO_PAYMENT\""
        );
        assert_eq!(
            serde_json::to_string(&ShippingStatus::InTransit).unwrap(),
            "\"IN_TRANSIT\""
        );
    }

    #[test]
    fn shipping_any_state_can_return() {
        for from in ShippingStatus::ALL {
            assert!(from.can_transition(ShippingStatus::Returned));
        }
    }

    #[test]
    fn terminal_order_states_have_no_transitions() {
        assert!(OrderStatus::Completed.allowed_transitions().is_empty());
        assert!(OrderStatus::Cancelled.allowed_transitions().is_empty());
        assert!(OrderStatus::Devolucion.allowed_transitions().is_empty());
    }

    #[test]
    fn as_str_round_trips_through_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for status in PaymentStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for status in ShippingStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
