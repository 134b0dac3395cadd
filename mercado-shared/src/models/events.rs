use uuid::Uuid;

/// Which dimension of an order changed. One notification is emitted per
/// populated dimension of an update, plus deletion and payment confirmation.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventKind {
    StatusChanged,
    PaymentStatusChanged,
    ShippingStatusChanged,
    OrderDeleted,
    PaymentConfirmed,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderEvent {
    pub user_id: String,
    pub order_id: Uuid,
    pub kind: OrderEventKind,
    pub payload: serde_json::Value,
    pub timestamp: i64,
}

