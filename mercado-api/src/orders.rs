use axum::{
    extract::{Path, State},
    Extension, Json,
};
use mercado_core::identity::Actor;
use mercado_core::CoreError;
use mercado_order::changes::OrderPatch;
use mercado_order::manager::RestoreReport;
use mercado_order::models::{Order, OrderItem};
use mercado_shared::pii::Masked;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: String,
    pub status: String,
    pub payment_status: String,
    pub shipping_status: String,
    pub items: Vec<OrderItemResponse>,
    pub total: Decimal,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct UpdateOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_restore: Option<RestoreReport>,
}

#[derive(Debug, Serialize)]
pub struct DeleteOrderResponse {
    pub message: String,
    pub stock_restored: usize,
    pub stock_restore_reason: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/orders/{id}
/// Retrieve an order. Customers see only their own orders; admins see any.
pub async fn get_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .get(order_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("order {}", order_id)))?;

    if !actor.is_admin() && !actor.is_same_user(&order.user_id) {
        return Err(CoreError::Authorization("not your order".into()).into());
    }

    let response = hydrate(&state, order).await;
    Ok(Json(response))
}

/// PUT /v1/orders/{id}
/// Apply a partial update; runs the stock reconciliation policy and reports
/// any restore alongside the updated order.
pub async fn update_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<Uuid>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<UpdateOrderResponse>, AppError> {
    let outcome = state
        .lifecycle
        .apply_update(order_id, &patch, &actor)
        .await?;

    let order = hydrate(&state, outcome.order).await;
    Ok(Json(UpdateOrderResponse {
        order,
        stock_restore: outcome.restore,
    }))
}

/// DELETE /v1/orders/{id}
/// Admin-only hard delete with best-effort stock restore.
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<DeleteOrderResponse>, AppError> {
    let outcome = state.lifecycle.delete_order(order_id, &actor).await?;

    Ok(Json(DeleteOrderResponse {
        message: format!("order {} deleted", order_id),
        stock_restored: outcome.stock_restored,
        stock_restore_reason: outcome.stock_restore_reason,
    }))
}

/// Attach product names to order items. A missing product leaves the name
/// out rather than failing the read; items hold a weak product reference.
async fn hydrate(state: &AppState, order: Order) -> OrderResponse {
    let mut items = Vec::with_capacity(order.items.len());
    for item in &order.items {
        items.push(hydrate_item(state, item).await);
    }
    OrderResponse {
        id: order.id,
        user_id: order.user_id,
        status: order.status.as_str().to_string(),
        payment_status: order.payment_status.as_str().to_string(),
        shipping_status: order.shipping_status.as_str().to_string(),
        items,
        total: order.total,
        customer_name: order.customer.name,
        customer_email: order.customer.email,
        notes: order.notes,
        created_at: order.created_at,
        updated_at: order.updated_at,
    }
}

async fn hydrate_item(state: &AppState, item: &OrderItem) -> OrderItemResponse {
    let product_name = match state.products.get(item.product_id).await {
        Ok(Some(product)) => Some(product.name),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(product_id = %item.product_id, error = %e, "product lookup failed");
            None
        }
    };
    OrderItemResponse {
        id: item.id,
        product_id: item.product_id,
        product_name,
        quantity: item.quantity,
        price: item.price,
    }
}
