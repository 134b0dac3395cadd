use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercado_core::{CoreError, CoreResult};
use mercado_order::changes::OrderPatch;
use mercado_order::models::{CustomerSnapshot, Order, OrderItem, OrderStatus};
use mercado_order::repository::OrderRepository;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: String,
    status: String,
    payment_status: String,
    shipping_status: String,
    total: Decimal,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    customer_address: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
}

/// Status columns are stored as their SCREAMING_SNAKE_CASE wire form.
fn parse_status<T: serde::de::DeserializeOwned>(raw: &str) -> CoreResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| CoreError::Persistence(format!("unreadable status '{}': {}", raw, e)))
}

fn persistence(e: sqlx::Error) -> CoreError {
    CoreError::Persistence(e.to_string())
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> CoreResult<Order> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status: parse_status(&self.status)?,
            payment_status: parse_status(&self.payment_status)?,
            shipping_status: parse_status(&self.shipping_status)?,
            items,
            total: self.total,
            customer: CustomerSnapshot {
                name: self.customer_name,
                email: self.customer_email.into(),
                phone: self.customer_phone.map(Into::into),
                address: self.customer_address,
            },
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn get(&self, id: Uuid) -> CoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, payment_status, shipping_status, total,
                   customer_name, customer_email, customer_phone, customer_address,
                   notes, created_at, updated_at
            FROM orders WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, product_id, quantity, price
            FROM order_items WHERE order_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        let items = item_rows
            .into_iter()
            .map(|r| OrderItem {
                id: r.id,
                order_id: r.order_id,
                product_id: r.product_id,
                quantity: r.quantity.max(0) as u32,
                price: r.price,
            })
            .collect();

        row.into_order(items).map(Some)
    }

    async fn apply_patch(&self, id: Uuid, patch: &OrderPatch) -> CoreResult<()> {
        // COALESCE keeps absent fields at their stored value, so one sparse
        // statement covers every patch shape.
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = COALESCE($2, status),
                payment_status = COALESCE($3, payment_status),
                shipping_status = COALESCE($4, shipping_status),
                notes = COALESCE($5, notes),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.payment_status.map(|s| s.as_str()))
        .bind(patch.shipping_status.map(|s| s.as_str()))
        .bind(patch.notes.as_deref())
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("order {}", id)));
        }
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("order {}", id)));
        }
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        // Dependents first, to respect the foreign keys: payouts, then items,
        // then the order row.
        sqlx::query("DELETE FROM payouts WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("order {}", id)));
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }
}

impl PgOrderRepository {
    /// Insert a new order with its lines. Line order is the vec order.
    pub async fn create(&self, order: &Order) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, payment_status, shipping_status, total,
                                customer_name, customer_email, customer_phone, customer_address,
                                notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id)
        .bind(&order.user_id)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.shipping_status.as_str())
        .bind(order.total)
        .bind(&order.customer.name)
        .bind(order.customer.email.expose())
        .bind(order.customer.phone.as_ref().map(|p| p.expose().clone()))
        .bind(&order.customer.address)
        .bind(order.notes.as_deref())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        for (line_no, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, price, line_no)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity as i32)
            .bind(item.price)
            .bind(line_no as i32)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }
}
