use async_trait::async_trait;
use mercado_core::repository::{ProductInfo, ProductLookup, StockLedger};
use mercado_core::{CoreError, CoreResult};
use sqlx::PgPool;
use uuid::Uuid;

/// Stock mutation over the products table. Every delta is one atomic UPDATE;
/// there is no read-modify-write anywhere in this path.
pub struct PgStockLedger {
    pool: PgPool,
}

impl PgStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn product_exists(&self, product_id: Uuid) -> CoreResult<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::Persistence(e.to_string()))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl StockLedger for PgStockLedger {
    async fn increment(&self, product_id: Uuid, quantity: u32) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1",
        )
        .bind(product_id)
        .bind(quantity as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("product {}", product_id)));
        }
        Ok(())
    }

    async fn decrement(&self, product_id: Uuid, quantity: u32) -> CoreResult<()> {
        // The stock guard makes under-flow impossible at the statement level.
        let result = sqlx::query(
            "UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1 AND stock >= $2",
        )
        .bind(product_id)
        .bind(quantity as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            if self.product_exists(product_id).await? {
                return Err(CoreError::Validation(format!(
                    "not enough stock on product {} to take {}",
                    product_id, quantity
                )));
            }
            return Err(CoreError::not_found(format!("product {}", product_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductLookup for PgStockLedger {
    async fn get(&self, product_id: Uuid) -> CoreResult<Option<ProductInfo>> {
        let row: Option<(Uuid, String, i32)> =
            sqlx::query_as("SELECT id, name, stock FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CoreError::Persistence(e.to_string()))?;

        Ok(row.map(|(id, name, stock)| ProductInfo { id, name, stock }))
    }
}
