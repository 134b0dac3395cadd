use async_trait::async_trait;
use mercado_core::repository::NotificationEmitter;
use mercado_core::{CoreError, CoreResult};
use mercado_shared::models::events::OrderEvent;
use sqlx::PgPool;
use uuid::Uuid;

/// Outbox-style notification emitter: events are rows in the notifications
/// table, drained by whatever delivery worker the deployment runs. The
/// lifecycle manager treats emit failures as non-fatal either way.
pub struct OutboxNotifier {
    pool: PgPool,
}

impl OutboxNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationEmitter for OutboxNotifier {
    async fn emit(&self, event: OrderEvent) -> CoreResult<()> {
        let kind = serde_json::to_value(event.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "UNKNOWN".to_string());

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, order_id, kind, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&event.user_id)
        .bind(event.order_id)
        .bind(kind)
        .bind(&event.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Persistence(e.to_string()))?;

        Ok(())
    }
}
