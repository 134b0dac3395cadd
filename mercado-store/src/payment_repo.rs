use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercado_core::payment::{PaymentRecord, PaymentState};
use mercado_core::{CoreError, CoreResult};
use mercado_payment::repository::PaymentRepository;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    user_id: String,
    amount: Decimal,
    currency: String,
    state: String,
    provider: String,
    provider_transaction_id: String,
    provider_metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

fn persistence(e: sqlx::Error) -> CoreError {
    CoreError::Persistence(e.to_string())
}

fn parse_state(raw: &str) -> CoreResult<PaymentState> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| CoreError::Persistence(format!("unreadable payment state '{}': {}", raw, e)))
}

fn state_str(state: &PaymentState) -> &'static str {
    match state {
        PaymentState::Pending => "PENDING",
        PaymentState::Completed => "COMPLETED",
        PaymentState::Failed => "FAILED",
    }
}

impl PaymentRow {
    fn into_record(self) -> CoreResult<PaymentRecord> {
        Ok(PaymentRecord {
            id: self.id,
            order_id: self.order_id,
            user_id: self.user_id,
            amount: self.amount,
            currency: self.currency,
            state: parse_state(&self.state)?,
            provider: self.provider,
            provider_transaction_id: self.provider_transaction_id,
            provider_metadata: self.provider_metadata,
            created_at: self.created_at,
            processed_at: self.processed_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, record: &PaymentRecord) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, user_id, amount, currency, state, provider,
                                  provider_transaction_id, provider_metadata, created_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.order_id)
        .bind(&record.user_id)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(state_str(&record.state))
        .bind(&record.provider)
        .bind(&record.provider_transaction_id)
        .bind(&record.provider_metadata)
        .bind(record.created_at)
        .bind(record.processed_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }

    async fn find_by_provider_transaction(
        &self,
        provider: &str,
        provider_transaction_id: &str,
    ) -> CoreResult<Option<PaymentRecord>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, order_id, user_id, amount, currency, state, provider,
                   provider_transaction_id, provider_metadata, created_at, processed_at
            FROM payments
            WHERE provider = $1 AND provider_transaction_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        row.map(PaymentRow::into_record).transpose()
    }

    async fn mark_completed(&self, id: Uuid, processed_at: DateTime<Utc>) -> CoreResult<()> {
        // The state guard keeps COMPLETED append-only even under races.
        let result = sqlx::query(
            r#"
            UPDATE payments SET state = 'COMPLETED', processed_at = $2
            WHERE id = $1 AND state <> 'COMPLETED'
            "#,
        )
        .bind(id)
        .bind(processed_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        if result.rows_affected() == 0 {
            // Already completed (fine) or missing (not). Distinguish.
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM payments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(persistence)?;
            if exists.is_none() {
                return Err(CoreError::not_found(format!("payment {}", id)));
            }
        }
        Ok(())
    }
}
