use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercado_core::payment::PaymentRecord;
use mercado_core::CoreResult;
use uuid::Uuid;

/// Persistence contract for payment transaction records. Records are
/// append-only: created `PENDING`, flipped to `COMPLETED` once, never deleted.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, record: &PaymentRecord) -> CoreResult<()>;

    async fn find_by_provider_transaction(
        &self,
        provider: &str,
        provider_transaction_id: &str,
    ) -> CoreResult<Option<PaymentRecord>>;

    async fn mark_completed(&self, id: Uuid, processed_at: DateTime<Utc>) -> CoreResult<()>;
}
