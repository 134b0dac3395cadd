use crate::error::CoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// Uniform payment request, independent of which provider handles it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub amount: Decimal,
    pub currency: String,
    pub order_id: Uuid,
    pub user_id: String,
    pub provider: String,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// What a provider adapter hands back on a successful charge.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub transaction_id: String,
    pub payment_url: Option<String>,
    pub client_secret: Option<String>,
}

/// Normalized response returned to callers of the payment router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub payment_url: Option<String>,
    pub client_secret: Option<String>,
    pub error: Option<String>,
}

impl PaymentResponse {
    pub fn settled(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
            payment_url: None,
            client_secret: None,
            error: None,
        }
    }

    pub fn unsettled(transaction_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: Some(transaction_id.into()),
            payment_url: None,
            client_secret: None,
            error: Some(reason.into()),
        }
    }
}

/// Persisted record of one payment attempt. Created `PENDING` when a charge
/// succeeds at the provider, flipped to `COMPLETED` on confirmation.
/// Never deleted, and `COMPLETED` never reopens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub state: PaymentState,
    pub provider: String,
    pub provider_transaction_id: String,
    pub provider_metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn pending(request: &ChargeRequest, outcome: &ChargeOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: request.order_id,
            user_id: request.user_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            state: PaymentState::Pending,
            provider: request.provider.clone(),
            provider_transaction_id: outcome.transaction_id.clone(),
            provider_metadata: request.metadata.clone().unwrap_or(serde_json::Value::Null),
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}

/// One implementation per payment provider. Adapters translate the uniform
/// request into provider calls and normalize the result; they never touch
/// order state or the payment store.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> CoreResult<ChargeOutcome>;

    /// Whether the provider-side transaction reached a settled/success
    /// terminal state.
    async fn is_settled(&self, transaction_id: &str) -> CoreResult<bool>;
}
