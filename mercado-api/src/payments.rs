use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use mercado_core::identity::Actor;
use mercado_core::payment::{ChargeRequest, CustomerInfo, PaymentResponse};
use mercado_payment::registry::ProviderConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub amount: Decimal,
    pub currency: String,
    pub order_id: Uuid,
    pub provider: String,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProvidersQuery {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub transaction_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/payments/process
/// Charge through the named provider. The paying user is taken from the
/// bearer token, never from the body.
pub async fn process_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let request = ChargeRequest {
        amount: req.amount,
        currency: req.currency,
        order_id: req.order_id,
        user_id: actor.id.clone(),
        provider: req.provider,
        customer: req.customer,
        metadata: req.metadata,
    };

    let response = state.payments.process_payment(&request).await?;
    Ok(Json(response))
}

/// GET /v1/payments/providers
/// List every enabled provider; with country and currency also names the
/// cheapest match as recommended.
pub async fn list_providers(
    State(state): State<AppState>,
    Query(query): Query<ProvidersQuery>,
) -> Result<Json<ProvidersResponse>, AppError> {
    let providers: Vec<ProviderConfig> =
        state.registry.list_available().into_iter().cloned().collect();

    let recommended = match (query.country.as_deref(), query.currency.as_deref()) {
        (Some(country), Some(currency)) => state
            .registry
            .recommend(country, currency)
            .map(|c| c.key.clone()),
        _ => None,
    };

    Ok(Json(ProvidersResponse {
        providers,
        recommended,
    }))
}

/// POST /v1/webhooks/payments/{provider}
/// Provider callback confirming a transaction. Unauthenticated; the
/// transaction id must match an initiated payment or this is a 404.
pub async fn payment_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<PaymentResponse>, AppError> {
    tracing::info!(
        provider = %provider,
        transaction_id = %payload.transaction_id,
        "payment webhook received"
    );

    let response = state
        .payments
        .confirm_payment(&provider, &payload.transaction_id)
        .await?;
    Ok(Json(response))
}
