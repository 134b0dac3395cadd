use async_trait::async_trait;
use mercado_core::payment::{ChargeOutcome, ChargeRequest, ProviderAdapter};
use mercado_core::{CoreError, CoreResult};
use uuid::Uuid;

/// Stripe uses payment intents: a charge creates an intent and hands the
/// client a secret to finish 3DS/confirmation on their side.
pub struct StripeAdapter {
    secret_key: String,
}

impl StripeAdapter {
    pub fn new(secret_key: String) -> Self {
        Self { secret_key }
    }

    /// Stripe intent statuses that count as settled money.
    fn is_settled_status(status: &str) -> bool {
        matches!(status, "succeeded")
    }

    async fn fetch_intent_status(&self, transaction_id: &str) -> CoreResult<String> {
        // Stand-in for `GET /v1/payment_intents/{id}` with the secret key.
        if !transaction_id.starts_with("pi_") {
            return Err(CoreError::Gateway(format!(
                "stripe rejected intent id '{}'",
                transaction_id
            )));
        }
        Ok("succeeded".to_string())
    }
}

#[async_trait]
impl ProviderAdapter for StripeAdapter {
    async fn charge(&self, request: &ChargeRequest) -> CoreResult<ChargeOutcome> {
        if self.secret_key.is_empty() {
            return Err(CoreError::Gateway("stripe secret key missing".into()));
        }

        // Stand-in for `POST /v1/payment_intents` carrying amount in minor
        // units, currency, and the order id as metadata.
        let intent_id = format!("pi_{}", Uuid::new_v4().simple());
        let client_secret = format!("{}_secret_{}", intent_id, Uuid::new_v4().simple());

        tracing::debug!(
            order_id = %request.order_id,
            amount = %request.amount,
            currency = %request.currency,
            "created stripe payment intent"
        );

        Ok(ChargeOutcome {
            transaction_id: intent_id,
            payment_url: None,
            client_secret: Some(client_secret),
        })
    }

    async fn is_settled(&self, transaction_id: &str) -> CoreResult<bool> {
        let status = self.fetch_intent_status(transaction_id).await?;
        Ok(Self::is_settled_status(&status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_succeeded_counts_as_settled() {
        assert!(StripeAdapter::is_settled_status("succeeded"));
        for status in [
            "requires_payment_method",
            "requires_action",
            "processing",
            "canceled",
        ] {
            assert!(!StripeAdapter::is_settled_status(status));
        }
    }

    #[tokio::test]
    async fn malformed_intent_id_is_a_gateway_error() {
        let adapter = StripeAdapter::new("sk_test_123".to_string());
        let err = adapter.is_settled("ch_legacy_id").await.unwrap_err();
        assert!(matches!(err, CoreError::Gateway(_)));
    }
}
