use async_trait::async_trait;
use mercado_core::payment::{ChargeOutcome, ChargeRequest, ProviderAdapter};
use mercado_core::{CoreError, CoreResult};
use uuid::Uuid;

/// Mercado Pago checkout preferences: a charge creates a preference and the
/// buyer pays at the returned init point.
pub struct MercadoPagoAdapter {
    access_token: String,
}

impl MercadoPagoAdapter {
    pub fn new(access_token: String) -> Self {
        Self { access_token }
    }

    fn is_settled_status(status: &str) -> bool {
        matches!(status, "approved" | "accredited")
    }

    async fn fetch_payment_status(&self, transaction_id: &str) -> CoreResult<String> {
        // Stand-in for `GET /v1/payments/{id}` under the access token.
        if transaction_id.is_empty() {
            return Err(CoreError::Gateway("mercadopago payment id empty".into()));
        }
        Ok("approved".to_string())
    }
}

#[async_trait]
impl ProviderAdapter for MercadoPagoAdapter {
    async fn charge(&self, request: &ChargeRequest) -> CoreResult<ChargeOutcome> {
        if self.access_token.is_empty() {
            return Err(CoreError::Gateway("mercadopago access token missing".into()));
        }

        // Stand-in for `POST /checkout/preferences` with the payer's email and
        // the order total as a single item.
        let preference_id = format!("mp-{}", Uuid::new_v4());
        let init_point = format!(
            "https://www.mercadopago.com/checkout/v1/redirect?pref_id={}",
            preference_id
        );

        tracing::debug!(
            order_id = %request.order_id,
            amount = %request.amount,
            currency = %request.currency,
            payer = %request.customer.email,
            "created mercadopago preference"
        );

        Ok(ChargeOutcome {
            transaction_id: preference_id,
            payment_url: Some(init_point),
            client_secret: None,
        })
    }

    async fn is_settled(&self, transaction_id: &str) -> CoreResult<bool> {
        let status = self.fetch_payment_status(transaction_id).await?;
        Ok(Self::is_settled_status(&status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_and_accredited_count_as_settled() {
        assert!(MercadoPagoAdapter::is_settled_status("approved"));
        assert!(MercadoPagoAdapter::is_settled_status("accredited"));
        for status in ["pending", "in_process", "rejected", "cancelled", "refunded"] {
            assert!(!MercadoPagoAdapter::is_settled_status(status));
        }
    }
}
