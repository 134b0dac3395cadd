use async_trait::async_trait;
use mercado_core::payment::{ChargeOutcome, ChargeRequest, ProviderAdapter};
use mercado_core::{CoreError, CoreResult};
use uuid::Uuid;

/// PayPal is redirect-based: a charge creates an order and the buyer approves
/// it at the returned URL; settlement shows up as a captured order.
pub struct PaypalAdapter {
    client_id: String,
    client_secret: String,
    /// Sandbox and live use different approval hosts.
    base_url: String,
}

impl PaypalAdapter {
    pub fn new(client_id: String, client_secret: String, sandbox: bool) -> Self {
        let base_url = if sandbox {
            "https://www.sandbox.paypal.com".to_string()
        } else {
            "https://www.paypal.com".to_string()
        };
        Self {
            client_id,
            client_secret,
            base_url,
        }
    }

    fn is_settled_status(status: &str) -> bool {
        matches!(status, "COMPLETED" | "CAPTURED")
    }

    async fn fetch_order_status(&self, transaction_id: &str) -> CoreResult<String> {
        // Stand-in for `GET /v2/checkout/orders/{id}` under client credentials.
        if transaction_id.is_empty() {
            return Err(CoreError::Gateway("paypal order id empty".into()));
        }
        Ok("COMPLETED".to_string())
    }
}

#[async_trait]
impl ProviderAdapter for PaypalAdapter {
    async fn charge(&self, request: &ChargeRequest) -> CoreResult<ChargeOutcome> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(CoreError::Gateway("paypal credentials missing".into()));
        }

        // Stand-in for `POST /v2/checkout/orders` with one purchase unit for
        // the order total.
        let paypal_order_id = format!("PAYID-{}", Uuid::new_v4().simple().to_string().to_uppercase());
        let approval_url = format!("{}/checkoutnow?token={}", self.base_url, paypal_order_id);

        tracing::debug!(
            order_id = %request.order_id,
            amount = %request.amount,
            currency = %request.currency,
            "created paypal checkout order"
        );

        Ok(ChargeOutcome {
            transaction_id: paypal_order_id,
            payment_url: Some(approval_url),
            client_secret: None,
        })
    }

    async fn is_settled(&self, transaction_id: &str) -> CoreResult<bool> {
        let status = self.fetch_order_status(transaction_id).await?;
        Ok(Self::is_settled_status(&status))
    }
}
