use mercado_payment::providers::{MercadoPagoAdapter, PaypalAdapter, StripeAdapter};
use mercado_payment::registry::{GatewayRegistry, ProviderConfig, ProviderFees};
use mercado_store::app_config::PaymentsConfig;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

fn set(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Wire the provider catalog against the configured credentials. Every known
/// provider is always registered; a missing credential section only flips
/// `is_enabled` off, so the catalog endpoint can still describe it.
pub fn build_registry(payments: &PaymentsConfig) -> GatewayRegistry {
    let mut registry = GatewayRegistry::new();

    let stripe_creds = payments.providers.stripe.as_ref();
    registry.register(
        ProviderConfig {
            key: "stripe".to_string(),
            display_name: "Stripe".to_string(),
            is_enabled: stripe_creds.is_some(),
            supported_currencies: set(&["USD", "EUR", "GBP", "MXN"]),
            supported_countries: set(&["US", "GB", "ES", "FR", "DE", "MX"]),
            fees: ProviderFees {
                percentage: 2.9,
                fixed: Decimal::new(30, 2),
            },
            features: set(&["cards", "3ds", "client_secret"]),
        },
        Arc::new(StripeAdapter::new(
            stripe_creds.map(|c| c.secret_key.clone()).unwrap_or_default(),
        )),
    );

    let paypal_creds = payments.providers.paypal.as_ref();
    registry.register(
        ProviderConfig {
            key: "paypal".to_string(),
            display_name: "PayPal".to_string(),
            is_enabled: paypal_creds.is_some(),
            supported_currencies: set(&["USD", "EUR", "GBP"]),
            supported_countries: set(&["US", "GB", "ES", "FR", "DE"]),
            fees: ProviderFees {
                percentage: 3.4,
                fixed: Decimal::new(35, 2),
            },
            features: set(&["redirect", "buyer_protection"]),
        },
        Arc::new(PaypalAdapter::new(
            paypal_creds.map(|c| c.client_id.clone()).unwrap_or_default(),
            paypal_creds.map(|c| c.client_secret.clone()).unwrap_or_default(),
            paypal_creds.map(|c| c.sandbox).unwrap_or(false),
        )),
    );

    let mercadopago_creds = payments.providers.mercadopago.as_ref();
    registry.register(
        ProviderConfig {
            key: "mercadopago".to_string(),
            display_name: "Mercado Pago".to_string(),
            is_enabled: mercadopago_creds.is_some(),
            supported_currencies: set(&["MXN", "ARS", "BRL", "USD"]),
            supported_countries: set(&["MX", "AR", "BR", "CL", "CO"]),
            fees: ProviderFees {
                percentage: 2.5,
                fixed: Decimal::ZERO,
            },
            features: set(&["redirect", "installments"]),
        },
        Arc::new(MercadoPagoAdapter::new(
            mercadopago_creds
                .map(|c| c.access_token.clone())
                .unwrap_or_default(),
        )),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercado_store::app_config::{ProvidersConfig, StripeCredentials};

    fn payments_config(providers: ProvidersConfig) -> PaymentsConfig {
        PaymentsConfig {
            provider_timeout_ms: 10_000,
            providers,
        }
    }

    #[test]
    fn all_providers_registered_even_without_credentials() {
        let registry = build_registry(&payments_config(ProvidersConfig::default()));
        assert!(registry.config("stripe").is_some());
        assert!(registry.config("paypal").is_some());
        assert!(registry.config("mercadopago").is_some());
        assert!(registry.list_available().is_empty());
    }

    #[test]
    fn credential_presence_enables_the_provider() {
        let providers = ProvidersConfig {
            stripe: Some(StripeCredentials {
                secret_key: "sk_test_123".to_string(),
            }),
            ..Default::default()
        };
        let registry = build_registry(&payments_config(providers));
        let available: Vec<_> = registry
            .list_available()
            .iter()
            .map(|c| c.key.clone())
            .collect();
        assert_eq!(available, vec!["stripe"]);
    }
}
