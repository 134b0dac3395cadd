use mercado_core::payment::ProviderAdapter;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderFees {
    /// Percentage of the amount, e.g. 2.9 for 2.9%.
    pub percentage: f64,
    /// Flat fee per transaction, in the charged currency.
    pub fixed: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfig {
    pub key: String,
    pub display_name: String,
    /// Derived from credential presence at registry construction time.
    pub is_enabled: bool,
    pub supported_currencies: HashSet<String>,
    pub supported_countries: HashSet<String>,
    pub fees: ProviderFees,
    pub features: HashSet<String>,
}

impl ProviderConfig {
    pub fn supports_currency(&self, currency: &str) -> bool {
        self.supported_currencies.contains(&currency.to_uppercase())
    }

    pub fn supports_country(&self, country: &str) -> bool {
        self.supported_countries.contains(&country.to_uppercase())
    }
}

struct ProviderEntry {
    config: ProviderConfig,
    adapter: Arc<dyn ProviderAdapter>,
}

/// Strategy-object registry: one mapping from provider key to config plus
/// adapter. Adding a provider is one `register` call; the router never grows
/// another dispatch site.
#[derive(Default)]
pub struct GatewayRegistry {
    entries: HashMap<String, ProviderEntry>,
    /// Registration order, for the documented first-available fallback.
    order: Vec<String>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, config: ProviderConfig, adapter: Arc<dyn ProviderAdapter>) {
        let key = config.key.clone();
        if self.entries.insert(key.clone(), ProviderEntry { config, adapter }).is_none() {
            self.order.push(key);
        }
    }

    pub fn config(&self, key: &str) -> Option<&ProviderConfig> {
        self.entries.get(key).map(|e| &e.config)
    }

    pub fn adapter(&self, key: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.entries.get(key).map(|e| e.adapter.clone())
    }

    /// Every provider whose credentials were present at startup.
    pub fn list_available(&self) -> Vec<&ProviderConfig> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|e| &e.config)
            .filter(|c| c.is_enabled)
            .collect()
    }

    /// Cheapest available provider supporting both country and currency.
    /// When none match both, falls back to the first available provider
    /// rather than erroring.
    pub fn recommend(&self, country: &str, currency: &str) -> Option<&ProviderConfig> {
        let available = self.list_available();
        available
            .iter()
            .filter(|c| c.supports_country(country) && c.supports_currency(currency))
            .min_by(|a, b| {
                a.fees
                    .percentage
                    .partial_cmp(&b.fees.percentage)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .copied()
            .or_else(|| available.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mercado_core::payment::{ChargeOutcome, ChargeRequest};
    use mercado_core::CoreResult;
    use rust_decimal_macros::dec;

    struct NoopAdapter;

    #[async_trait]
    impl ProviderAdapter for NoopAdapter {
        async fn charge(&self, _request: &ChargeRequest) -> CoreResult<ChargeOutcome> {
            unreachable!("registry tests never charge")
        }

        async fn is_settled(&self, _transaction_id: &str) -> CoreResult<bool> {
            unreachable!("registry tests never confirm")
        }
    }

    fn config(key: &str, enabled: bool, percentage: f64, currencies: &[&str], countries: &[&str]) -> ProviderConfig {
        ProviderConfig {
            key: key.to_string(),
            display_name: key.to_string(),
            is_enabled: enabled,
            supported_currencies: currencies.iter().map(|c| c.to_string()).collect(),
            supported_countries: countries.iter().map(|c| c.to_string()).collect(),
            fees: ProviderFees {
                percentage,
                fixed: dec!(0.30),
            },
            features: HashSet::new(),
        }
    }

    fn registry() -> GatewayRegistry {
        let mut registry = GatewayRegistry::new();
        registry.register(
            config("stripe", true, 2.9, &["USD", "EUR"], &["US", "ES"]),
            Arc::new(NoopAdapter),
        );
        registry.register(
            config("paypal", true, 3.4, &["USD", "EUR", "MXN"], &["US", "MX"]),
            Arc::new(NoopAdapter),
        );
        registry.register(
            config("mercadopago", false, 2.5, &["MXN", "ARS"], &["MX", "AR"]),
            Arc::new(NoopAdapter),
        );
        registry
    }

    #[test]
    fn list_available_excludes_disabled_providers() {
        let registry = registry();
        let keys: Vec<_> = registry.list_available().iter().map(|c| c.key.clone()).collect();
        assert_eq!(keys, vec!["stripe", "paypal"]);
    }

    #[test]
    fn recommend_picks_lowest_percentage_fee() {
        let registry = registry();
        // Both stripe and paypal support US/USD; stripe is cheaper.
        let picked = registry.recommend("US", "USD").unwrap();
        assert_eq!(picked.key, "stripe");
    }

    #[test]
    fn recommend_ignores_disabled_even_when_cheapest() {
        let registry = registry();
        // mercadopago would win MX/MXN on fees but has no credentials.
        let picked = registry.recommend("MX", "MXN").unwrap();
        assert_eq!(picked.key, "paypal");
    }

    #[test]
    fn recommend_falls_back_to_first_available() {
        let registry = registry();
        // Nobody supports JP/JPY; degrade to the first registered available.
        let picked = registry.recommend("JP", "JPY").unwrap();
        assert_eq!(picked.key, "stripe");
    }

    #[test]
    fn recommend_is_none_with_no_available_providers() {
        let mut registry = GatewayRegistry::new();
        registry.register(
            config("stripe", false, 2.9, &["USD"], &["US"]),
            Arc::new(NoopAdapter),
        );
        assert!(registry.recommend("US", "USD").is_none());
    }

    #[test]
    fn currency_match_is_case_insensitive_on_input() {
        let registry = registry();
        assert!(registry.config("stripe").unwrap().supports_currency("usd"));
        assert!(registry.config("stripe").unwrap().supports_country("es"));
    }
}
