use crate::registry::GatewayRegistry;
use crate::repository::PaymentRepository;
use chrono::Utc;
use mercado_core::payment::{ChargeRequest, PaymentRecord, PaymentResponse, PaymentState};
use mercado_core::repository::NotificationEmitter;
use mercado_core::{CoreError, CoreResult};
use mercado_order::models::OrderStatus;
use mercado_order::repository::OrderRepository;
use mercado_shared::models::events::{OrderEvent, OrderEventKind};
use std::sync::Arc;
use std::time::Duration;

/// Uniform entry point for every payment attempt. Validates against the
/// registry before any provider call, dispatches to the registered adapter,
/// and persists the transaction record independent of which provider ran.
pub struct PaymentRouter {
    registry: Arc<GatewayRegistry>,
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
    notifier: Arc<dyn NotificationEmitter>,
    /// Bound on outbound provider calls. A timed-out charge is a failure and
    /// persists nothing, so no PENDING record dangles for a call that never
    /// came back.
    provider_timeout: Duration,
}

impl PaymentRouter {
    pub fn new(
        registry: Arc<GatewayRegistry>,
        payments: Arc<dyn PaymentRepository>,
        orders: Arc<dyn OrderRepository>,
        notifier: Arc<dyn NotificationEmitter>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            payments,
            orders,
            notifier,
            provider_timeout,
        }
    }

    /// Run a charge through the named provider.
    ///
    /// Fails fast with `Gateway` when the provider is unknown or disabled, or
    /// when it does not support the requested currency; no provider call is
    /// attempted in those cases. On adapter success a `PENDING` record is
    /// persisted; on adapter failure nothing is.
    pub async fn process_payment(&self, request: &ChargeRequest) -> CoreResult<PaymentResponse> {
        let config = self
            .registry
            .config(&request.provider)
            .ok_or_else(|| CoreError::Gateway(format!("unknown provider '{}'", request.provider)))?;

        if !config.is_enabled {
            return Err(CoreError::Gateway(format!(
                "provider '{}' is not enabled",
                request.provider
            )));
        }
        if !config.supports_currency(&request.currency) {
            return Err(CoreError::Gateway(format!(
                "provider '{}' does not support currency '{}'",
                request.provider, request.currency
            )));
        }

        let adapter = self
            .registry
            .adapter(&request.provider)
            .ok_or_else(|| CoreError::Gateway(format!("no adapter for '{}'", request.provider)))?;

        let outcome = tokio::time::timeout(self.provider_timeout, adapter.charge(request))
            .await
            .map_err(|_| {
                CoreError::Gateway(format!(
                    "charge via '{}' timed out after {:?}",
                    request.provider, self.provider_timeout
                ))
            })??;

        let record = PaymentRecord::pending(request, &outcome);
        self.payments.create(&record).await?;

        tracing::info!(
            order_id = %request.order_id,
            provider = %request.provider,
            transaction_id = %outcome.transaction_id,
            "payment initiated"
        );

        Ok(PaymentResponse {
            success: true,
            transaction_id: Some(outcome.transaction_id),
            payment_url: outcome.payment_url,
            client_secret: outcome.client_secret,
            error: None,
        })
    }

    /// Confirm a previously initiated payment, typically off a provider
    /// webhook. When the provider reports the transaction settled, the record
    /// goes `COMPLETED` and the linked order goes `CONFIRMED`. This is the one
    /// place the payment subsystem touches order state.
    pub async fn confirm_payment(
        &self,
        provider: &str,
        provider_transaction_id: &str,
    ) -> CoreResult<PaymentResponse> {
        let record = self
            .payments
            .find_by_provider_transaction(provider, provider_transaction_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "payment {}/{}",
                    provider, provider_transaction_id
                ))
            })?;

        // COMPLETED is final; a replayed webhook is acknowledged, not re-run.
        if record.state == PaymentState::Completed {
            return Ok(PaymentResponse::settled(record.provider_transaction_id));
        }

        let adapter = self
            .registry
            .adapter(provider)
            .ok_or_else(|| CoreError::Gateway(format!("no adapter for '{}'", provider)))?;

        let settled = tokio::time::timeout(
            self.provider_timeout,
            adapter.is_settled(provider_transaction_id),
        )
        .await
        .map_err(|_| {
            CoreError::Gateway(format!(
                "settlement check via '{}' timed out after {:?}",
                provider, self.provider_timeout
            ))
        })??;

        if !settled {
            return Ok(PaymentResponse::unsettled(
                record.provider_transaction_id,
                "transaction not settled at provider",
            ));
        }

        self.payments.mark_completed(record.id, Utc::now()).await?;
        self.orders
            .set_status(record.order_id, OrderStatus::Confirmed)
            .await?;

        tracing::info!(
            order_id = %record.order_id,
            provider = %provider,
            transaction_id = %provider_transaction_id,
            "payment confirmed, order confirmed"
        );

        // The early COMPLETED return above keeps webhook replays from
        // re-emitting this.
        let event = OrderEvent {
            user_id: record.user_id.clone(),
            order_id: record.order_id,
            kind: OrderEventKind::PaymentConfirmed,
            payload: serde_json::json!({
                "provider": provider,
                "transaction_id": provider_transaction_id,
            }),
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self.notifier.emit(event).await {
            tracing::warn!(
                order_id = %record.order_id,
                error = %e,
                "payment confirmation notification failed"
            );
        }

        Ok(PaymentResponse::settled(record.provider_transaction_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ProviderConfig, ProviderFees};
    use async_trait::async_trait;
    use chrono::DateTime;
    use mercado_core::payment::{ChargeOutcome, CustomerInfo, ProviderAdapter};
    use mercado_order::changes::OrderPatch;
    use mercado_order::models::{CustomerSnapshot, Order};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    enum AdapterBehavior {
        Succeed,
        Fail,
        Hang,
    }

    struct ScriptedAdapter {
        behavior: AdapterBehavior,
        settled: bool,
        settle_calls: AtomicUsize,
    }

    impl ScriptedAdapter {
        fn succeeding() -> Arc<Self> {
            Arc::new(Self {
                behavior: AdapterBehavior::Succeed,
                settled: true,
                settle_calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                behavior: AdapterBehavior::Fail,
                settled: false,
                settle_calls: AtomicUsize::new(0),
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                behavior: AdapterBehavior::Hang,
                settled: false,
                settle_calls: AtomicUsize::new(0),
            })
        }

        fn unsettled() -> Arc<Self> {
            Arc::new(Self {
                behavior: AdapterBehavior::Succeed,
                settled: false,
                settle_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedAdapter {
        async fn charge(&self, request: &ChargeRequest) -> CoreResult<ChargeOutcome> {
            match self.behavior {
                AdapterBehavior::Succeed => Ok(ChargeOutcome {
                    transaction_id: format!("txn_{}", request.order_id.simple()),
                    payment_url: Some("https://pay.example/checkout".to_string()),
                    client_secret: None,
                }),
                AdapterBehavior::Fail => {
                    Err(CoreError::Gateway("card declined".to_string()))
                }
                AdapterBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }

        async fn is_settled(&self, _transaction_id: &str) -> CoreResult<bool> {
            self.settle_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.settled)
        }
    }

    struct MemPayments {
        records: Mutex<Vec<PaymentRecord>>,
    }

    impl MemPayments {
        fn empty() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        fn first(&self) -> PaymentRecord {
            self.records.lock().unwrap()[0].clone()
        }
    }

    #[async_trait]
    impl PaymentRepository for MemPayments {
        async fn create(&self, record: &PaymentRecord) -> CoreResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_by_provider_transaction(
            &self,
            provider: &str,
            provider_transaction_id: &str,
        ) -> CoreResult<Option<PaymentRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| {
                    r.provider == provider && r.provider_transaction_id == provider_transaction_id
                })
                .cloned())
        }

        async fn mark_completed(&self, id: Uuid, processed_at: DateTime<Utc>) -> CoreResult<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| CoreError::not_found("payment"))?;
            record.state = PaymentState::Completed;
            record.processed_at = Some(processed_at);
            Ok(())
        }
    }

    struct MemOrders {
        orders: Mutex<HashMap<Uuid, Order>>,
    }

    impl MemOrders {
        fn with(order: Order) -> Arc<Self> {
            let mut map = HashMap::new();
            map.insert(order.id, order);
            Arc::new(Self {
                orders: Mutex::new(map),
            })
        }

        fn status_of(&self, id: Uuid) -> OrderStatus {
            self.orders.lock().unwrap().get(&id).unwrap().status
        }
    }

    #[async_trait]
    impl OrderRepository for MemOrders {
        async fn get(&self, id: Uuid) -> CoreResult<Option<Order>> {
            Ok(self.orders.lock().unwrap().get(&id).cloned())
        }

        async fn apply_patch(&self, _id: Uuid, _patch: &OrderPatch) -> CoreResult<()> {
            unreachable!("router never patches orders")
        }

        async fn set_status(&self, id: Uuid, status: OrderStatus) -> CoreResult<()> {
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .get_mut(&id)
                .ok_or_else(|| CoreError::not_found("order"))?;
            order.status = status;
            Ok(())
        }

        async fn delete_cascade(&self, _id: Uuid) -> CoreResult<()> {
            unreachable!("router never deletes orders")
        }
    }

    fn order() -> Order {
        Order::new(
            "user-1".to_string(),
            CustomerSnapshot {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string().into(),
                phone: None,
                address: "Calle 1".to_string(),
            },
            dec!(49.90),
        )
    }

    fn config(key: &str, enabled: bool) -> ProviderConfig {
        ProviderConfig {
            key: key.to_string(),
            display_name: key.to_string(),
            is_enabled: enabled,
            supported_currencies: ["USD".to_string(), "EUR".to_string()].into(),
            supported_countries: ["US".to_string(), "ES".to_string()].into(),
            fees: ProviderFees {
                percentage: 2.9,
                fixed: dec!(0.30),
            },
            features: Default::default(),
        }
    }

    fn request(order_id: Uuid, provider: &str, currency: &str) -> ChargeRequest {
        ChargeRequest {
            amount: dec!(49.90),
            currency: currency.to_string(),
            order_id,
            user_id: "user-1".to_string(),
            provider: provider.to_string(),
            customer: CustomerInfo {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                country: Some("ES".to_string()),
            },
            metadata: None,
        }
    }

    struct MemNotifier {
        events: Mutex<Vec<OrderEvent>>,
        failing: bool,
    }

    impl MemNotifier {
        fn working() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
                failing: false,
            })
        }

        fn broken() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
                failing: true,
            })
        }

        fn kinds(&self) -> Vec<OrderEventKind> {
            self.events.lock().unwrap().iter().map(|e| e.kind).collect()
        }
    }

    #[async_trait]
    impl NotificationEmitter for MemNotifier {
        async fn emit(&self, event: OrderEvent) -> CoreResult<()> {
            if self.failing {
                return Err(CoreError::Persistence("notification channel down".into()));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn router(
        adapter: Arc<ScriptedAdapter>,
        enabled: bool,
        payments: Arc<MemPayments>,
        orders: Arc<MemOrders>,
    ) -> PaymentRouter {
        router_with_notifier(adapter, enabled, payments, orders, MemNotifier::working())
    }

    fn router_with_notifier(
        adapter: Arc<ScriptedAdapter>,
        enabled: bool,
        payments: Arc<MemPayments>,
        orders: Arc<MemOrders>,
        notifier: Arc<MemNotifier>,
    ) -> PaymentRouter {
        let mut registry = GatewayRegistry::new();
        registry.register(config("stripe", enabled), adapter);
        PaymentRouter::new(
            Arc::new(registry),
            payments,
            orders,
            notifier,
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn successful_charge_persists_pending_record() {
        let order = order();
        let order_id = order.id;
        let payments = MemPayments::empty();
        let router = router(
            ScriptedAdapter::succeeding(),
            true,
            payments.clone(),
            MemOrders::with(order),
        );

        let response = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.transaction_id.is_some());
        assert_eq!(payments.count(), 1);
        let record = payments.first();
        assert_eq!(record.state, PaymentState::Pending);
        assert_eq!(record.order_id, order_id);
        assert_eq!(record.provider, "stripe");
        assert!(record.processed_at.is_none());
    }

    #[tokio::test]
    async fn disabled_provider_fails_before_any_call_and_persists_nothing() {
        let order = order();
        let order_id = order.id;
        let payments = MemPayments::empty();
        // The hanging adapter proves the call was never dispatched: a dispatch
        // would trip the timeout instead of the fast gateway error.
        let router = router(
            ScriptedAdapter::hanging(),
            false,
            payments.clone(),
            MemOrders::with(order),
        );

        let err = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Gateway(_)));
        assert_eq!(payments.count(), 0);
    }

    #[tokio::test]
    async fn unsupported_currency_fails_before_any_call() {
        let order = order();
        let order_id = order.id;
        let payments = MemPayments::empty();
        let router = router(
            ScriptedAdapter::hanging(),
            true,
            payments.clone(),
            MemOrders::with(order),
        );

        let err = router
            .process_payment(&request(order_id, "stripe", "JPY"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Gateway(_)));
        assert_eq!(payments.count(), 0);
    }

    #[tokio::test]
    async fn unknown_provider_is_a_gateway_error() {
        let order = order();
        let order_id = order.id;
        let router = router(
            ScriptedAdapter::succeeding(),
            true,
            MemPayments::empty(),
            MemOrders::with(order),
        );

        let err = router
            .process_payment(&request(order_id, "altcoinpay", "USD"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Gateway(_)));
    }

    #[tokio::test]
    async fn adapter_failure_persists_no_record() {
        let order = order();
        let order_id = order.id;
        let payments = MemPayments::empty();
        let router = router(
            ScriptedAdapter::failing(),
            true,
            payments.clone(),
            MemOrders::with(order),
        );

        let err = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Gateway(_)));
        assert_eq!(payments.count(), 0);
    }

    #[tokio::test]
    async fn timed_out_charge_is_a_gateway_error_with_no_record() {
        let order = order();
        let order_id = order.id;
        let payments = MemPayments::empty();
        let router = router(
            ScriptedAdapter::hanging(),
            true,
            payments.clone(),
            MemOrders::with(order),
        );

        let err = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Gateway(_)));
        assert_eq!(payments.count(), 0);
    }

    #[tokio::test]
    async fn confirm_settled_payment_completes_record_and_confirms_order() {
        let order = order();
        let order_id = order.id;
        let orders = MemOrders::with(order);
        let payments = MemPayments::empty();
        let router = router(
            ScriptedAdapter::succeeding(),
            true,
            payments.clone(),
            orders.clone(),
        );

        let initiated = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap();
        let txn = initiated.transaction_id.unwrap();

        let confirmed = router.confirm_payment("stripe", &txn).await.unwrap();
        assert!(confirmed.success);

        let record = payments.first();
        assert_eq!(record.state, PaymentState::Completed);
        assert!(record.processed_at.is_some());
        assert_eq!(orders.status_of(order_id), OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn confirm_unknown_transaction_is_not_found() {
        let order = order();
        let router = router(
            ScriptedAdapter::succeeding(),
            true,
            MemPayments::empty(),
            MemOrders::with(order),
        );

        let err = router
            .confirm_payment("stripe", "txn_nope")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn confirm_unsettled_payment_leaves_record_pending() {
        let order = order();
        let order_id = order.id;
        let orders = MemOrders::with(order);
        let payments = MemPayments::empty();
        let router = router(
            ScriptedAdapter::unsettled(),
            true,
            payments.clone(),
            orders.clone(),
        );

        let initiated = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap();
        let txn = initiated.transaction_id.unwrap();

        let response = router.confirm_payment("stripe", &txn).await.unwrap();
        assert!(!response.success);
        assert_eq!(payments.first().state, PaymentState::Pending);
        assert_eq!(orders.status_of(order_id), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn confirm_is_idempotent_once_completed() {
        let order = order();
        let order_id = order.id;
        let orders = MemOrders::with(order);
        let payments = MemPayments::empty();
        let adapter = ScriptedAdapter::succeeding();
        let router = router(adapter.clone(), true, payments.clone(), orders.clone());

        let initiated = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap();
        let txn = initiated.transaction_id.unwrap();

        router.confirm_payment("stripe", &txn).await.unwrap();
        let replay = router.confirm_payment("stripe", &txn).await.unwrap();

        assert!(replay.success);
        // The provider was only asked once; the replayed webhook short-circuits.
        assert_eq!(adapter.settle_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn confirm_emits_payment_confirmed_once() {
        let order = order();
        let order_id = order.id;
        let notifier = MemNotifier::working();
        let router = router_with_notifier(
            ScriptedAdapter::succeeding(),
            true,
            MemPayments::empty(),
            MemOrders::with(order),
            notifier.clone(),
        );

        let initiated = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap();
        let txn = initiated.transaction_id.unwrap();

        router.confirm_payment("stripe", &txn).await.unwrap();
        // Replayed webhook acknowledges but must not notify again.
        router.confirm_payment("stripe", &txn).await.unwrap();

        assert_eq!(notifier.kinds(), vec![OrderEventKind::PaymentConfirmed]);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_confirm() {
        let order = order();
        let order_id = order.id;
        let orders = MemOrders::with(order);
        let payments = MemPayments::empty();
        let router = router_with_notifier(
            ScriptedAdapter::succeeding(),
            true,
            payments.clone(),
            orders.clone(),
            MemNotifier::broken(),
        );

        let initiated = router
            .process_payment(&request(order_id, "stripe", "USD"))
            .await
            .unwrap();
        let txn = initiated.transaction_id.unwrap();

        let confirmed = router.confirm_payment("stripe", &txn).await.unwrap();
        assert!(confirmed.success);
        assert_eq!(payments.first().state, PaymentState::Completed);
        assert_eq!(orders.status_of(order_id), OrderStatus::Confirmed);
    }
}
