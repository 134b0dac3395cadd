use mercado_order::manager::OrderLifecycleManager;
use mercado_order::repository::OrderRepository;
use mercado_core::repository::ProductLookup;
use mercado_payment::registry::GatewayRegistry;
use mercado_payment::router::PaymentRouter;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

/// Everything a handler needs, behind trait objects so tests wire in fakes
/// without touching the environment.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<OrderLifecycleManager>,
    pub payments: Arc<PaymentRouter>,
    pub registry: Arc<GatewayRegistry>,
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductLookup>,
    pub auth: AuthConfig,
}
