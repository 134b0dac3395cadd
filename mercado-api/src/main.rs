use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mercado_api::gateway::build_registry;
use mercado_api::state::{AppState, AuthConfig};
use mercado_api::app;
use mercado_order::manager::OrderLifecycleManager;
use mercado_payment::PaymentRouter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mercado_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = mercado_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Mercado API on port {}", config.server.port);

    let database =
        mercado_store::Database::new(&config.database.url, config.database.max_connections)
            .await
            .expect("Failed to connect to database");
    database.migrate().await.expect("Failed to run migrations");

    let orders = Arc::new(mercado_store::PgOrderRepository::new(database.pool.clone()));
    let ledger = Arc::new(mercado_store::PgStockLedger::new(database.pool.clone()));
    let payments_repo = Arc::new(mercado_store::PgPaymentRepository::new(database.pool.clone()));
    let notifier = Arc::new(mercado_store::OutboxNotifier::new(database.pool.clone()));

    let lifecycle = Arc::new(OrderLifecycleManager::new(
        orders.clone(),
        ledger.clone(),
        notifier.clone(),
    ));

    let registry = Arc::new(build_registry(&config.payments));
    let payments = Arc::new(PaymentRouter::new(
        registry.clone(),
        payments_repo,
        orders.clone(),
        notifier,
        Duration::from_millis(config.payments.provider_timeout_ms),
    ));

    let app_state = AppState {
        lifecycle,
        payments,
        registry,
        orders,
        products: ledger,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
