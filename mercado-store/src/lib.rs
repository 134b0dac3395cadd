pub mod app_config;
pub mod database;
pub mod events;
pub mod order_repo;
pub mod payment_repo;
pub mod stock_repo;

pub use database::Database;
pub use events::OutboxNotifier;
pub use order_repo::PgOrderRepository;
pub use payment_repo::PgPaymentRepository;
pub use stock_repo::PgStockLedger;
