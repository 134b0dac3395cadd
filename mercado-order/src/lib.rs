pub mod changes;
pub mod locks;
pub mod manager;
pub mod models;
pub mod policy;
pub mod repository;

pub use changes::OrderPatch;
pub use manager::OrderLifecycleManager;
pub use models::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingStatus};
pub use repository::OrderRepository;
