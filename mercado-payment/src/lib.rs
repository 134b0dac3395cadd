pub mod providers;
pub mod registry;
pub mod repository;
pub mod router;

pub use registry::{GatewayRegistry, ProviderConfig, ProviderFees};
pub use repository::PaymentRepository;
pub use router::PaymentRouter;
