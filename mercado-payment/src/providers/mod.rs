//! Provider-specific adapters behind the shared `ProviderAdapter` contract.
//!
//! Each adapter owns its credentials, translates the uniform charge request
//! into that provider's call shape, and normalizes the provider's status
//! vocabulary down to the settled boolean. Adding a provider means one new
//! module here plus one `GatewayRegistry::register` call at startup.

pub mod mercadopago;
pub mod paypal;
pub mod stripe;

pub use mercadopago::MercadoPagoAdapter;
pub use paypal::PaypalAdapter;
pub use stripe::StripeAdapter;
