pub mod error;
pub mod identity;
pub mod payment;
pub mod repository;

pub use error::{CoreError, CoreResult};
