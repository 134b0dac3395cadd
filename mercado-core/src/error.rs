/// Error taxonomy shared by every crate in the workspace. The API layer maps
/// each variant onto an HTTP status; internal crates only ever construct them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not allowed: {0}")]
    Authorization(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        CoreError::NotFound(what.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}
