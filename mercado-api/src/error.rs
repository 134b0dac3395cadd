use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mercado_core::CoreError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    Internal(anyhow::Error),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Core(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Core(CoreError::Authentication(msg)) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Core(CoreError::Authorization(msg)) => (StatusCode::FORBIDDEN, msg),
            AppError::Core(CoreError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            AppError::Core(CoreError::Validation(msg)) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Core(CoreError::Gateway(msg)) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Core(CoreError::Persistence(msg)) => {
                tracing::error!("Persistence error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
