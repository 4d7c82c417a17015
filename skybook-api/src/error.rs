use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skybook_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    Anyhow(anyhow::Error),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, retryable) = match self {
            AppError::Core(err) => {
                let retryable = err.is_retryable();
                let status = match &err {
                    CoreError::InvalidInput(_)
                    | CoreError::UnknownAirport(_)
                    | CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
                    CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    CoreError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
                    CoreError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    CoreError::InternalError(_) => {
                        tracing::error!("Internal Server Error: {}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    "Internal Server Error".to_string()
                } else {
                    err.to_string()
                };
                (status, message, retryable)
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    false,
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "retryable": retryable,
        }));

        (status, body).into_response()
    }
}
