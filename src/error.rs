use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// The application's error type. Every expected failure is mapped to a
/// stable status code and a structured JSON body at the response boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Registration with a username that already exists.
    #[error("Username already taken")]
    DuplicateUsername,

    /// Unknown user or wrong password. Reported uniformly for both.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A request without a valid session context.
    #[error("authentication required")]
    Unauthenticated,

    /// Missing row, or a row owned by a different user. Indistinguishable
    /// to the caller.
    #[error("not found")]
    NotFound,

    /// Durable-store failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(ref msg) => {
                tracing::debug!("validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            ApiError::DuplicateUsername => {
                tracing::debug!("duplicate username");
                (StatusCode::CONFLICT, self.to_string())
            }

            ApiError::InvalidCredentials => {
                tracing::warn!("invalid credentials");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            ApiError::Unauthenticated => {
                tracing::debug!("unauthenticated request");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),

            ApiError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_string())
            }

            ApiError::Internal(ref msg) => {
                tracing::error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
