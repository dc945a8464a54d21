use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;
use crate::services::store::StoreError;
use crate::services::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please fix the errors in the form")]
    Validation(ValidationErrors),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("{0}")]
    ConfirmationRequired(&'static str),

    #[error("the booking service is unavailable, please try again")]
    Transport(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("booking {id}")),
            StoreError::InvalidTransition { from, to } => AppError::InvalidTransition { from, to },
            StoreError::Transport(e) => AppError::Transport(format!("{e:#}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        if let AppError::Transport(detail) = &self {
            tracing::error!(error = %detail, "storage backend failure");
        }

        let body = match &self {
            AppError::Validation(errors) => serde_json::json!({
                "error": self.to_string(),
                "fields": errors.errors,
                "first_invalid": errors.first_field(),
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
