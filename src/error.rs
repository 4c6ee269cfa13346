use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Ошибки сервиса рассадки. Каждая ошибка отдаётся клиенту структурированным JSON.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Capacity exceeded. {unseated} students could not be seated. Add more rooms or increase bench capacity.")]
    CapacityExceeded { unseated: usize },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    StateConflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
pub struct ApiError {
    success: bool,
    message: String,
    #[serde(rename = "unseatedCount", skip_serializing_if = "Option::is_none")]
    unseated_count: Option<usize>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::StateConflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

// Невалидное тело или путь - та же 400 с конвертом, что и у остальных ошибок
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let unseated_count = match &self {
            AppError::CapacityExceeded { unseated } => Some(*unseated),
            _ => None,
        };

        // Детали внутренних ошибок только в лог
        let message = if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
            "Server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ApiError { success: false, message, unseated_count }),
        )
            .into_response()
    }
}
