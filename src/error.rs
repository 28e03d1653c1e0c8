use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    /// Caller-supplied data broke a documented constraint.
    #[error("{0}")]
    Validation(String),

    /// A business rule refused the operation (stock, inactive product, deletion guard).
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Prefix the error with the operation that failed, keeping its kind.
    ///
    /// Domain errors get the prefix in their message; infrastructure errors
    /// are folded into [`AppError::Internal`] with the prefix as context.
    pub fn context(self, operation: &str) -> Self {
        match self {
            AppError::NotFound(msg) => AppError::NotFound(format!("{operation}: {msg}")),
            AppError::Validation(msg) => AppError::Validation(format!("{operation}: {msg}")),
            AppError::BadRequest(msg) => AppError::BadRequest(format!("{operation}: {msg}")),
            AppError::Unauthorized(_) | AppError::Forbidden => self,
            AppError::DbError(err) => {
                AppError::Internal(anyhow::Error::new(err).context(operation.to_string()))
            }
            AppError::OrmError(err) => {
                AppError::Internal(anyhow::Error::new(err).context(operation.to_string()))
            }
            AppError::Internal(err) => AppError::Internal(err.context(operation.to_string())),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
