use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::models::booking::ConflictType;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        conflict_type: Option<ConflictType>,
    },
    #[error("Payment failed: {0}")]
    PaymentFailed(String),
    #[error("Payment provider error: {0}")]
    Provider(String),
}

impl AppError {
    pub fn conflict(conflict_type: ConflictType, message: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            conflict_type: Some(conflict_type),
        }
    }

    /// True when the store rejected a write on a unique index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(e) => e
                .as_database_error()
                .and_then(|db_err| db_err.code())
                // 2067/1555 = SQLite unique/primary key, 23505 = PostgreSQL unique violation
                .is_some_and(|code| code == "2067" || code == "1555" || code == "23505"),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unique_violation() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Resource already exists (duplicate entry)" })),
            )
                .into_response();
        }

        let (status, message) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict { message, conflict_type } => {
                let body = Json(json!({
                    "error": message,
                    "conflict_type": conflict_type,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::PaymentFailed(msg) => (StatusCode::PAYMENT_REQUIRED, msg.clone()),
            AppError::Provider(msg) => {
                error!("Payment provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment provider unavailable".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
