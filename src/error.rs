use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::models::bookings::LifecycleError;
use crate::services::payments::PaymentError;

/// Error type returned by every handler.
///
/// Client-facing variants carry the message shown to the caller. `Upstream`
/// carries a generic public message plus internal detail that is logged but
/// never serialized.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Upstream {
        message: &'static str,
        detail: String,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn upstream(message: &'static str, detail: impl ToString) -> Self {
        Self::Upstream {
            message,
            detail: detail.to_string(),
        }
    }

    /// Map a unique-constraint violation to a 409, anything else to a 500.
    pub fn from_insert(err: DbErr, conflict_message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::conflict(conflict_message),
            _ => err.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Upstream { message, detail } = self {
            tracing::error!(detail = %detail, "{message}");
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        Self::upstream("Database error", err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        Self::upstream("Payment processing failed", err)
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("no".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::forbidden("no").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("gone").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("dup").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::upstream("Database error", "boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn upstream_detail_is_not_leaked() {
        let err = AppError::upstream("Payment processing failed", "card_declined: secret detail");
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Payment processing failed");
        assert!(!body.windows(6).any(|w| w == b"secret"));
    }

    #[test]
    fn db_errors_become_upstream() {
        let err: AppError = DbErr::Custom("connection reset".into()).into();
        assert!(matches!(err, AppError::Upstream { message: "Database error", .. }));
    }

    #[test]
    fn non_unique_insert_failure_is_upstream() {
        let err = AppError::from_insert(DbErr::Custom("timeout".into()), "exists");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
