//! API error handling
//!
//! Every handler-level failure is converted to the uniform error envelope
//! `{statusCode, message}` by the [`IntoResponse`] implementation below;
//! nothing escapes as a raw fault.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::error::{ErrorKind, WriteFailure};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform error envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// HTTP status code, repeated in the body
    pub status_code: u16,
    /// Human-readable message
    pub message: String,
}

/// Application error taxonomy
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 400 - missing or malformed input
    #[error("{0}")]
    InvalidInput(String),

    /// 401 - missing, invalid, or expired credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// 403 - ownership or permission mismatch
    #[error("{0}")]
    Forbidden(String),

    /// 404 - missing entity
    #[error("{0}")]
    NotFound(String),

    /// 409 - uniqueness violation (duplicate email/username)
    #[error("{0}")]
    Conflict(String),

    /// 500 - database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// 500 - unexpected internal failure
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details are logged, not leaked to the caller
        let message = match &self {
            AppError::Database(detail) => {
                tracing::error!(%detail, "database error");
                "Database Operation Failed".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return AppError::Conflict("Email Or Username Already Exists".to_string());
        }
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Internal(format!("cache error: {err}"))
    }
}

impl From<crate::auth::jwt::TokenError> for AppError {
    fn from(err: crate::auth::jwt::TokenError) -> Self {
        use crate::auth::jwt::TokenError;
        match err {
            TokenError::Signing(detail) => AppError::Internal(detail),
            other => AppError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// MongoDB duplicate-key write error (code 11000) from a unique index
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == 11_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorBody {
            status_code: 404,
            message: "Blog Not Found".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["message"], "Blog Not Found");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let response = AppError::Database("connection refused to 10.0.0.5".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
