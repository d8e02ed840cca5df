//! Application error type and its HTTP mapping.
//!
//! Every service returns [`AppError`]. Named outcomes of the core flows
//! (`stage_not_found`, `code_mismatch`, `already_registered`, ...) travel in
//! the `details.reason` field so that the boundary can stay coarse while tests
//! and callers can still tell them apart via [`AppError::reason`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::infrastructure::cache::CacheError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input. Never retried.
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Missing, invalid, expired or revoked credential.
    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// Uniqueness violation.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Cache or store momentarily unreachable.
    #[error("{message}")]
    Unavailable { message: String, details: Value },

    /// Entropy exhaustion, misconfiguration and every other server fault.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    fn details(&self) -> &Value {
        match self {
            Self::Validation { details, .. }
            | Self::NotFound { details, .. }
            | Self::Unauthorized { details, .. }
            | Self::Conflict { details, .. }
            | Self::Unavailable { details, .. }
            | Self::Internal { details, .. } => details,
        }
    }

    /// Machine-readable reason attached by the component that raised the error.
    pub fn reason(&self) -> Option<&str> {
        self.details().get("reason").and_then(Value::as_str)
    }

    /// Name of the violated store constraint, for [`AppError::Conflict`] raised by a repository.
    pub fn constraint(&self) -> Option<&str> {
        self.details().get("constraint").and_then(Value::as_str)
    }

    /// Returns true if this is a store-level uniqueness violation on `constraint`.
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, Self::Conflict { .. }) && self.constraint() == Some(constraint)
    }

    /// Converts into the client-facing payload.
    ///
    /// Server-side failures are reduced to a generic message so that no
    /// internal detail leaks past the boundary.
    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            Self::Validation { message, details } => ErrorInfo {
                code: "validation_error",
                message: message.clone(),
                details: details.clone(),
            },
            Self::NotFound { message, details } => ErrorInfo {
                code: "not_found",
                message: message.clone(),
                details: details.clone(),
            },
            Self::Unauthorized { message, .. } => ErrorInfo {
                code: "authentication_error",
                message: message.clone(),
                details: json!({}),
            },
            Self::Conflict { message, details } => ErrorInfo {
                code: "conflict",
                message: message.clone(),
                details: json!({ "reason": details.get("reason") }),
            },
            Self::Unavailable { .. } => ErrorInfo {
                code: "service_unavailable",
                message: "Service temporarily unavailable".to_string(),
                details: json!({}),
            },
            Self::Internal { .. } => ErrorInfo {
                code: "internal_error",
                message: "Internal server error".to_string(),
                details: json!({}),
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, details = %self.details(), "Request failed");
        }

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_error_info(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": db.constraint() }),
                );
            }
        }

        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::unavailable("Database unavailable", json!({ "reason": e.to_string() }))
            }
            other => AppError::internal("Database error", json!({ "reason": other.to_string() })),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::ConnectionError(_) => {
                AppError::unavailable("Cache unavailable", json!({ "reason": e.to_string() }))
            }
            CacheError::OperationError(_) => {
                AppError::internal("Cache error", json!({ "reason": e.to_string() }))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        AppError::bad_request(
            "Request validation failed",
            json!({ "reason": "invalid_request", "fields": fields }),
        )
    }
}
