use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::domain::{ScheduleError, ServiceSelectionError, TimeError};
use crate::scheduling::SchedulingError;

const EXCLUSION_VIOLATION: &str = "23P01";
const UNIQUE_VIOLATION: &str = "23505";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const QUERY_CANCELED: &str = "57014";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("slot no longer available: {0}")]
    SlotUnavailable(String),

    #[error("provider not found: {0}")]
    ProviderNotFound(Uuid),

    #[error("client not found: {0}")]
    ClientNotFound(Uuid),

    #[error("service not found: {0}")]
    ServiceNotFound(Uuid),

    #[error("appointment not found: {0}")]
    AppointmentNotFound(Uuid),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("idempotency conflict: key {idempotency_key} is already in use")]
    IdempotencyConflict { idempotency_key: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                Some(EXCLUSION_VIOLATION) => {
                    return Self::SlotUnavailable("overlaps an existing appointment".into())
                }
                Some(LOCK_NOT_AVAILABLE) | Some(QUERY_CANCELED) => {
                    return Self::StoreUnavailable(db.message().to_string())
                }
                _ => {}
            }
        }
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StoreUnavailable(err.to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Forbidden(msg) => Self::Forbidden(msg),
            SchedulingError::OutsideWorkingHours { .. } | SchedulingError::DayBlocked(_) => {
                Self::SlotUnavailable(err.to_string())
            }
            SchedulingError::InvalidTransition { .. } | SchedulingError::NotReschedulable(_) => {
                Self::InvalidTransition(err.to_string())
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Corrupt(_) => Self::Internal(anyhow::Error::new(err)),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<ServiceSelectionError> for AppError {
    fn from(err: ServiceSelectionError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TimeError> for AppError {
    fn from(err: TimeError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Returns true when `err` is a unique violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) && db.constraint() == Some(constraint)
    )
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            Self::SlotUnavailable(_) => (
                StatusCode::CONFLICT,
                "slot_unavailable",
                Some(serde_json::json!({ "hint": "choose another slot" })),
            ),
            Self::ProviderNotFound(_) => (StatusCode::NOT_FOUND, "provider_not_found", None),
            Self::ClientNotFound(_) => (StatusCode::NOT_FOUND, "client_not_found", None),
            Self::ServiceNotFound(_) => (StatusCode::NOT_FOUND, "service_not_found", None),
            Self::AppointmentNotFound(_) => (StatusCode::NOT_FOUND, "appointment_not_found", None),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            Self::IdempotencyConflict { .. } => (StatusCode::CONFLICT, "idempotency_conflict", None),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", None),
            Self::InvalidTransition(_) => (StatusCode::CONFLICT, "invalid_transition", None),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
            Self::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                Some(serde_json::json!({ "retryable": true })),
            ),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        };

        if status.is_server_error() {
            error!(error = %self, code, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
