//! Gate Error Types
//!
//! This module provides gate-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Gate-specific result type alias
pub type GateResult<T> = Result<T, GateError>;

/// Gate-specific error variants
///
/// Absence of data (no counter, no challenge) is never an error; only input
/// problems and genuine storage or collaborator faults end up here.
#[derive(Debug, Error)]
pub enum GateError {
    /// User identifier missing or blank
    #[error("Invalid user id")]
    InvalidUserId,

    /// Account number is not 9 to 14 digits
    #[error("Invalid account number: expected 9 to 14 digits")]
    InvalidAccountNumber,

    /// Caller did not present the configured service token
    #[error("Service token missing or invalid")]
    Unauthorized,

    /// Administrative operation requested by a non-administrator
    #[error("Administrator privileges required")]
    Forbidden,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Ledger file could not be read or written
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ledger file content could not be encoded or decoded
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Account lookup collaborator failed
    #[error("Account lookup failed: {0}")]
    Lookup(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Whether the durable store could not be reached
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(
            self,
            GateError::Database(_) | GateError::Io(_) | GateError::Serialization(_)
        )
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::InvalidUserId | GateError::InvalidAccountNumber => ErrorKind::BadRequest,
            GateError::Unauthorized => ErrorKind::Unauthorized,
            GateError::Forbidden => ErrorKind::Forbidden,
            GateError::Database(_) | GateError::Io(_) | GateError::Serialization(_) => {
                ErrorKind::ServiceUnavailable
            }
            GateError::Lookup(_) => ErrorKind::BadGateway,
            GateError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            GateError::Database(e) => {
                tracing::error!(error = %e, "Gate database error");
            }
            GateError::Io(e) => {
                tracing::error!(error = %e, "Gate storage I/O error");
            }
            GateError::Serialization(e) => {
                tracing::error!(error = %e, "Gate storage decode error");
            }
            GateError::Internal(msg) => {
                tracing::error!(message = %msg, "Gate internal error");
            }
            GateError::Lookup(msg) => {
                tracing::warn!(message = %msg, "Account lookup failed");
            }
            GateError::Forbidden => {
                tracing::warn!("Administrative call refused");
            }
            GateError::Unauthorized => {
                tracing::warn!("Request without a valid service token");
            }
            _ => {
                tracing::debug!(error = %self, "Gate error");
            }
        }
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        if err.is_storage_unavailable() {
            // Storage details stay in the logs
            return AppError::service_unavailable("System busy")
                .with_action("Please try again in a few minutes")
                .with_source(err);
        }
        AppError::new(err.kind(), err.to_string())
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
