//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use finapp_core::{AccountId, Amount, LedgerError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - an identifier is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The source account cannot cover a transfer.
    #[error("insufficient funds in account {account_id}: balance={balance}, amount={amount}")]
    InsufficientFunds {
        /// Source account.
        account_id: AccountId,
        /// Balance at the time of the transfer.
        balance: Amount,
        /// Requested amount.
        amount: Amount,
    },

    /// The store gave up on a contended unit of work.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientFunds {
                account_id,
                balance,
                amount,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "account_id": account_id,
                    "balance": balance,
                    "amount": amount
                })),
            ),
            Self::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Request aborted under contention");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "The request could not be completed, please retry".to_string(),
                    None,
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidArgument(_)
            | LedgerError::InvalidAmountFormat(_)
            | LedgerError::InvalidId(_) => Self::BadRequest(err.to_string()),
            LedgerError::AccountNotFound { .. } => Self::NotFound(err.to_string()),
            LedgerError::InsufficientFunds {
                account_id,
                balance,
                amount,
            } => Self::InsufficientFunds {
                account_id,
                balance,
                amount,
            },
            LedgerError::DuplicateId { .. } => Self::Conflict(err.to_string()),
            LedgerError::TransactionAborted { .. } | LedgerError::Conflict(_) => {
                Self::Unavailable(err.to_string())
            }
            LedgerError::Storage(msg) | LedgerError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
