//! # Engine Error Type
//!
//! Unified error returned by every service call.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI action (close order)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SettlementService::close_order → EngineResult<SettlementReport>        │
//! │       │                                                                 │
//! │       ├── CoreError::InvalidOrderStatus ──► INVALID_STATE               │
//! │       ├── CoreError::AuthorizationRequired ► UNAUTHORIZED               │
//! │       ├── DbError::NotFound ──────────────► NOT_FOUND                   │
//! │       ├── DbError::QueryFailed (abort) ───► TRANSACTION_FAILED          │
//! │       └── ConfigError ────────────────────► CONFIG_ERROR                │
//! │                                                                         │
//! │  error.to_response() → { "code": "TRANSACTION_FAILED",                  │
//! │                          "message": "..." }                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use comanda_core::CoreError;
use comanda_db::DbError;

use crate::config::ConfigError;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<comanda_core::ValidationError> for EngineError {
    fn from(err: comanda_core::ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    Unauthorized,
    InvalidState,
    TransactionFailed,
    ConfigError,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::TransactionFailed => "TRANSACTION_FAILED",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

/// What the UI receives when a call fails.
///
/// ```json
/// { "code": "UNAUTHORIZED", "message": "Courtesy requires Manager role (operator is Waiter)" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Core(err) => match err {
                CoreError::Validation(_) => ErrorCode::ValidationError,
                CoreError::AuthorizationRequired { .. } => ErrorCode::Unauthorized,
                CoreError::ItemNotFound { .. } | CoreError::ModifierNotFound { .. } => {
                    ErrorCode::NotFound
                }
                CoreError::InvalidOrderStatus { .. }
                | CoreError::OrderNotConfirmed(_)
                | CoreError::AlreadyReceived(_)
                | CoreError::NotASubRecipe(_) => ErrorCode::InvalidState,
                CoreError::MissingPrice { .. }
                | CoreError::NothingToSplit(_)
                | CoreError::SelfMerge(_)
                | CoreError::SameBranchTransfer(_) => ErrorCode::ValidationError,
            },
            EngineError::Db(err) => match err {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::UniqueViolation { .. } => ErrorCode::ValidationError,
                DbError::QueryFailed(_)
                | DbError::TransactionFailed(_)
                | DbError::PoolExhausted
                | DbError::ConnectionFailed(_) => ErrorCode::TransactionFailed,
                DbError::MigrationFailed(_)
                | DbError::Serialization(_)
                | DbError::ChangeFeedClosed
                | DbError::Internal(_) => ErrorCode::Internal,
            },
            EngineError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Builds the UI payload. Store internals are logged, not shown.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            EngineError::Db(
                err @ (DbError::QueryFailed(_)
                | DbError::TransactionFailed(_)
                | DbError::Internal(_)
                | DbError::Serialization(_)),
            ) => {
                tracing::error!(error = %err, "Store operation failed");
                "The operation could not be saved. Nothing was changed; please retry.".to_string()
            }
            other => other.to_string(),
        };
        ErrorResponse {
            code: self.code(),
            message,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_core::Role;

    #[test]
    fn test_authorization_maps_to_unauthorized() {
        let err = EngineError::from(CoreError::AuthorizationRequired {
            action: "Courtesy".to_string(),
            required: Role::Manager,
            actual: Role::Waiter,
        });
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::Unauthorized);
        assert!(response.message.contains("Courtesy"));
    }

    #[test]
    fn test_store_failures_hide_internals() {
        let err = EngineError::from(DbError::QueryFailed("disk I/O error".to_string()));
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::TransactionFailed);
        assert!(!response.message.contains("disk"));
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::InvalidState).unwrap();
        assert_eq!(json, "\"INVALID_STATE\"");
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
    }
}
