//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                    │
//! │  └── DbError          - Persistence / transaction failures             │
//! │                                                                         │
//! │  comanda-engine errors                                                 │
//! │  └── EngineError      - What the UI sees (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{OrderStatus, Role};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is raised before any state is mutated; callers can retry
/// or surface the message without cleaning anything up.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The order is in a status that forbids the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding items to a PAID or VOID order
    /// - Closing an order twice
    /// - Merging into a voided order
    #[error("Order {order_id} is {status}, cannot {operation}")]
    InvalidOrderStatus {
        order_id: String,
        status: OrderStatus,
        operation: String,
    },

    /// The order reference has not been confirmed by the store yet.
    #[error("Order {0} is not confirmed by the store yet")]
    OrderNotConfirmed(String),

    /// A line item id does not exist on the order.
    #[error("Item {item_id} not found on order {order_id}")]
    ItemNotFound { order_id: String, item_id: String },

    /// The product has no price for the order's channel.
    #[error("Product {product} has no price for {order_type}")]
    MissingPrice { product: String, order_type: String },

    /// A selected modifier option does not exist in its group.
    #[error("Modifier option {option_id} not found in group {group_id}")]
    ModifierNotFound { group_id: String, option_id: String },

    /// The operator's role is not allowed to perform the action.
    ///
    /// ## When This Occurs
    /// - Applying a courtesy as a waiter
    /// - Applying a discount outside its schedule without an override
    #[error("{action} requires {required:?} role (operator is {actual:?})")]
    AuthorizationRequired {
        action: String,
        required: Role,
        actual: Role,
    },

    /// Split requested with nothing selected to move.
    #[error("Split of order {0} has no item selected")]
    NothingToSplit(String),

    /// Merge requested between an order and itself.
    #[error("Cannot merge order {0} into itself")]
    SelfMerge(String),

    /// Production target is not a usable sub-recipe.
    #[error("Ingredient {0} is not a sub-recipe with a composition")]
    NotASubRecipe(String),

    /// Transfer whose source and destination are the same branch.
    #[error("Transfer source and destination are both branch {0}")]
    SameBranchTransfer(String),

    /// Purchase or transfer applied to stock already.
    #[error("Document {0} has already been received")]
    AlreadyReceived(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidOrderStatus error.
    pub fn invalid_status(
        order_id: impl Into<String>,
        status: OrderStatus,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidOrderStatus {
            order_id: order_id.into(),
            status,
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// The UI validates first; these are the second line so that malformed
/// input never reaches a transaction.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid time).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
