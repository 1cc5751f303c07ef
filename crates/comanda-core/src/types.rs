//! # Shared Domain Types
//!
//! Small value types used by the catalog, order and settlement modules.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shared Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderType     │   │   OrderStatus   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  DineIn         │   │  Open           │   │  Cash           │       │
//! │  │  Takeout        │   │  Cooking        │   │  Card           │       │
//! │  │  Delivery       │   │  Paid  (final)  │   │  BankTransfer   │       │
//! │  └─────────────────┘   │  Void  (final)  │   │  Platform       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   RecipeLine    │   │ Operator / Role │                             │
//! │  │  ingredient_id  │   │  name, role     │                             │
//! │  │  quantity (dec) │   │  elevated?      │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Order Type (sales channel)
// =============================================================================

/// The channel an order was taken on. Prices and packaging rules are keyed
/// by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Served at a table.
    DineIn,
    /// Picked up at the counter.
    Takeout,
    /// Delivered through a delivery platform.
    Delivery,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::DineIn => write!(f, "DINE_IN"),
            OrderType::Takeout => write!(f, "TAKEOUT"),
            OrderType::Delivery => write!(f, "DELIVERY"),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ```text
///   OPEN ──send to kitchen──► COOKING ──settle──► PAID
///     │                          │
///     └──────────void────────────┴──────────────► VOID
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Items being added.
    Open,
    /// At least one round has been sent to the kitchen.
    Cooking,
    /// Settled. Terminal.
    Paid,
    /// Cancelled before settlement. Terminal.
    Void,
}

impl OrderStatus {
    /// PAID and VOID accept no further transitions.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Void)
    }

    /// Items may be mutated only while the order is live.
    #[inline]
    pub const fn is_mutable(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::Cooking)
    }

    /// Column value used by the document store.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Cooking => "COOKING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Void => "VOID",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How (part of) an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Bank transfer / QR payment.
    BankTransfer,
    /// Paid through the delivery platform.
    Platform,
}

/// One tender applied to an order. Split tender produces several entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    pub method: PaymentMethod,
    pub amount: Money,
    /// External reference (card auth code, transfer id, ...).
    #[serde(default)]
    pub reference: Option<String>,
}

impl PaymentEntry {
    /// Creates a payment entry without reference.
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        PaymentEntry {
            method,
            amount,
            reference: None,
        }
    }
}

// =============================================================================
// Recipe Line
// =============================================================================

/// One ingredient usage: `quantity` usage units of `ingredient_id`.
///
/// Used by product recipes, modifier recipes, packaging rules and
/// sub-recipe compositions alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLine {
    pub ingredient_id: String,
    #[ts(as = "String")]
    pub quantity: Decimal,
}

impl RecipeLine {
    /// Creates a recipe line.
    pub fn new(ingredient_id: impl Into<String>, quantity: Decimal) -> Self {
        RecipeLine {
            ingredient_id: ingredient_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Operator
// =============================================================================

/// Staff roles, as far as the engine cares about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Waiter,
    Cashier,
    Manager,
    Admin,
}

impl Role {
    /// Manager and Admin may authorize courtesies and off-schedule discounts.
    #[inline]
    pub const fn is_elevated(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// The staff member performing an operation.
///
/// Authentication happens upstream; the engine only checks the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub name: String,
    pub role: Role,
}

impl Operator {
    /// Creates an operator.
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Operator {
            name: name.into(),
            role,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Open);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Void.is_terminal());
        assert!(!OrderStatus::Cooking.is_terminal());
        assert!(OrderStatus::Cooking.is_mutable());
        assert!(!OrderStatus::Paid.is_mutable());
    }

    #[test]
    fn test_order_status_serializes_uppercase() {
        let json = serde_json::to_string(&OrderStatus::Cooking).unwrap();
        assert_eq!(json, "\"COOKING\"");
        let json = serde_json::to_string(&OrderType::DineIn).unwrap();
        assert_eq!(json, "\"DINE_IN\"");
    }

    #[test]
    fn test_elevated_roles() {
        assert!(Role::Manager.is_elevated());
        assert!(Role::Admin.is_elevated());
        assert!(!Role::Waiter.is_elevated());
        assert!(!Role::Cashier.is_elevated());
    }
}
