//! # comanda-core: Pure Business Logic for Comanda
//!
//! The order & inventory rules of the restaurant POS as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI (presentational)                          │   │
//! │  │    Tables ──► Order ──► Kitchen ──► Checkout ──► Inventory      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               comanda-engine (services)                          │   │
//! │  │    OrderService, SettlementService, ProductionService, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comanda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ catalog  │ │  order   │ │  totals  │ │ resolver │          │   │
//! │  │   │ mutation │ │deduction │ │ costing  │ │ customer │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                comanda-db (document store)                      │   │
//! │  │         SQLite collections, transactions, print queue           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Shared enums and small value types
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Ingredients, products, modifiers, packaging, discounts
//! - [`order`] - Orders, line items, tables, pending/confirmed references
//! - [`totals`] - Pricing & totals calculator
//! - [`mutation`] - Order operations (add, split, merge, discount, ...)
//! - [`resolver`] - Cross-branch ingredient resolution
//! - [`deduction`] - Settlement deduction planning
//! - [`costing`] - Weighted-average costing and production plans
//! - [`customer`] / [`settings`] - Loyalty accrual and business settings
//! - [`inventory`] - Purchase and transfer documents
//! - [`print`] - Print job descriptors
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::{Money, Order, OrderType};
//! use chrono::Utc;
//!
//! let mut order = Order::new("o-1", "branch-1", OrderType::DineIn, Utc::now());
//! order.add_custom_item("Corkage", Money::from_cents(500)).unwrap();
//! assert_eq!(order.total.cents(), 500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod costing;
pub mod customer;
pub mod deduction;
pub mod error;
pub mod inventory;
pub mod money;
pub mod mutation;
pub mod order;
pub mod print;
pub mod resolver;
pub mod settings;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{
    ApplyPer, Discount, DiscountKind, DiscountSchedule, Ingredient, ModifierGroup,
    ModifierOption, PackagingRule, Product,
};
pub use costing::{plan_batch, weighted_average, BatchPlan};
pub use customer::Customer;
pub use deduction::{plan_deductions, DeductionPlan, ResolutionMiss};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{Purchase, PurchaseLine, ReceiptStatus, Transfer, TransferLine};
pub use money::Money;
pub use order::{AppliedDiscount, Order, OrderItem, OrderRef, SelectedModifier, Table};
pub use print::{PrintJob, PrintJobType};
pub use resolver::{IngredientLookup, IngredientResolver, NameResolver, Resolution};
pub use settings::{LoyaltyTier, Settings};
pub use totals::{compute_totals, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line.
///
/// Catches slips like typing 100 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum lines on one order.
pub const MAX_ORDER_ITEMS: usize = 200;

/// Maximum length of a display name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Largest FIXED discount, in major currency units.
pub const MAX_FIXED_DISCOUNT: i64 = 1_000_000;
