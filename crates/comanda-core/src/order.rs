//! # Order Types
//!
//! The mutable transaction record and its line items, plus the table
//! occupancy record and the pending/confirmed order reference.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open (empty) ──► add/remove/qty/discount ──► send to kitchen           │
//! │       │                 ▲        │                 │                    │
//! │       │                 └────────┘                 ▼                    │
//! │       │                                      COOKING ──► close ──► PAID │
//! │       │                                         │                       │
//! │       └───────────────── void ──────────────────┴──────────────► VOID   │
//! │                                                                         │
//! │  Totals are never written directly: every mutation ends with           │
//! │  `recompute_totals()`.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::DiscountKind;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::totals::{compute_totals, Totals};
use crate::types::{OrderStatus, OrderType, PaymentEntry, RecipeLine};

// =============================================================================
// Order Item
// =============================================================================

/// A modifier option frozen onto a line item at add-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SelectedModifier {
    pub group_id: String,
    pub option_id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub recipe: Vec<RecipeLine>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    /// `None` for custom items.
    pub product_id: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    /// Unit price, modifier deltas included.
    pub price: Money,
    #[serde(default)]
    pub modifiers: Vec<SelectedModifier>,
    /// Base-recipe ingredients the guest asked to leave out.
    #[serde(default)]
    pub excluded_ingredient_ids: Vec<String>,
    /// Ingredient cost of one unit at add-time, for margin reporting.
    pub cost_snapshot: Money,
    #[serde(default)]
    pub printed: bool,
    #[serde(default)]
    pub is_custom: bool,
}

impl OrderItem {
    /// `price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }

    /// Whether a base-recipe ingredient was excluded.
    pub fn excludes(&self, ingredient_id: &str) -> bool {
        self.excluded_ingredient_ids.iter().any(|id| id == ingredient_id)
    }
}

// =============================================================================
// Applied Discount
// =============================================================================

/// Snapshot of a discount as applied to one order.
///
/// `name` carries the authorizer when the discount was applied with an
/// override, e.g. `"Happy Hour (auth: Ana)"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub discount_id: String,
    pub name: String,
    pub kind: DiscountKind,
    #[ts(as = "String")]
    pub value: Decimal,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

// =============================================================================
// Order
// =============================================================================

/// The order document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub branch_id: String,
    pub table_id: Option<String>,
    pub customer_id: Option<String>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub applied_discount: Option<AppliedDiscount>,
    #[serde(default)]
    pub is_courtesy: bool,
    pub service_charge: Money,
    pub tip: Money,
    pub total: Money,
    #[serde(default)]
    pub payment_methods: Vec<PaymentEntry>,
    /// Cost of the packaging consumed at settlement.
    #[serde(default)]
    pub packaging_cost_snapshot: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates an empty OPEN order.
    pub fn new(
        id: impl Into<String>,
        branch_id: impl Into<String>,
        order_type: OrderType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Order {
            id: id.into(),
            branch_id: branch_id.into(),
            table_id: None,
            customer_id: None,
            order_type,
            status: OrderStatus::Open,
            items: Vec::new(),
            subtotal: Money::zero(),
            discount_amount: Money::zero(),
            applied_discount: None,
            is_courtesy: false,
            service_charge: Money::zero(),
            tip: Money::zero(),
            total: Money::zero(),
            payment_methods: Vec::new(),
            packaging_cost_snapshot: Money::zero(),
            created_at,
            closed_at: None,
        }
    }

    /// Sets the table.
    pub fn with_table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    /// Sets the customer.
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Fails unless items can still be mutated.
    pub fn ensure_mutable(&self, operation: &str) -> CoreResult<()> {
        if self.status.is_mutable() {
            Ok(())
        } else {
            Err(CoreError::invalid_status(&self.id, self.status, operation))
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub(crate) fn item_index(&self, item_id: &str) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound {
                order_id: self.id.clone(),
                item_id: item_id.to_string(),
            })
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Items not yet sent to the kitchen.
    pub fn unprinted_items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|i| !i.printed)
    }

    /// Recomputes `subtotal`, `discount_amount` and `total` from the items.
    pub fn recompute_totals(&mut self) -> Totals {
        let totals = compute_totals(self, &self.items);
        self.subtotal = totals.subtotal;
        self.discount_amount = totals.discount_amount;
        self.total = totals.total;
        totals
    }
}

// =============================================================================
// Table
// =============================================================================

/// A dine-in table and the orders currently seated at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    #[serde(default)]
    pub order_ids: Vec<String>,
    #[serde(default)]
    pub is_occupied: bool,
}

impl Table {
    pub fn new(id: impl Into<String>, branch_id: impl Into<String>, name: impl Into<String>) -> Self {
        Table {
            id: id.into(),
            branch_id: branch_id.into(),
            name: name.into(),
            order_ids: Vec::new(),
            is_occupied: false,
        }
    }

    /// Adds an order to the table. Idempotent.
    pub fn occupy(&mut self, order_id: &str) {
        if !self.order_ids.iter().any(|id| id == order_id) {
            self.order_ids.push(order_id.to_string());
        }
        self.is_occupied = true;
    }

    /// Removes an order; the table is free once no order is left.
    pub fn release(&mut self, order_id: &str) {
        self.order_ids.retain(|id| id != order_id);
        self.is_occupied = !self.order_ids.is_empty();
    }
}

// =============================================================================
// Order Reference
// =============================================================================

/// An order as the UI holds it: either a local draft not yet accepted by the
/// store, or a stored order.
///
/// Only confirmed orders can be settled, split or merged.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderRef {
    Pending(Order),
    Confirmed(Order),
}

impl OrderRef {
    pub fn id(&self) -> &str {
        &self.order().id
    }

    pub fn order(&self) -> &Order {
        match self {
            OrderRef::Pending(o) | OrderRef::Confirmed(o) => o,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, OrderRef::Confirmed(_))
    }

    /// The stored order, or `OrderNotConfirmed` for a draft.
    pub fn confirmed(&self) -> CoreResult<&Order> {
        match self {
            OrderRef::Confirmed(o) => Ok(o),
            OrderRef::Pending(o) => Err(CoreError::OrderNotConfirmed(o.id.clone())),
        }
    }

    pub fn into_confirmed(self) -> CoreResult<Order> {
        match self {
            OrderRef::Confirmed(o) => Ok(o),
            OrderRef::Pending(o) => Err(CoreError::OrderNotConfirmed(o.id)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new("ord-1", "b1", OrderType::DineIn, Utc::now()).with_table("t1")
    }

    #[test]
    fn test_new_order_is_open_and_empty() {
        let o = order();
        assert_eq!(o.status, OrderStatus::Open);
        assert!(o.items.is_empty());
        assert_eq!(o.total, Money::zero());
        assert_eq!(o.table_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_ensure_mutable_rejects_terminal() {
        let mut o = order();
        assert!(o.ensure_mutable("add items").is_ok());
        o.status = OrderStatus::Void;
        let err = o.ensure_mutable("add items").unwrap_err();
        assert!(matches!(err, CoreError::InvalidOrderStatus { .. }));
    }

    #[test]
    fn test_table_occupancy_follows_orders() {
        let mut t = Table::new("t1", "b1", "Mesa 1");
        t.occupy("o1");
        t.occupy("o1");
        t.occupy("o2");
        assert_eq!(t.order_ids.len(), 2);
        t.release("o1");
        assert!(t.is_occupied);
        t.release("o2");
        assert!(!t.is_occupied);
    }

    #[test]
    fn test_pending_ref_cannot_be_used_as_confirmed() {
        let pending = OrderRef::Pending(order());
        assert!(!pending.is_confirmed());
        assert!(matches!(
            pending.confirmed(),
            Err(CoreError::OrderNotConfirmed(_))
        ));

        let confirmed = OrderRef::Confirmed(order());
        assert_eq!(confirmed.confirmed().unwrap().id, "ord-1");
    }
}
