//! # Pricing & Totals Calculator
//!
//! Pure computation of `subtotal`, `discount_amount` and `total`.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ item.price × item.quantity                                │
//! │                                                                         │
//! │  courtesy?  ──yes──► discount = subtotal, total = 0                     │
//! │      │                                                                  │
//! │      no                                                                 │
//! │      ▼                                                                  │
//! │  discount = PERCENTAGE  subtotal × value / 100                          │
//! │             FIXED       value            (may exceed subtotal)          │
//! │             BOGO        Σ floor(qty / 2) × price   (matching items)     │
//! │             none        0                                               │
//! │                                                                         │
//! │  total = max(0, subtotal − discount) + service_charge                   │
//! │                                                                         │
//! │  Tip is recorded on the order but is not part of the total.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::DiscountKind;
use crate::money::Money;
use crate::order::{AppliedDiscount, Order, OrderItem};

/// Output of the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
}

/// Totals for `items` under the order's discount, courtesy and service
/// charge. The order's own `items` field is ignored, so callers can price a
/// candidate item list.
pub fn compute_totals(order: &Order, items: &[OrderItem]) -> Totals {
    compute(
        items,
        order.applied_discount.as_ref(),
        order.is_courtesy,
        order.service_charge,
    )
}

/// The calculator proper.
pub fn compute(
    items: &[OrderItem],
    discount: Option<&AppliedDiscount>,
    is_courtesy: bool,
    service_charge: Money,
) -> Totals {
    let subtotal: Money = items.iter().map(OrderItem::line_total).sum();

    if is_courtesy {
        return Totals {
            subtotal,
            discount_amount: subtotal,
            total: Money::zero(),
        };
    }

    let discount_amount = discount
        .map(|d| discount_amount(d, items, subtotal))
        .unwrap_or_default();

    Totals {
        subtotal,
        discount_amount,
        total: (subtotal - discount_amount).non_negative() + service_charge,
    }
}

fn discount_amount(discount: &AppliedDiscount, items: &[OrderItem], subtotal: Money) -> Money {
    match discount.kind {
        DiscountKind::Percentage => subtotal.percentage(discount.value),
        DiscountKind::Fixed => Money::from_decimal(discount.value),
        DiscountKind::Bogo => items
            .iter()
            .filter(|item| bogo_applies(discount, item))
            .map(|item| item.price * (item.quantity / 2))
            .sum(),
    }
}

fn bogo_applies(discount: &AppliedDiscount, item: &OrderItem) -> bool {
    if discount.category_ids.is_empty() {
        return true;
    }
    item.category
        .as_deref()
        .map(|c| discount.category_ids.iter().any(|id| id == c))
        .unwrap_or(false)
}

// =============================================================================
// Unit Tests
// =============================================================================
