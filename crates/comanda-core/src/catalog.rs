//! # Catalog Types
//!
//! Branch-scoped ingredients and the global catalog (products, modifiers,
//! packaging rules, discounts).
//!
//! ## Scoping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalog Store                                   │
//! │                                                                         │
//! │  GLOBAL (shared by every branch)        PER BRANCH                      │
//! │  ──────────────────────────────         ──────────────────────────      │
//! │  Product ──recipe──┐                    Ingredient (branch A)           │
//! │  ModifierOption ───┼──► RecipeLine ───► "mozzarella"  5000 g            │
//! │  PackagingRule ────┘    (reference id)                                  │
//! │  Discount                               Ingredient (branch B)           │
//! │                                         "Mozzarella " 1200 g            │
//! │                                                                         │
//! │  A recipe line points at SOME ingredient row. The row that is actually │
//! │  deducted is found by normalized name in the selling branch.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDateTime, NaiveTime, Datelike, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::resolver::normalize_name;
use crate::types::{OrderType, RecipeLine};

// =============================================================================
// Ingredient
// =============================================================================

/// A branch-scoped stock unit.
///
/// `stock` and `cost` are expressed in usage units (grams, millilitres,
/// pieces). `conversion_ratio` converts one purchase unit into usage units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub usage_unit: String,
    pub purchase_unit: String,
    #[ts(as = "String")]
    pub conversion_ratio: Decimal,
    /// Weighted-average cost per usage unit.
    #[ts(as = "String")]
    pub cost: Decimal,
    /// Current stock in usage units. May be negative after racing sales.
    #[ts(as = "String")]
    pub stock: Decimal,
    #[ts(as = "String")]
    pub min_stock: Decimal,
    #[serde(default)]
    pub is_sub_recipe: bool,
    /// Raw inputs for one batch of a sub-recipe.
    #[serde(default)]
    pub composition: Vec<RecipeLine>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub batch_size: Option<Decimal>,
}

impl Ingredient {
    /// Creates a raw ingredient with zero stock and cost.
    pub fn new(
        id: impl Into<String>,
        branch_id: impl Into<String>,
        name: impl Into<String>,
        usage_unit: impl Into<String>,
    ) -> Self {
        let usage_unit = usage_unit.into();
        Ingredient {
            id: id.into(),
            branch_id: branch_id.into(),
            name: name.into(),
            purchase_unit: usage_unit.clone(),
            usage_unit,
            conversion_ratio: Decimal::ONE,
            cost: Decimal::ZERO,
            stock: Decimal::ZERO,
            min_stock: Decimal::ZERO,
            is_sub_recipe: false,
            composition: Vec::new(),
            batch_size: None,
        }
    }

    /// Name key used for cross-branch resolution.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// A sub-recipe can be produced only when it has a composition.
    pub fn is_producible(&self) -> bool {
        self.is_sub_recipe && !self.composition.is_empty()
    }

    /// Stock at or under the configured minimum.
    pub fn is_below_min(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Value of the stock on hand at the current average cost.
    pub fn stock_value(&self) -> Decimal {
        self.stock * self.cost
    }
}

// =============================================================================
// Product & Modifiers
// =============================================================================

/// A global menu entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Category id (used by BOGO discounts and packaging rules).
    pub category: String,
    /// Price per sales channel.
    pub prices: BTreeMap<OrderType, Money>,
    /// Base recipe. Ingredient ids reference rows of some branch.
    #[serde(default)]
    pub ingredients: Vec<RecipeLine>,
    #[serde(default)]
    pub modifier_group_ids: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// An active product with no prices or recipe yet.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            prices: BTreeMap::new(),
            ingredients: Vec::new(),
            modifier_group_ids: Vec::new(),
            is_active: true,
        }
    }

    /// Price for the order's channel, if the product is sold there.
    pub fn price_for(&self, order_type: OrderType) -> Option<Money> {
        self.prices.get(&order_type).copied()
    }
}

/// A named group of add-ons ("Extras", "Milk").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ModifierGroup {
    pub id: String,
    pub name: String,
    pub options: Vec<ModifierOption>,
}

impl ModifierGroup {
    /// Finds an option by id.
    pub fn option(&self, option_id: &str) -> Option<&ModifierOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// One add-on with its own price delta and ingredient usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ModifierOption {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub recipe: Vec<RecipeLine>,
}

// =============================================================================
// Packaging Rules
// =============================================================================

/// Whether a packaging rule is applied once per order or per line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplyPer {
    Order,
    Item,
}

/// Consumables (boxes, bags, cutlery) used when selling on a channel.
///
/// Applicability to an item, most specific first:
/// 1. `product_ids` non-empty: the product must be listed
/// 2. `category_ids` non-empty: the category must be listed
/// 3. neither: the rule is global
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackagingRule {
    pub id: String,
    pub name: String,
    pub order_types: Vec<OrderType>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
    pub apply_per: ApplyPer,
    pub items: Vec<RecipeLine>,
}

impl PackagingRule {
    /// Whether the rule applies to the order's channel at all.
    pub fn applies_to(&self, order_type: OrderType) -> bool {
        self.order_types.contains(&order_type)
    }

    /// Whether the rule has no product or category restriction.
    pub fn is_global(&self) -> bool {
        self.product_ids.is_empty() && self.category_ids.is_empty()
    }

    /// Item-level predicate.
    pub fn matches(&self, product_id: &str, category: Option<&str>) -> bool {
        if !self.product_ids.is_empty() {
            return self.product_ids.iter().any(|p| p == product_id);
        }
        if !self.category_ids.is_empty() {
            return category
                .map(|c| self.category_ids.iter().any(|id| id == c))
                .unwrap_or(false);
        }
        true
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// Discount calculation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountKind {
    /// `value` percent of the subtotal.
    Percentage,
    /// `value` currency units off, not clamped.
    Fixed,
    /// Every second unit free within the target categories.
    Bogo,
}

/// Day/time window in which a discount may be applied without override.
///
/// An empty `days` list means every day. A window whose end is before its
/// start wraps midnight (22:00 to 02:00).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSchedule {
    #[serde(default)]
    #[ts(as = "Vec<String>")]
    pub days: Vec<Weekday>,
    #[ts(as = "Option<String>")]
    pub start_time: Option<NaiveTime>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<NaiveTime>,
}

impl DiscountSchedule {
    /// Whether `at` (local wall-clock time) falls inside the window.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        if !self.days.is_empty() && !self.days.contains(&at.weekday()) {
            return false;
        }
        let now = at.time();
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if start <= end => now >= start && now <= end,
            (Some(start), Some(end)) => now >= start || now <= end,
            (Some(start), None) => now >= start,
            (None, Some(end)) => now <= end,
            (None, None) => true,
        }
    }
}

/// A global discount definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: String,
    pub name: String,
    pub kind: DiscountKind,
    /// Percent for PERCENTAGE, major currency units for FIXED, unused for BOGO.
    #[ts(as = "String")]
    pub value: Decimal,
    /// Target categories for BOGO. Empty means all categories.
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub schedule: Option<DiscountSchedule>,
    /// Always needs an elevated operator, regardless of schedule.
    #[serde(default)]
    pub requires_authorization: bool,
}

impl Discount {
    /// Whether the discount may be applied at `at` without override.
    pub fn is_in_schedule(&self, at: NaiveDateTime) -> bool {
        self.schedule
            .as_ref()
            .map(|s| s.is_open_at(at))
            .unwrap_or(true)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        // 2024-01-01 is a Monday
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn rule(product_ids: &[&str], category_ids: &[&str]) -> PackagingRule {
        PackagingRule {
            id: "pk-1".into(),
            name: "Box".into(),
            order_types: vec![OrderType::Takeout],
            category_ids: category_ids.iter().map(|s| s.to_string()).collect(),
            product_ids: product_ids.iter().map(|s| s.to_string()).collect(),
            apply_per: ApplyPer::Item,
            items: vec![RecipeLine::new("box", dec!(1))],
        }
    }

    #[test]
    fn test_packaging_product_list_takes_precedence() {
        let r = rule(&["p-1"], &["pizza"]);
        assert!(r.matches("p-1", Some("drinks")));
        assert!(!r.matches("p-2", Some("pizza")));
    }

    #[test]
    fn test_packaging_category_and_global() {
        let r = rule(&[], &["pizza"]);
        assert!(r.matches("p-9", Some("pizza")));
        assert!(!r.matches("p-9", None));

        let global = rule(&[], &[]);
        assert!(global.is_global());
        assert!(global.matches("anything", None));
        assert!(!global.applies_to(OrderType::DineIn));
    }

    #[test]
    fn test_schedule_days_and_hours() {
        let s = DiscountSchedule {
            days: vec![Weekday::Mon, Weekday::Tue],
            start_time: NaiveTime::from_hms_opt(17, 0, 0),
            end_time: NaiveTime::from_hms_opt(19, 0, 0),
        };
        assert!(s.is_open_at(at(1, 18, 0)));
        assert!(!s.is_open_at(at(1, 20, 0)));
        assert!(!s.is_open_at(at(3, 18, 0)));
    }

    #[test]
    fn test_schedule_overnight_window() {
        let s = DiscountSchedule {
            days: vec![],
            start_time: NaiveTime::from_hms_opt(22, 0, 0),
            end_time: NaiveTime::from_hms_opt(2, 0, 0),
        };
        assert!(s.is_open_at(at(5, 23, 30)));
        assert!(s.is_open_at(at(5, 1, 0)));
        assert!(!s.is_open_at(at(5, 12, 0)));
    }

    #[test]
    fn test_ingredient_helpers() {
        let mut cheese = Ingredient::new("ing-1", "b1", "  Mozzarella ", "g");
        cheese.stock = dec!(100);
        cheese.cost = dec!(0.02);
        cheese.min_stock = dec!(500);

        assert_eq!(cheese.normalized_name(), "mozzarella");
        assert!(cheese.is_below_min());
        assert_eq!(cheese.stock_value(), dec!(2.00));
        assert!(!cheese.is_producible());
    }
}
