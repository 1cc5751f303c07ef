//! # Deduction Planning
//!
//! Turns a frozen order into the per-ingredient stock deductions applied at
//! settlement.
//!
//! ## Plan Building
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each non-custom item                                               │
//! │     recipe lines (minus exclusions)  ─┐                                 │
//! │     modifier recipe lines            ─┼─► resolve to order branch       │
//! │     ITEM packaging rules             ─┘        │                        │
//! │  once per order                                ▼                        │
//! │     ORDER packaging rules ───────────► deductions[resolved] += qty      │
//! │                                                                         │
//! │  Two items sharing "Mozzarella" produce ONE entry: 100×q1 + 50×q2.      │
//! │  Fallbacks are recorded in `misses`; the deduction still targets the    │
//! │  reference id.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{ApplyPer, PackagingRule, Product};
use crate::money::Money;
use crate::order::{Order, OrderItem};
use crate::resolver::{IngredientResolver, Resolution};
use crate::types::RecipeLine;

/// Where a deduction line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeductionSource {
    Recipe,
    Modifier,
    Packaging,
}

/// A reference ingredient that found no name match in the order's branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMiss {
    pub reference_id: String,
    pub branch_id: String,
    pub source: DeductionSource,
}

/// Aggregated deductions for one order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionPlan {
    /// Resolved ingredient id to usage units to deduct.
    pub deductions: BTreeMap<String, Decimal>,
    pub misses: Vec<ResolutionMiss>,
    /// Products of non-custom items that are no longer in the catalog.
    pub missing_products: Vec<String>,
    /// Cost of the packaging consumed, at branch-local cost.
    pub packaging_cost: Money,
}

impl DeductionPlan {
    pub fn is_empty(&self) -> bool {
        self.deductions.is_empty()
    }

    /// Quantity planned for one ingredient.
    pub fn quantity_for(&self, ingredient_id: &str) -> Decimal {
        self.deductions
            .get(ingredient_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

struct PlanBuilder<'a, R: IngredientResolver + ?Sized> {
    resolver: &'a R,
    branch_id: &'a str,
    plan: DeductionPlan,
    packaging_cost: Decimal,
}

impl<'a, R: IngredientResolver + ?Sized> PlanBuilder<'a, R> {
    fn add(&mut self, line: &RecipeLine, multiplier: Decimal, source: DeductionSource) -> String {
        let resolution = self.resolver.resolve(&line.ingredient_id, self.branch_id);
        if let Resolution::Fallback(_) = &resolution {
            self.plan.misses.push(ResolutionMiss {
                reference_id: line.ingredient_id.clone(),
                branch_id: self.branch_id.to_string(),
                source,
            });
        }
        let id = resolution.into_id();
        let qty = line.quantity * multiplier;
        *self.plan.deductions.entry(id.clone()).or_insert(Decimal::ZERO) += qty;
        id
    }

    fn add_packaging(&mut self, line: &RecipeLine, multiplier: Decimal) {
        let id = self.add(line, multiplier, DeductionSource::Packaging);
        if let Some(ingredient) = self.resolver.ingredient(&id) {
            self.packaging_cost += ingredient.cost * line.quantity * multiplier;
        }
    }
}

/// Builds the deduction plan for `order` against its own branch.
///
/// Custom items consume nothing, including ITEM packaging. ORDER packaging
/// rules apply once when any item matches (a rule with no filter always
/// applies).
pub fn plan_deductions<R>(
    order: &Order,
    products: &HashMap<String, Product>,
    packaging_rules: &[PackagingRule],
    resolver: &R,
) -> DeductionPlan
where
    R: IngredientResolver + ?Sized,
{
    let mut builder = PlanBuilder {
        resolver,
        branch_id: &order.branch_id,
        plan: DeductionPlan::default(),
        packaging_cost: Decimal::ZERO,
    };

    let rules: Vec<&PackagingRule> = packaging_rules
        .iter()
        .filter(|r| r.applies_to(order.order_type))
        .collect();

    for item in order.items.iter().filter(|i| !i.is_custom) {
        let qty = Decimal::from(item.quantity);

        match item.product_id.as_ref().and_then(|id| products.get(id)) {
            Some(product) => {
                for line in product.ingredients.iter().filter(|l| !item.excludes(&l.ingredient_id)) {
                    builder.add(line, qty, DeductionSource::Recipe);
                }
            }
            None => builder
                .plan
                .missing_products
                .push(item.product_id.clone().unwrap_or_default()),
        }

        for line in item.modifiers.iter().flat_map(|m| m.recipe.iter()) {
            builder.add(line, qty, DeductionSource::Modifier);
        }

        for rule in rules.iter().filter(|r| r.apply_per == ApplyPer::Item) {
            if item_matches(rule, item) {
                for line in &rule.items {
                    builder.add_packaging(line, qty);
                }
            }
        }
    }

    for rule in rules.iter().filter(|r| r.apply_per == ApplyPer::Order) {
        let applies = rule.is_global() || order.items.iter().any(|i| item_matches(rule, i));
        if applies {
            for line in &rule.items {
                builder.add_packaging(line, Decimal::ONE);
            }
        }
    }

    let mut plan = builder.plan;
    plan.packaging_cost = Money::from_decimal(builder.packaging_cost);
    plan
}

fn item_matches(rule: &PackagingRule, item: &OrderItem) -> bool {
    match item.product_id.as_deref() {
        Some(product_id) => rule.matches(product_id, item.category.as_deref()),
        None => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Ingredient;
    use crate::order::SelectedModifier;
    use crate::resolver::NameResolver;
    use crate::types::OrderType;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn resolver() -> NameResolver {
        let mut box_b1 = Ingredient::new("box-b1", "b1", "Pizza Box", "pc");
        box_b1.cost = dec!(0.80);
        let mut bag_b1 = Ingredient::new("bag-b1", "b1", "Bag", "pc");
        bag_b1.cost = dec!(0.10);
        NameResolver::new(vec![
            // reference rows live in the central branch
            Ingredient::new("cheese-hq", "hq", "Mozzarella", "g"),
            Ingredient::new("basil-hq", "hq", "Basil", "g"),
            Ingredient::new("bacon-hq", "hq", "Bacon", "g"),
            Ingredient::new("cheese-b1", "b1", "mozzarella", "g"),
            Ingredient::new("bacon-b1", "b1", "BACON", "g"),
            box_b1,
            bag_b1,
        ])
    }

    fn product(id: &str, category: &str, recipe: Vec<RecipeLine>) -> Product {
        Product {
            id: id.into(),
            name: id.into(),
            category: category.into(),
            prices: [(OrderType::Takeout, Money::from_cents(1000))].into_iter().collect(),
            ingredients: recipe,
            modifier_group_ids: vec![],
            is_active: true,
        }
    }

    fn products() -> HashMap<String, Product> {
        let mut map = HashMap::new();
        map.insert(
            "pizza".to_string(),
            product(
                "pizza",
                "pizzas",
                vec![
                    RecipeLine::new("cheese-hq", dec!(100)),
                    RecipeLine::new("basil-hq", dec!(5)),
                ],
            ),
        );
        map.insert(
            "calzone".to_string(),
            product("calzone", "pizzas", vec![RecipeLine::new("cheese-hq", dec!(50))]),
        );
        map.insert("soda".to_string(), product("soda", "drinks", vec![]));
        map
    }

    fn item(product_id: &str, category: &str, qty: i64) -> OrderItem {
        OrderItem {
            id: format!("item-{product_id}"),
            product_id: Some(product_id.into()),
            name: product_id.into(),
            category: Some(category.into()),
            quantity: qty,
            price: Money::from_cents(1000),
            modifiers: vec![],
            excluded_ingredient_ids: vec![],
            cost_snapshot: Money::zero(),
            printed: true,
            is_custom: false,
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        let mut o = Order::new("o1", "b1", OrderType::Takeout, Utc::now());
        o.items = items;
        o
    }

    fn rule(apply_per: ApplyPer, categories: &[&str], line: RecipeLine) -> PackagingRule {
        PackagingRule {
            id: format!("rule-{}", line.ingredient_id),
            name: "rule".into(),
            order_types: vec![OrderType::Takeout],
            category_ids: categories.iter().map(|c| c.to_string()).collect(),
            product_ids: vec![],
            apply_per,
            items: vec![line],
        }
    }

    #[test]
    fn test_shared_ingredient_is_aggregated() {
        let o = order(vec![item("pizza", "pizzas", 2), item("calzone", "pizzas", 3)]);
        let plan = plan_deductions(&o, &products(), &[], &resolver());

        assert_eq!(plan.quantity_for("cheese-b1"), dec!(350));
        assert_eq!(plan.deductions.len(), 2);
    }

    #[test]
    fn test_fallback_is_recorded_as_miss() {
        let o = order(vec![item("pizza", "pizzas", 1)]);
        let plan = plan_deductions(&o, &products(), &[], &resolver());

        // branch b1 stocks no basil
        assert_eq!(plan.quantity_for("basil-hq"), dec!(5));
        assert_eq!(plan.misses.len(), 1);
        assert_eq!(plan.misses[0].reference_id, "basil-hq");
        assert_eq!(plan.misses[0].source, DeductionSource::Recipe);
    }

    #[test]
    fn test_exclusions_and_modifiers() {
        let mut pizza = item("pizza", "pizzas", 2);
        pizza.excluded_ingredient_ids = vec!["basil-hq".into()];
        pizza.modifiers = vec![SelectedModifier {
            group_id: "extras".into(),
            option_id: "bacon".into(),
            name: "Bacon".into(),
            price: Money::from_cents(150),
            recipe: vec![RecipeLine::new("bacon-hq", dec!(30))],
        }];
        let plan = plan_deductions(&order(vec![pizza]), &products(), &[], &resolver());

        assert_eq!(plan.quantity_for("basil-hq"), Decimal::ZERO);
        assert_eq!(plan.quantity_for("bacon-b1"), dec!(60));
        assert!(plan.misses.is_empty());
    }

    #[test]
    fn test_custom_items_consume_nothing() {
        let mut custom = item("soda", "drinks", 4);
        custom.product_id = None;
        custom.is_custom = true;
        let rules = vec![rule(ApplyPer::Item, &[], RecipeLine::new("bag-b1", dec!(1)))];
        let plan = plan_deductions(&order(vec![custom]), &products(), &rules, &resolver());
        assert!(plan.is_empty());
        assert_eq!(plan.packaging_cost, Money::zero());
    }

    #[test]
    fn test_item_and_order_packaging() {
        let o = order(vec![item("pizza", "pizzas", 2), item("soda", "drinks", 1)]);
        let rules = vec![
            rule(ApplyPer::Item, &["pizzas"], RecipeLine::new("box-b1", dec!(1))),
            rule(ApplyPer::Order, &["drinks"], RecipeLine::new("bag-b1", dec!(1))),
        ];
        let plan = plan_deductions(&o, &products(), &rules, &resolver());

        assert_eq!(plan.quantity_for("box-b1"), dec!(2));
        assert_eq!(plan.quantity_for("bag-b1"), dec!(1));
        // 2 × 0.80 + 1 × 0.10
        assert_eq!(plan.packaging_cost.cents(), 170);
    }

    #[test]
    fn test_packaging_ignores_other_channels() {
        let mut o = order(vec![item("pizza", "pizzas", 1)]);
        o.order_type = OrderType::DineIn;
        let rules = vec![rule(ApplyPer::Order, &[], RecipeLine::new("bag-b1", dec!(1)))];
        let plan = plan_deductions(&o, &products(), &rules, &resolver());
        assert_eq!(plan.quantity_for("bag-b1"), Decimal::ZERO);
    }

    #[test]
    fn test_missing_product_is_reported() {
        let o = order(vec![item("lasagna", "pasta", 1)]);
        let plan = plan_deductions(&o, &products(), &[], &resolver());
        assert_eq!(plan.missing_products, vec!["lasagna".to_string()]);
    }

    #[test]
    fn test_global_order_rule_applies_to_custom_only_and_empty_orders() {
        let bag = rule(ApplyPer::Order, &[], RecipeLine::new("bag-b1", dec!(1)));
        let boxes = rule(ApplyPer::Item, &[], RecipeLine::new("box-b1", dec!(1)));
        let filtered = rule(ApplyPer::Order, &["pizzas"], RecipeLine::new("box-b1", dec!(1)));
        let rules = [bag, boxes, filtered];

        let mut candle = item("candle", "misc", 2);
        candle.product_id = None;
        candle.category = None;
        candle.is_custom = true;
        let custom_only = plan_deductions(&order(vec![candle]), &products(), &rules, &resolver());
        assert_eq!(custom_only.quantity_for("bag-b1"), dec!(1));
        assert_eq!(custom_only.quantity_for("box-b1"), dec!(0));
        assert_eq!(custom_only.packaging_cost, Money::from_cents(10));

        let empty = plan_deductions(&order(vec![]), &products(), &rules, &resolver());
        assert_eq!(empty.quantity_for("bag-b1"), dec!(1));
        assert_eq!(empty.quantity_for("box-b1"), dec!(0));
    }
}
