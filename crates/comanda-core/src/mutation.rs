//! # Order Mutations
//!
//! Pure operations on [`Order`] values. Each one validates first, mutates
//! second, and ends by recomputing totals, so a rejected call leaves the
//! order untouched. Persisting the resulting snapshot is the caller's job.
//!
//! ## Operations
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ add_item             │ price = channel price + Σ modifier deltas        │
//! │                      │ cost  = Σ reference recipe cost (non-excluded)   │
//! │ add_custom_item      │ free text, manual price, no recipe               │
//! │ change_quantity      │ ±delta, line removed at ≤ 0                      │
//! │ apply_discount       │ schedule check, override by elevated role        │
//! │ apply_courtesy       │ elevated role, clears discount, total = 0        │
//! │ move_to_table        │ table occupancy migrates with the order          │
//! │ merge_into           │ items move to target, source becomes VOID        │
//! │ split                │ moved quantities form a new order, same table    │
//! │ void                 │ VOID + release table; inventory untouched        │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::catalog::{Discount, ModifierGroup, Product};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::order::{AppliedDiscount, Order, OrderItem, SelectedModifier, Table};
use crate::resolver::IngredientLookup;
use crate::types::{OrderStatus, Operator, PaymentEntry, RecipeLine, Role};
use crate::validation::{
    validate_discount_value, validate_name, validate_order_size, validate_price_cents,
    validate_quantity,
};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Modifier Selection
// =============================================================================

impl ModifierGroup {
    /// Freezes one option of this group for a line item.
    pub fn select(&self, option_id: &str) -> CoreResult<SelectedModifier> {
        let option = self.option(option_id).ok_or_else(|| CoreError::ModifierNotFound {
            group_id: self.id.clone(),
            option_id: option_id.to_string(),
        })?;
        Ok(SelectedModifier {
            group_id: self.id.clone(),
            option_id: option.id.clone(),
            name: option.name.clone(),
            price: option.price,
            recipe: option.recipe.clone(),
        })
    }
}

/// Cost of a recipe at the given ingredients' current average cost.
///
/// Unknown ingredient ids contribute nothing.
pub fn recipe_cost<'a, L>(lines: impl IntoIterator<Item = &'a RecipeLine>, ingredients: &L) -> Decimal
where
    L: IngredientLookup + ?Sized,
{
    lines
        .into_iter()
        .filter_map(|line| {
            ingredients
                .ingredient(&line.ingredient_id)
                .map(|ing| ing.cost * line.quantity)
        })
        .sum()
}

// =============================================================================
// Item Operations
// =============================================================================

impl Order {
    /// Appends one unit of `product` as a new line and returns its id.
    ///
    /// The cost snapshot uses the reference ingredients' cost; branch
    /// resolution happens only at settlement.
    pub fn add_item<L>(
        &mut self,
        product: &Product,
        modifiers: Vec<SelectedModifier>,
        excluded_ingredient_ids: Vec<String>,
        ingredients: &L,
    ) -> CoreResult<String>
    where
        L: IngredientLookup + ?Sized,
    {
        self.ensure_mutable("add items")?;
        validate_order_size(self.items.len())?;
        let base = product
            .price_for(self.order_type)
            .ok_or_else(|| CoreError::MissingPrice {
                product: product.name.clone(),
                order_type: self.order_type.to_string(),
            })?;

        let price = base + modifiers.iter().map(|m| m.price).sum::<Money>();
        let base_recipe = product
            .ingredients
            .iter()
            .filter(|line| !excluded_ingredient_ids.contains(&line.ingredient_id));
        let modifier_recipe = modifiers.iter().flat_map(|m| m.recipe.iter());
        let cost = recipe_cost(base_recipe.chain(modifier_recipe), ingredients);

        let id = Uuid::new_v4().to_string();
        self.items.push(OrderItem {
            id: id.clone(),
            product_id: Some(product.id.clone()),
            name: product.name.clone(),
            category: Some(product.category.clone()),
            quantity: 1,
            price,
            modifiers,
            excluded_ingredient_ids,
            cost_snapshot: Money::from_decimal(cost),
            printed: false,
            is_custom: false,
        });
        self.recompute_totals();
        Ok(id)
    }

    /// Appends a free-text line with a manual price.
    pub fn add_custom_item(&mut self, name: &str, price: Money) -> CoreResult<String> {
        self.ensure_mutable("add items")?;
        validate_name("name", name)?;
        validate_price_cents(price.cents())?;
        validate_order_size(self.items.len())?;

        let id = Uuid::new_v4().to_string();
        self.items.push(OrderItem {
            id: id.clone(),
            product_id: None,
            name: name.trim().to_string(),
            category: None,
            quantity: 1,
            price,
            modifiers: Vec::new(),
            excluded_ingredient_ids: Vec::new(),
            cost_snapshot: Money::zero(),
            printed: false,
            is_custom: true,
        });
        self.recompute_totals();
        Ok(id)
    }

    /// Applies `delta` to a line's quantity. Returns the new quantity; at 0
    /// the line is removed.
    pub fn change_quantity(&mut self, item_id: &str, delta: i64) -> CoreResult<i64> {
        self.ensure_mutable("change quantities")?;
        let idx = self.item_index(item_id)?;
        let Some(quantity) = self.items[idx].quantity.checked_add(delta) else {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        };
        if quantity <= 0 {
            self.items.remove(idx);
            self.recompute_totals();
            return Ok(0);
        }
        validate_quantity(quantity)?;
        self.items[idx].quantity = quantity;
        self.recompute_totals();
        Ok(quantity)
    }

    /// Removes a line regardless of its quantity.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<OrderItem> {
        self.ensure_mutable("remove items")?;
        let idx = self.item_index(item_id)?;
        let item = self.items.remove(idx);
        self.recompute_totals();
        Ok(item)
    }

    /// Marks every unprinted line as printed and returns copies of them.
    ///
    /// Moves an OPEN order to COOKING when something was sent.
    pub fn send_unprinted(&mut self) -> CoreResult<Vec<OrderItem>> {
        self.ensure_mutable("send to kitchen")?;
        let mut sent = Vec::new();
        for item in self.items.iter_mut().filter(|i| !i.printed) {
            item.printed = true;
            sent.push(item.clone());
        }
        if !sent.is_empty() && self.status == OrderStatus::Open {
            self.status = OrderStatus::Cooking;
        }
        Ok(sent)
    }
}

// =============================================================================
// Discounts, Courtesy, Service Charge
// =============================================================================

impl Order {
    /// Applies a discount, checking its schedule against `at` (local time).
    ///
    /// Outside the window, or for discounts flagged as requiring
    /// authorization, the operator must hold an elevated role; the
    /// authorizer's name is then appended to the applied discount's name.
    /// Applying a discount ends a courtesy.
    pub fn apply_discount(
        &mut self,
        discount: &Discount,
        operator: &Operator,
        at: NaiveDateTime,
    ) -> CoreResult<()> {
        self.ensure_mutable("apply a discount")?;
        validate_discount_value(discount.kind, discount.value)?;

        let needs_override = discount.requires_authorization || !discount.is_in_schedule(at);
        if needs_override && !operator.role.is_elevated() {
            return Err(CoreError::AuthorizationRequired {
                action: format!("Discount '{}'", discount.name),
                required: Role::Manager,
                actual: operator.role,
            });
        }

        let name = if needs_override {
            format!("{} (auth: {})", discount.name, operator.name)
        } else {
            discount.name.clone()
        };
        self.applied_discount = Some(AppliedDiscount {
            discount_id: discount.id.clone(),
            name,
            kind: discount.kind,
            value: discount.value,
            category_ids: discount.category_ids.clone(),
        });
        self.is_courtesy = false;
        self.recompute_totals();
        Ok(())
    }

    /// Clears the applied discount.
    pub fn remove_discount(&mut self) -> CoreResult<()> {
        self.ensure_mutable("remove the discount")?;
        self.applied_discount = None;
        self.recompute_totals();
        Ok(())
    }

    /// Makes the whole order free. Requires an elevated role.
    pub fn apply_courtesy(&mut self, operator: &Operator) -> CoreResult<()> {
        self.ensure_mutable("apply a courtesy")?;
        if !operator.role.is_elevated() {
            return Err(CoreError::AuthorizationRequired {
                action: "Courtesy".to_string(),
                required: Role::Manager,
                actual: operator.role,
            });
        }
        self.applied_discount = None;
        self.is_courtesy = true;
        self.recompute_totals();
        Ok(())
    }

    pub fn set_service_charge(&mut self, amount: Money) -> CoreResult<()> {
        self.ensure_mutable("change the service charge")?;
        validate_price_cents(amount.cents())?;
        self.service_charge = amount;
        self.recompute_totals();
        Ok(())
    }
}

// =============================================================================
// Table, Merge, Split, Void, Pay
// =============================================================================

impl Order {
    /// Moves the order to `to`, migrating occupancy from `from`.
    pub fn move_to_table(&mut self, from: Option<&mut Table>, to: &mut Table) -> CoreResult<()> {
        self.ensure_mutable("move tables")?;
        if let Some(from) = from {
            from.release(&self.id);
        }
        to.occupy(&self.id);
        self.table_id = Some(to.id.clone());
        Ok(())
    }

    /// Moves every item of `source` into `self` and voids `source`.
    ///
    /// The target keeps its own discount; the source's discount is dropped.
    /// An incoming item whose id collides with a target item gets a new id.
    pub fn merge_from(&mut self, source: &mut Order, source_table: Option<&mut Table>) -> CoreResult<()> {
        if source.id == self.id {
            return Err(CoreError::SelfMerge(self.id.clone()));
        }
        self.ensure_mutable("receive merged items")?;
        source.ensure_mutable("be merged")?;

        let existing: HashSet<String> = self.items.iter().map(|i| i.id.clone()).collect();
        for mut item in std::mem::take(&mut source.items) {
            if existing.contains(&item.id) {
                item.id = Uuid::new_v4().to_string();
            }
            self.items.push(item);
        }
        self.recompute_totals();

        source.status = OrderStatus::Void;
        source.recompute_totals();
        if let Some(table) = source_table {
            table.release(&source.id);
        }
        Ok(())
    }

    /// Splits the given quantities off into a new order on the same table.
    ///
    /// `moves` maps item id to quantity to move. Zero entries are ignored;
    /// the split fails when nothing is left to move. Moved lines keep their
    /// item id. The new order starts without discount or courtesy.
    pub fn split(
        &mut self,
        moves: &BTreeMap<String, i64>,
        new_order_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Order> {
        self.ensure_mutable("split")?;

        for (item_id, qty) in moves {
            let idx = self.item_index(item_id)?;
            let available = self.items[idx].quantity;
            if *qty < 0 || *qty > available {
                return Err(ValidationError::OutOfRange {
                    field: format!("split quantity for {item_id}"),
                    min: 0,
                    max: available,
                }
                .into());
            }
        }
        if !moves.values().any(|q| *q > 0) {
            return Err(CoreError::NothingToSplit(self.id.clone()));
        }

        let mut new_order = Order::new(new_order_id, self.branch_id.clone(), self.order_type, created_at);
        new_order.table_id = self.table_id.clone();

        for item in self.items.iter_mut() {
            let moved = moves.get(&item.id).copied().unwrap_or(0);
            if moved > 0 {
                let mut copy = item.clone();
                copy.quantity = moved;
                new_order.items.push(copy);
                item.quantity -= moved;
            }
        }
        self.items.retain(|i| i.quantity > 0);

        self.recompute_totals();
        new_order.recompute_totals();
        Ok(new_order)
    }

    /// Cancels the order. No inventory is touched.
    pub fn void(&mut self, table: Option<&mut Table>) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::invalid_status(&self.id, self.status, "void"));
        }
        self.status = OrderStatus::Void;
        if let Some(table) = table {
            table.release(&self.id);
        }
        Ok(())
    }

    /// Freezes the order as PAID with its tenders and tip.
    pub fn mark_paid(
        &mut self,
        payments: Vec<PaymentEntry>,
        tip: Money,
        closed_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::invalid_status(&self.id, self.status, "close"));
        }
        if tip.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "tip".to_string(),
            }
            .into());
        }
        self.recompute_totals();
        self.status = OrderStatus::Paid;
        self.payment_methods = payments;
        self.tip = tip;
        self.closed_at = Some(closed_at);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DiscountKind, DiscountSchedule, Ingredient, ModifierOption};
    use crate::resolver::NameResolver;
    use crate::types::OrderType;
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use rust_decimal_macros::dec;

    fn catalog() -> NameResolver {
        let mut cheese = Ingredient::new("cheese", "b1", "Mozzarella", "g");
        cheese.cost = dec!(0.02);
        let mut dough = Ingredient::new("dough", "b1", "Dough", "g");
        dough.cost = dec!(0.005);
        let mut bacon = Ingredient::new("bacon", "b1", "Bacon", "g");
        bacon.cost = dec!(0.05);
        NameResolver::new(vec![cheese, dough, bacon])
    }

    fn margherita() -> Product {
        Product {
            id: "margherita".into(),
            name: "Margherita".into(),
            category: "pizza".into(),
            prices: [(OrderType::DineIn, Money::from_cents(1200))].into_iter().collect(),
            ingredients: vec![
                RecipeLine::new("cheese", dec!(200)),
                RecipeLine::new("dough", dec!(300)),
            ],
            modifier_group_ids: vec!["extras".into()],
            is_active: true,
        }
    }

    fn extras() -> ModifierGroup {
        ModifierGroup {
            id: "extras".into(),
            name: "Extras".into(),
            options: vec![ModifierOption {
                id: "bacon".into(),
                name: "Bacon".into(),
                price: Money::from_cents(150),
                recipe: vec![RecipeLine::new("bacon", dec!(30))],
            }],
        }
    }

    fn order() -> Order {
        Order::new("o1", "b1", OrderType::DineIn, Utc::now()).with_table("t1")
    }

    fn monday(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn happy_hour() -> Discount {
        Discount {
            id: "hh".into(),
            name: "Happy Hour".into(),
            kind: DiscountKind::Percentage,
            value: dec!(10),
            category_ids: vec![],
            schedule: Some(DiscountSchedule {
                days: vec![Weekday::Mon],
                start_time: NaiveTime::from_hms_opt(17, 0, 0),
                end_time: NaiveTime::from_hms_opt(19, 0, 0),
            }),
            requires_authorization: false,
        }
    }

    #[test]
    fn test_add_item_prices_and_costs() {
        let mut o = order();
        let bacon = extras().select("bacon").unwrap();
        let id = o.add_item(&margherita(), vec![bacon], vec![], &catalog()).unwrap();

        let item = o.item(&id).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price.cents(), 1350);
        // 200 × 0.02 + 300 × 0.005 + 30 × 0.05 = 4 + 1.5 + 1.5
        assert_eq!(item.cost_snapshot.cents(), 700);
        assert_eq!(o.total.cents(), 1350);
    }

    #[test]
    fn test_add_item_excluded_ingredient_not_costed() {
        let mut o = order();
        let id = o
            .add_item(&margherita(), vec![], vec!["cheese".into()], &catalog())
            .unwrap();
        assert_eq!(o.item(&id).unwrap().cost_snapshot.cents(), 150);
    }

    #[test]
    fn test_add_item_without_channel_price_fails() {
        let mut o = Order::new("o2", "b1", OrderType::Delivery, Utc::now());
        let err = o.add_item(&margherita(), vec![], vec![], &catalog()).unwrap_err();
        assert!(matches!(err, CoreError::MissingPrice { .. }));
        assert!(o.items.is_empty());
    }

    #[test]
    fn test_unknown_modifier_option() {
        assert!(matches!(
            extras().select("olives"),
            Err(CoreError::ModifierNotFound { .. })
        ));
    }

    #[test]
    fn test_change_quantity_removes_line_at_zero() {
        let mut o = order();
        let id = o.add_item(&margherita(), vec![], vec![], &catalog()).unwrap();
        assert_eq!(o.change_quantity(&id, 2).unwrap(), 3);
        assert_eq!(o.subtotal.cents(), 3600);
        assert_eq!(o.change_quantity(&id, -5).unwrap(), 0);
        assert!(o.items.is_empty());
        assert_eq!(o.total, Money::zero());
    }

    #[test]
    fn test_change_quantity_overflow_is_rejected() {
        let mut o = order();
        let id = o.add_item(&margherita(), vec![], vec![], &catalog()).unwrap();
        let err = o.change_quantity(&id, i64::MAX).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(o.change_quantity(&id, i64::MIN).is_err());
        assert_eq!(o.item(&id).unwrap().quantity, 1);
        assert_eq!(o.subtotal.cents(), 1200);
    }

    #[test]
    fn test_custom_item() {
        let mut o = order();
        let id = o.add_custom_item("Corkage", Money::from_cents(500)).unwrap();
        let item = o.item(&id).unwrap();
        assert!(item.is_custom);
        assert!(item.product_id.is_none());
        assert!(o.add_custom_item("  ", Money::from_cents(1)).is_err());
    }

    #[test]
    fn test_discount_inside_schedule_needs_no_override() {
        let mut o = order();
        o.add_custom_item("Set menu", Money::from_cents(10000)).unwrap();
        let waiter = Operator::new("Luis", Role::Waiter);
        o.apply_discount(&happy_hour(), &waiter, monday(18)).unwrap();
        assert_eq!(o.discount_amount.cents(), 1000);
        assert_eq!(o.applied_discount.as_ref().unwrap().name, "Happy Hour");
    }

    #[test]
    fn test_discount_outside_schedule_requires_elevated_role() {
        let mut o = order();
        o.add_custom_item("Set menu", Money::from_cents(10000)).unwrap();

        let waiter = Operator::new("Luis", Role::Waiter);
        let err = o.apply_discount(&happy_hour(), &waiter, monday(12)).unwrap_err();
        assert!(matches!(err, CoreError::AuthorizationRequired { .. }));
        assert!(o.applied_discount.is_none());

        let manager = Operator::new("Ana", Role::Manager);
        o.apply_discount(&happy_hour(), &manager, monday(12)).unwrap();
        assert_eq!(
            o.applied_discount.as_ref().unwrap().name,
            "Happy Hour (auth: Ana)"
        );
        o.remove_discount().unwrap();
        assert_eq!(o.total.cents(), 10000);
    }

    #[test]
    fn test_out_of_range_discount_value_is_rejected() {
        let mut o = order();
        o.add_custom_item("Set menu", Money::from_cents(10000)).unwrap();
        let manager = Operator::new("Ana", Role::Manager);

        let mut huge = happy_hour();
        huge.schedule = None;
        huge.kind = DiscountKind::Fixed;
        huge.value = Decimal::MAX;
        let err = o.apply_discount(&huge, &manager, monday(18)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        huge.kind = DiscountKind::Percentage;
        huge.value = dec!(150);
        assert!(o.apply_discount(&huge, &manager, monday(18)).is_err());
        assert!(o.applied_discount.is_none());
        assert_eq!(o.total.cents(), 10000);
    }

    #[test]
    fn test_courtesy_requires_elevated_role_and_zeroes_total() {
        let mut o = order();
        o.add_custom_item("Wine", Money::from_cents(3000)).unwrap();
        o.set_service_charge(Money::from_cents(300)).unwrap();

        let cashier = Operator::new("Eva", Role::Cashier);
        assert!(o.apply_courtesy(&cashier).is_err());
        assert!(!o.is_courtesy);

        o.apply_discount(&happy_hour(), &Operator::new("Ana", Role::Admin), monday(18))
            .unwrap();
        o.apply_courtesy(&Operator::new("Ana", Role::Admin)).unwrap();
        assert!(o.applied_discount.is_none());
        assert_eq!(o.total, Money::zero());
    }

    #[test]
    fn test_move_to_table_migrates_occupancy() {
        let mut o = order();
        let mut t1 = Table::new("t1", "b1", "1");
        let mut t2 = Table::new("t2", "b1", "2");
        t1.occupy("o1");

        o.move_to_table(Some(&mut t1), &mut t2).unwrap();
        assert_eq!(o.table_id.as_deref(), Some("t2"));
        assert!(!t1.is_occupied);
        assert_eq!(t2.order_ids, vec!["o1".to_string()]);
    }

    #[test]
    fn test_merge_voids_source_and_drops_its_discount() {
        let mut target = order();
        target.add_custom_item("A", Money::from_cents(1000)).unwrap();
        let mut source = Order::new("o2", "b1", OrderType::DineIn, Utc::now()).with_table("t2");
        source.add_custom_item("B", Money::from_cents(2000)).unwrap();
        source
            .apply_discount(&happy_hour(), &Operator::new("Ana", Role::Manager), monday(18))
            .unwrap();
        let mut t2 = Table::new("t2", "b1", "2");
        t2.occupy("o2");

        target.merge_from(&mut source, Some(&mut t2)).unwrap();

        assert_eq!(target.items.len(), 2);
        assert_eq!(target.total.cents(), 3000);
        assert_eq!(source.status, OrderStatus::Void);
        assert!(!t2.is_occupied);
    }

    #[test]
    fn test_merge_into_itself_fails() {
        let mut a = order();
        let mut b = a.clone();
        assert!(matches!(a.merge_from(&mut b, None), Err(CoreError::SelfMerge(_))));
    }

    #[test]
    fn test_split_conserves_quantities() {
        let mut o = order();
        let a = o.add_custom_item("A", Money::from_cents(500)).unwrap();
        let b = o.add_custom_item("B", Money::from_cents(300)).unwrap();
        o.change_quantity(&a, 3).unwrap();
        o.change_quantity(&b, 1).unwrap();
        o.apply_courtesy(&Operator::new("Ana", Role::Manager)).unwrap();

        let moves: BTreeMap<String, i64> = [(a.clone(), 1), (b.clone(), 2)].into_iter().collect();
        let new = o.split(&moves, "o3", Utc::now()).unwrap();

        assert_eq!(o.item(&a).unwrap().quantity, 3);
        assert!(o.item(&b).is_none());
        assert_eq!(new.item(&a).unwrap().quantity, 1);
        assert_eq!(new.item(&b).unwrap().quantity, 2);
        assert_eq!(new.table_id.as_deref(), Some("t1"));
        assert!(!new.is_courtesy);
        assert_eq!(new.total.cents(), 1100);
        assert_eq!(o.total, Money::zero());
    }

    #[test]
    fn test_split_with_nothing_selected_aborts() {
        let mut o = order();
        let a = o.add_custom_item("A", Money::from_cents(500)).unwrap();
        let moves: BTreeMap<String, i64> = [(a, 0)].into_iter().collect();
        let before = o.clone();
        assert!(matches!(
            o.split(&moves, "o3", Utc::now()),
            Err(CoreError::NothingToSplit(_))
        ));
        assert_eq!(o, before);
    }

    #[test]
    fn test_split_more_than_available_fails() {
        let mut o = order();
        let a = o.add_custom_item("A", Money::from_cents(500)).unwrap();
        let moves: BTreeMap<String, i64> = [(a, 2)].into_iter().collect();
        assert!(matches!(
            o.split(&moves, "o3", Utc::now()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_void_is_terminal() {
        let mut o = order();
        let mut t = Table::new("t1", "b1", "1");
        t.occupy("o1");
        o.void(Some(&mut t)).unwrap();
        assert_eq!(o.status, OrderStatus::Void);
        assert!(!t.is_occupied);
        assert!(o.void(None).is_err());
        assert!(o.add_custom_item("A", Money::from_cents(1)).is_err());
    }

    #[test]
    fn test_send_unprinted_moves_to_cooking_once() {
        let mut o = order();
        o.add_custom_item("A", Money::from_cents(500)).unwrap();
        assert_eq!(o.send_unprinted().unwrap().len(), 1);
        assert_eq!(o.status, OrderStatus::Cooking);
        assert!(o.send_unprinted().unwrap().is_empty());
    }
}
