//! # Order Service
//!
//! Line-item edits, discounts and table moves on open orders.
//!
//! Every mutation loads the whole order, applies one rule from
//! `comanda-core` (which recomputes totals) and writes the whole order back,
//! inside a transaction. Operations that also touch a table or a second
//! order write them in the same transaction, so occupancy never disagrees
//! with the orders.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  draft()  ──► OrderRef::Pending ──confirm()──► OrderRef::Confirmed      │
//! │                                     (order + table in one tx)           │
//! │                                                                         │
//! │  add_item / change_quantity / apply_discount / ...                      │
//! │       BEGIN ─► load order ─► Order::<rule>() ─► put order ─► COMMIT     │
//! │                                                                         │
//! │  move_to_table / merge / split / void                                   │
//! │       BEGIN ─► orders + tables ─► rule ─► put all ─► COMMIT             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use comanda_core::print::BillPayload;
use comanda_core::{
    CoreError, CoreResult, Customer, Discount, Ingredient, ModifierGroup, Money, NameResolver,
    Operator, Order, OrderRef, OrderType, PrintJob, PrintJobType, Table, ValidationError,
};
use comanda_db::{DocTransaction, PrintQueueEntry};

use crate::error::EngineResult;
use crate::Engine;

/// One modifier option picked for a new line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierChoice {
    pub group_id: String,
    pub option_id: String,
}

impl ModifierChoice {
    pub fn new(group_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        ModifierChoice {
            group_id: group_id.into(),
            option_id: option_id.into(),
        }
    }
}

/// Order mutations.
#[derive(Debug, Clone)]
pub struct OrderService {
    engine: Engine,
}

impl OrderService {
    pub fn new(engine: Engine) -> Self {
        OrderService { engine }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// A local draft. Nothing is written until [`confirm`](Self::confirm).
    pub fn draft(
        &self,
        branch_id: &str,
        table_id: Option<&str>,
        order_type: OrderType,
        customer_id: Option<&str>,
    ) -> OrderRef {
        let mut order = Order::new(
            Uuid::new_v4().to_string(),
            branch_id,
            order_type,
            self.engine.clock().now_utc(),
        );
        order.table_id = table_id.map(str::to_string);
        order.customer_id = customer_id.map(str::to_string);
        OrderRef::Pending(order)
    }

    /// Stores a draft and seats it at its table. Confirmed orders pass
    /// through unchanged.
    pub async fn confirm(&self, order_ref: OrderRef) -> EngineResult<OrderRef> {
        let order = match order_ref {
            OrderRef::Confirmed(_) => return Ok(order_ref),
            OrderRef::Pending(order) => order,
        };

        let mut tx = self.engine.db().begin().await?;
        if let Some(customer_id) = &order.customer_id {
            tx.require::<Customer>(customer_id).await?;
        }
        if let Some(table_id) = &order.table_id {
            let mut table: Table = tx.require(table_id).await?;
            table.occupy(&order.id);
            tx.put(&table).await?;
        }
        tx.put(&order).await?;
        tx.commit().await?;

        info!(order_id = %order.id, table = ?order.table_id, order_type = %order.order_type, "Order opened");
        Ok(OrderRef::Confirmed(order))
    }

    /// Creates and stores an empty order in one step.
    pub async fn open_order(
        &self,
        branch_id: &str,
        table_id: Option<&str>,
        order_type: OrderType,
        customer_id: Option<&str>,
    ) -> EngineResult<OrderRef> {
        let draft = self.draft(branch_id, table_id, order_type, customer_id);
        self.confirm(draft).await
    }

    pub async fn get(&self, order_id: &str) -> EngineResult<Order> {
        Ok(self.engine.db().orders().require(order_id).await?)
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Adds one unit of a product with the chosen modifiers, minus the
    /// excluded base ingredients. Returns the order and the new line's id.
    pub async fn add_item(
        &self,
        order_id: &str,
        product_id: &str,
        choices: &[ModifierChoice],
        excluded_ingredient_ids: &[String],
    ) -> EngineResult<(Order, String)> {
        let db = self.engine.db();
        let product = db.products().require(product_id).await?;
        if !product.is_active {
            return Err(ValidationError::InvalidFormat {
                field: "product".to_string(),
                reason: format!("{} is not on sale", product.name),
            }
            .into());
        }

        let mut modifiers = Vec::with_capacity(choices.len());
        for choice in choices {
            if !product.modifier_group_ids.contains(&choice.group_id) {
                return Err(CoreError::ModifierNotFound {
                    group_id: choice.group_id.clone(),
                    option_id: choice.option_id.clone(),
                }
                .into());
            }
            let group: ModifierGroup = db.modifiers().require(&choice.group_id).await?;
            modifiers.push(group.select(&choice.option_id)?);
        }

        // Cost snapshot uses the reference rows named by the recipes.
        let reference_ids: HashSet<&str> = product
            .ingredients
            .iter()
            .chain(modifiers.iter().flat_map(|m| m.recipe.iter()))
            .map(|line| line.ingredient_id.as_str())
            .collect();
        let mut references: Vec<Ingredient> = Vec::with_capacity(reference_ids.len());
        for id in reference_ids {
            if let Some(ingredient) = db.ingredients().get(id).await? {
                references.push(ingredient);
            }
        }
        let lookup = NameResolver::new(references);

        let excluded = excluded_ingredient_ids.to_vec();
        let (order, item_id) = self
            .update(order_id, |order| {
                order.add_item(&product, modifiers, excluded, &lookup)
            })
            .await?;
        debug!(order_id, product_id, item_id = %item_id, total = %order.total, "Item added");
        Ok((order, item_id))
    }

    /// Adds a free-text line at a manual price.
    pub async fn add_custom_item(
        &self,
        order_id: &str,
        name: &str,
        price: Money,
    ) -> EngineResult<(Order, String)> {
        let (order, item_id) = self
            .update(order_id, |order| order.add_custom_item(name, price))
            .await?;
        debug!(order_id, item_id = %item_id, "Custom item added");
        Ok((order, item_id))
    }

    /// Changes a line's quantity by `delta`; the line goes away at zero.
    pub async fn change_quantity(&self, order_id: &str, item_id: &str, delta: i64) -> EngineResult<Order> {
        let (order, quantity) = self
            .update(order_id, |order| order.change_quantity(item_id, delta))
            .await?;
        debug!(order_id, item_id, delta, quantity, "Quantity changed");
        Ok(order)
    }

    pub async fn remove_item(&self, order_id: &str, item_id: &str) -> EngineResult<Order> {
        let (order, _) = self
            .update(order_id, |order| order.remove_item(item_id))
            .await?;
        debug!(order_id, item_id, "Item removed");
        Ok(order)
    }

    // =========================================================================
    // Discounts & Charges
    // =========================================================================

    /// Applies a catalog discount, checked against the local clock.
    pub async fn apply_discount(
        &self,
        order_id: &str,
        discount_id: &str,
        operator: &Operator,
    ) -> EngineResult<Order> {
        let discount: Discount = self.engine.db().discounts().require(discount_id).await?;
        let at = self.engine.clock().now_local();
        let (order, _) = self
            .update(order_id, |order| order.apply_discount(&discount, operator, at))
            .await?;
        info!(
            order_id,
            discount = %discount.name,
            operator = %operator.name,
            discount_amount = %order.discount_amount,
            "Discount applied"
        );
        Ok(order)
    }

    pub async fn remove_discount(&self, order_id: &str) -> EngineResult<Order> {
        let (order, _) = self.update(order_id, Order::remove_discount).await?;
        debug!(order_id, "Discount removed");
        Ok(order)
    }

    pub async fn apply_courtesy(&self, order_id: &str, operator: &Operator) -> EngineResult<Order> {
        let (order, _) = self
            .update(order_id, |order| order.apply_courtesy(operator))
            .await?;
        info!(order_id, operator = %operator.name, "Courtesy applied");
        Ok(order)
    }

    pub async fn set_service_charge(&self, order_id: &str, amount: Money) -> EngineResult<Order> {
        let (order, _) = self
            .update(order_id, |order| order.set_service_charge(amount))
            .await?;
        debug!(order_id, service_charge = %amount, "Service charge set");
        Ok(order)
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Reseats an order, moving its occupancy slot.
    pub async fn move_to_table(&self, order_id: &str, table_id: &str) -> EngineResult<Order> {
        let mut tx = self.engine.db().begin().await?;
        let mut order: Order = tx.require(order_id).await?;
        let mut to: Table = tx.require(table_id).await?;

        match order.table_id.clone() {
            Some(from_id) if from_id != to.id => {
                let mut from: Table = tx.require(&from_id).await?;
                order.move_to_table(Some(&mut from), &mut to)?;
                tx.put(&from).await?;
            }
            _ => order.move_to_table(None, &mut to)?,
        }
        tx.put(&to).await?;
        tx.put(&order).await?;
        tx.commit().await?;

        info!(order_id, table_id, "Order moved");
        Ok(order)
    }

    /// Moves every item of `source_id` into `target_id` and voids the source.
    pub async fn merge(&self, target_id: &str, source_id: &str) -> EngineResult<Order> {
        if target_id == source_id {
            return Err(CoreError::SelfMerge(target_id.to_string()).into());
        }

        let mut tx = self.engine.db().begin().await?;
        let mut target: Order = tx.require(target_id).await?;
        let mut source: Order = tx.require(source_id).await?;

        match seated_table(&mut tx, &source).await? {
            Some(mut table) => {
                target.merge_from(&mut source, Some(&mut table))?;
                tx.put(&table).await?;
            }
            None => target.merge_from(&mut source, None)?,
        }
        tx.put(&source).await?;
        tx.put(&target).await?;
        tx.commit().await?;

        info!(target_id, source_id, items = target.items.len(), total = %target.total, "Orders merged");
        Ok(target)
    }

    /// Moves the given quantities (`item id -> quantity`) into a new order on
    /// the same table. Returns `(remaining, new)`.
    pub async fn split(
        &self,
        order_id: &str,
        moves: &BTreeMap<String, i64>,
    ) -> EngineResult<(Order, Order)> {
        let mut tx = self.engine.db().begin().await?;
        let mut order: Order = tx.require(order_id).await?;
        let new_order = order.split(moves, Uuid::new_v4().to_string(), self.engine.clock().now_utc())?;

        if let Some(table_id) = &new_order.table_id {
            let mut table: Table = tx.require(table_id).await?;
            table.occupy(&new_order.id);
            tx.put(&table).await?;
        }
        tx.put(&order).await?;
        tx.put(&new_order).await?;
        tx.commit().await?;

        info!(order_id, new_order_id = %new_order.id, "Order split");
        Ok((order, new_order))
    }

    /// Cancels an unpaid order and frees its table slot. Inventory is not
    /// touched.
    pub async fn void(&self, order_id: &str) -> EngineResult<Order> {
        let mut tx = self.engine.db().begin().await?;
        let mut order: Order = tx.require(order_id).await?;

        match seated_table(&mut tx, &order).await? {
            Some(mut table) => {
                order.void(Some(&mut table))?;
                tx.put(&table).await?;
            }
            None => order.void(None)?,
        }
        tx.put(&order).await?;
        tx.commit().await?;

        info!(order_id, "Order voided");
        Ok(order)
    }

    // =========================================================================
    // Printing
    // =========================================================================

    /// Sends unprinted lines to the kitchen as one COMMAND ticket. Returns
    /// the number of lines sent; nothing is written when it is 0.
    pub async fn send_to_kitchen(&self, order_id: &str) -> EngineResult<usize> {
        let mut tx = self.engine.db().begin().await?;
        let mut order: Order = tx.require(order_id).await?;
        let sent = order.send_unprinted()?;
        if sent.is_empty() {
            tx.rollback().await?;
            debug!(order_id, "Nothing to send to the kitchen");
            return Ok(0);
        }

        let job = PrintJob::kitchen_ticket(&order, &sent);
        let printer = self.engine.config().printers.for_job(PrintJobType::Command);
        tx.enqueue_print_job(&job, printer).await?;
        tx.put(&order).await?;
        tx.commit().await?;

        info!(order_id, lines = sent.len(), printer, "Sent to kitchen");
        Ok(sent.len())
    }

    /// Queues a pre-check (BILL) for the order as it stands.
    pub async fn print_bill(&self, order_id: &str) -> EngineResult<PrintQueueEntry> {
        let db = self.engine.db();
        let order = db.orders().require(order_id).await?;
        if order.status.is_terminal() {
            return Err(CoreError::invalid_status(&order.id, order.status, "print a bill").into());
        }
        let job = PrintJob::Bill(BillPayload::from(&order));
        let printer = self.engine.config().printers.for_job(PrintJobType::Bill);
        let entry = db.print_queue().enqueue(&job, printer).await?;
        debug!(order_id, job_id = %entry.id, "Bill queued");
        Ok(entry)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Load, apply `rule`, store, all under the write lock. The order is
    /// written only when the rule succeeds, and the rule always sees the
    /// latest committed status.
    async fn update<T, F>(&self, order_id: &str, rule: F) -> EngineResult<(Order, T)>
    where
        F: FnOnce(&mut Order) -> CoreResult<T>,
    {
        let mut tx = self.engine.db().begin().await?;
        let mut order: Order = tx.require(order_id).await?;
        let out = match rule(&mut order) {
            Ok(out) => out,
            Err(err) => {
                tx.rollback().await?;
                return Err(err.into());
            }
        };
        tx.put(&order).await?;
        tx.commit().await?;
        Ok((order, out))
    }
}

/// The table an order sits at. A table deleted since the order was seated
/// is logged and treated as no table.
async fn seated_table(tx: &mut DocTransaction, order: &Order) -> EngineResult<Option<Table>> {
    let Some(table_id) = &order.table_id else {
        return Ok(None);
    };
    let table: Option<Table> = tx.get(table_id).await?;
    if table.is_none() {
        warn!(order_id = %order.id, table_id = %table_id, "Table not found, nothing to release");
    }
    Ok(table)
}

// =============================================================================
// Unit Tests
// =============================================================================
