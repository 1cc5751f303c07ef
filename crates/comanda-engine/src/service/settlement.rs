//! # Settlement
//!
//! Closing an order: payment, table release, inventory deduction, loyalty
//! and the receipt, all in one transaction.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  close_order(order_id, payments, tip)                                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├─ read order, products, packaging rules, every ingredient row        │
//! │   ├─ plan_deductions(order) ─► { ingredient → qty }   (no writes yet)  │
//! │   ├─ order.mark_paid()                                                  │
//! │   ├─ table.release(order)                                 put table     │
//! │   ├─ ingredient.stock -= qty   (one write per ingredient) put ×N        │
//! │   ├─ customer.record_visit()                              put customer  │
//! │   ├─ RECEIPT job                                          outbox row    │
//! │   └─ put order                                                          │
//! │  COMMIT ──► watchers notified                                           │
//! │                                                                         │
//! │  Any error before COMMIT: nothing above is visible.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use comanda_core::print::ReceiptPayload;
use comanda_core::validation::validate_payment_amount;
use comanda_core::{
    plan_deductions, CoreError, Customer, Ingredient, Money, NameResolver, Order, PackagingRule,
    IngredientLookup, PaymentEntry, PrintJob, PrintJobType, Product, ResolutionMiss, Settings,
    Table,
};
use comanda_db::document::SETTINGS_ID;

use crate::error::EngineResult;
use crate::Engine;

/// What a settlement did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub order_id: String,
    pub total: Money,
    /// Ingredient id to usage units deducted.
    pub deductions: BTreeMap<String, Decimal>,
    /// Reference ingredients with no name match in the order's branch.
    pub misses: Vec<ResolutionMiss>,
    /// Products sold on the order that are gone from the catalog.
    pub missing_products: Vec<String>,
    pub packaging_cost: Money,
    /// `None` when the order has no customer.
    pub points_earned: Option<i64>,
    pub receipt_job_id: String,
}

#[derive(Debug, Clone)]
pub struct SettlementService {
    engine: Engine,
}

impl SettlementService {
    pub fn new(engine: Engine) -> Self {
        SettlementService { engine }
    }

    /// Pays and closes an order.
    ///
    /// Fails without side effects when the order is already PAID or VOID,
    /// when a payment amount is not positive, or when the store rejects
    /// the transaction.
    pub async fn close_order(
        &self,
        order_id: &str,
        payments: Vec<PaymentEntry>,
        tip: Money,
    ) -> EngineResult<SettlementReport> {
        for payment in &payments {
            validate_payment_amount(payment.amount.cents())?;
        }

        let mut tx = self.engine.db().begin().await?;
        let mut order: Order = tx.require(order_id).await?;
        if order.status.is_terminal() {
            return Err(CoreError::invalid_status(&order.id, order.status, "close").into());
        }

        // Everything the plan needs is read before the first write.
        let mut products: HashMap<String, Product> = HashMap::new();
        for product_id in order.items.iter().filter_map(|i| i.product_id.as_deref()) {
            if products.contains_key(product_id) {
                continue;
            }
            if let Some(product) = tx.get::<Product>(product_id).await? {
                products.insert(product.id.clone(), product);
            }
        }
        let rules: Vec<PackagingRule> = tx.list().await?;
        let resolver = NameResolver::new(tx.list::<Ingredient>().await?);
        let plan = plan_deductions(&order, &products, &rules, &resolver);

        let now = self.engine.clock().now_utc();
        order.mark_paid(payments, tip, now)?;
        order.packaging_cost_snapshot = plan.packaging_cost;

        if let Some(table_id) = &order.table_id {
            match tx.get::<Table>(table_id).await? {
                Some(mut table) => {
                    table.release(&order.id);
                    tx.put(&table).await?;
                }
                None => warn!(order_id, table_id = %table_id, "Order table no longer exists"),
            }
        }

        let mut applied = BTreeMap::new();
        for (ingredient_id, qty) in &plan.deductions {
            let Some(current) = resolver.ingredient(ingredient_id) else {
                warn!(order_id, ingredient_id = %ingredient_id, "Deduction target missing, skipped");
                continue;
            };
            let mut ingredient = current.clone();
            ingredient.stock -= *qty;
            if ingredient.stock < Decimal::ZERO {
                warn!(
                    ingredient_id = %ingredient.id,
                    stock = %ingredient.stock,
                    "Stock went negative"
                );
            }
            tx.put(&ingredient).await?;
            applied.insert(ingredient_id.clone(), *qty);
        }
        for miss in &plan.misses {
            warn!(
                order_id,
                reference_id = %miss.reference_id,
                branch_id = %miss.branch_id,
                source = ?miss.source,
                "No ingredient with this name in the branch, deducting from the reference row"
            );
        }
        for product_id in &plan.missing_products {
            warn!(order_id, product_id = %product_id, "Product gone from catalog, nothing deducted");
        }

        let points_earned = match &order.customer_id {
            Some(customer_id) => match tx.get::<Customer>(customer_id).await? {
                Some(mut customer) => {
                    let settings = tx.get::<Settings>(SETTINGS_ID).await?.unwrap_or_default();
                    let earned = customer.record_visit(
                        order.total,
                        &settings,
                        now,
                        self.engine.clock().weekday(),
                    );
                    tx.put(&customer).await?;
                    Some(earned)
                }
                None => {
                    warn!(order_id, customer_id = %customer_id, "Customer not found, no points awarded");
                    None
                }
            },
            None => None,
        };

        let receipt = PrintJob::Receipt(ReceiptPayload::from(&order));
        let printer = self.engine.config().printers.for_job(PrintJobType::Receipt);
        let entry = tx.enqueue_print_job(&receipt, printer).await?;

        tx.put(&order).await?;
        tx.commit().await?;

        info!(
            order_id,
            total = %order.total,
            tip = %order.tip,
            ingredients = applied.len(),
            misses = plan.misses.len(),
            points = ?points_earned,
            "Order settled"
        );

        Ok(SettlementReport {
            order_id: order.id,
            total: order.total,
            deductions: applied,
            misses: plan.misses,
            missing_products: plan.missing_products,
            packaging_cost: plan.packaging_cost,
            points_earned,
            receipt_job_id: entry.id,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
