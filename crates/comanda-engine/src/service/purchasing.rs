//! # Purchasing, Transfers & Counts
//!
//! Stock coming in (supplier purchases), stock moving between branches, and
//! physical counts.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receive_purchase   qty × conversion_ratio ─► usage units               │
//! │                     cost = weighted average(stock, cost, qty, value)    │
//! │                                                                         │
//! │  receive_transfer   source row   stock -= qty                           │
//! │                     dest row     found by name in the destination       │
//! │                                  branch, or cloned from the source      │
//! │                                  with zero stock; receives qty at the   │
//! │                                  source's cost                          │
//! │                                                                         │
//! │  adjust_stock       stock := counted; variance = (counted − stock)×cost │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Receipts are all-or-nothing: one bad line leaves every row untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use comanda_core::costing::receive_stock;
use comanda_core::print::{TransferTicket, TransferTicketLine};
use comanda_core::resolver::normalize_name;
use comanda_core::validation::{validate_name, validate_non_negative};
use comanda_core::{
    CoreError, Ingredient, PrintJob, PrintJobType, Purchase, ReceiptStatus, Transfer,
    ValidationError,
};

use crate::error::EngineResult;
use crate::Engine;

/// Outcome of a physical count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub ingredient_id: String,
    pub previous_stock: Decimal,
    pub counted_stock: Decimal,
    /// Counted minus previous; negative means shrinkage.
    pub variance_qty: Decimal,
    /// `variance_qty × cost`.
    pub variance_value: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PurchasingService {
    engine: Engine,
}

impl PurchasingService {
    pub fn new(engine: Engine) -> Self {
        PurchasingService { engine }
    }

    /// Books a supplier delivery and stores the purchase as RECEIVED.
    pub async fn receive_purchase(&self, mut purchase: Purchase) -> EngineResult<Purchase> {
        purchase.ensure_receivable()?;

        let mut tx = self.engine.db().begin().await?;
        if let Some(stored) = tx.get::<Purchase>(&purchase.id).await? {
            if stored.status == ReceiptStatus::Received {
                return Err(CoreError::AlreadyReceived(purchase.id.clone()).into());
            }
        }

        for line in &purchase.lines {
            let mut ingredient: Ingredient = tx.require(&line.ingredient_id).await?;
            if ingredient.branch_id != purchase.branch_id {
                warn!(
                    purchase_id = %purchase.id,
                    ingredient_id = %ingredient.id,
                    ingredient_branch = %ingredient.branch_id,
                    "Purchase line books stock into another branch"
                );
            }
            let usage_qty = line.quantity * ingredient.conversion_ratio;
            receive_stock(&mut ingredient, usage_qty, line.line_cost);
            tx.put(&ingredient).await?;
        }

        purchase.status = ReceiptStatus::Received;
        purchase.received_at = Some(self.engine.clock().now_utc());
        tx.put(&purchase).await?;
        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            branch_id = %purchase.branch_id,
            lines = purchase.lines.len(),
            "Purchase received"
        );
        Ok(purchase)
    }

    /// Moves stock from one branch to another and stores the transfer as
    /// RECEIVED. Queues a TRANSFER ticket.
    pub async fn receive_transfer(&self, mut transfer: Transfer) -> EngineResult<Transfer> {
        transfer.ensure_receivable()?;

        let mut tx = self.engine.db().begin().await?;
        if let Some(stored) = tx.get::<Transfer>(&transfer.id).await? {
            if stored.status == ReceiptStatus::Received {
                return Err(CoreError::AlreadyReceived(transfer.id.clone()).into());
            }
        }

        let mut ticket_lines = Vec::with_capacity(transfer.lines.len());
        for line in &transfer.lines {
            let mut source: Ingredient = tx.require(&line.ingredient_id).await?;
            if source.branch_id != transfer.from_branch_id {
                return Err(ValidationError::InvalidFormat {
                    field: "transfer line".to_string(),
                    reason: format!(
                        "ingredient {} belongs to branch {}, not {}",
                        source.id, source.branch_id, transfer.from_branch_id
                    ),
                }
                .into());
            }
            source.stock -= line.quantity;
            tx.put(&source).await?;

            let key = normalize_name(&source.name);
            let existing = tx
                .list_by_branch::<Ingredient>(&transfer.to_branch_id)
                .await?
                .into_iter()
                .find(|i| i.normalized_name() == key);
            let mut dest = match existing {
                Some(dest) => dest,
                None => {
                    let mut created = source.clone();
                    created.id = Uuid::new_v4().to_string();
                    created.branch_id = transfer.to_branch_id.clone();
                    created.stock = Decimal::ZERO;
                    info!(
                        ingredient = %source.name,
                        branch_id = %transfer.to_branch_id,
                        new_id = %created.id,
                        "Created destination ingredient"
                    );
                    created
                }
            };
            receive_stock(&mut dest, line.quantity, line.quantity * source.cost);
            tx.put(&dest).await?;

            ticket_lines.push(TransferTicketLine {
                name: source.name.clone(),
                quantity: line.quantity,
                unit: source.usage_unit.clone(),
            });
        }

        transfer.status = ReceiptStatus::Received;
        transfer.received_at = Some(self.engine.clock().now_utc());
        tx.put(&transfer).await?;

        let ticket = PrintJob::Transfer(TransferTicket {
            transfer_id: transfer.id.clone(),
            from_branch_id: transfer.from_branch_id.clone(),
            to_branch_id: transfer.to_branch_id.clone(),
            lines: ticket_lines,
        });
        let printer = self.engine.config().printers.for_job(PrintJobType::Transfer);
        tx.enqueue_print_job(&ticket, printer).await?;
        tx.commit().await?;

        info!(
            transfer_id = %transfer.id,
            from = %transfer.from_branch_id,
            to = %transfer.to_branch_id,
            lines = transfer.lines.len(),
            "Transfer received"
        );
        Ok(transfer)
    }

    /// Sets an ingredient's stock to a physical count.
    pub async fn adjust_stock(
        &self,
        ingredient_id: &str,
        counted_stock: Decimal,
        reason: &str,
    ) -> EngineResult<StockAdjustment> {
        validate_non_negative("counted stock", counted_stock)?;
        validate_name("reason", reason)?;

        // Read under the write lock: a settlement in flight lands wholly
        // before or after the count.
        let mut tx = self.engine.db().begin().await?;
        let mut ingredient: Ingredient = tx.require(ingredient_id).await?;
        let previous_stock = ingredient.stock;
        let variance_qty = counted_stock - previous_stock;
        ingredient.stock = counted_stock;
        tx.put(&ingredient).await?;
        tx.commit().await?;

        let adjustment = StockAdjustment {
            ingredient_id: ingredient.id,
            previous_stock,
            counted_stock,
            variance_qty,
            variance_value: variance_qty * ingredient.cost,
            reason: reason.to_string(),
        };
        info!(
            ingredient_id,
            variance = %adjustment.variance_qty,
            value = %adjustment.variance_value,
            reason,
            "Stock adjusted"
        );
        Ok(adjustment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::service::testing::{self, BRANCH};
    use comanda_core::{PurchaseLine, TransferLine};
    use rust_decimal_macros::dec;

    async fn stocked() -> Engine {
        let engine = testing::engine().await;
        let mut flour = testing::ingredient("flour", BRANCH, "Flour", dec!(10), dec!(2.0));
        flour.purchase_unit = "kg".to_string();
        flour.conversion_ratio = dec!(1000);
        flour.usage_unit = "g".to_string();
        engine.db().ingredients().put(&flour).await.unwrap();
        engine
            .db()
            .ingredients()
            .put(&testing::ingredient("oil", BRANCH, "Olive Oil", dec!(1000), dec!(0.01)))
            .await
            .unwrap();
        engine
    }

    fn purchase(lines: Vec<PurchaseLine>) -> Purchase {
        Purchase {
            id: "p1".to_string(),
            branch_id: BRANCH.to_string(),
            supplier: Some("Molino".to_string()),
            lines,
            status: ReceiptStatus::Pending,
            received_at: None,
        }
    }

    #[tokio::test]
    async fn test_purchase_converts_units_and_averages_cost() {
        let engine = stocked().await;
        // 2 kg for 10.00 → 2000 g at 0.005
        let received = engine
            .purchasing()
            .receive_purchase(purchase(vec![PurchaseLine {
                ingredient_id: "flour".to_string(),
                quantity: dec!(2),
                line_cost: dec!(10),
            }]))
            .await
            .unwrap();
        assert_eq!(received.status, ReceiptStatus::Received);
        assert!(received.received_at.is_some());

        let flour = engine.db().ingredients().require("flour").await.unwrap();
        assert_eq!(flour.stock, dec!(2010));
        // (10 x 2.0 + 10) / 2010
        assert_eq!(flour.cost.round_dp(8), (dec!(30) / dec!(2010)).round_dp(8));
        assert_eq!(
            engine.db().purchases().require("p1").await.unwrap().status,
            ReceiptStatus::Received
        );
    }

    #[tokio::test]
    async fn test_purchase_is_received_once() {
        let engine = stocked().await;
        let p = purchase(vec![PurchaseLine {
            ingredient_id: "oil".to_string(),
            quantity: dec!(500),
            line_cost: dec!(5),
        }]);
        let purchasing = engine.purchasing();
        purchasing.receive_purchase(p.clone()).await.unwrap();

        let err = purchasing.receive_purchase(p).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert_eq!(
            engine.db().ingredients().require("oil").await.unwrap().stock,
            dec!(1500)
        );
    }

    #[tokio::test]
    async fn test_purchase_with_unknown_line_changes_nothing() {
        let engine = stocked().await;
        let err = engine
            .purchasing()
            .receive_purchase(purchase(vec![
                PurchaseLine {
                    ingredient_id: "oil".to_string(),
                    quantity: dec!(500),
                    line_cost: dec!(5),
                },
                PurchaseLine {
                    ingredient_id: "saffron".to_string(),
                    quantity: dec!(1),
                    line_cost: dec!(50),
                },
            ]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let db = engine.db();
        assert_eq!(db.ingredients().require("oil").await.unwrap().stock, dec!(1000));
        assert!(db.purchases().get("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transfer_creates_missing_destination_row() {
        let engine = stocked().await;
        let transfer = Transfer {
            id: "tr1".to_string(),
            from_branch_id: BRANCH.to_string(),
            to_branch_id: "norte".to_string(),
            lines: vec![TransferLine {
                ingredient_id: "oil".to_string(),
                quantity: dec!(200),
            }],
            status: ReceiptStatus::Pending,
            received_at: None,
        };

        let received = engine.purchasing().receive_transfer(transfer).await.unwrap();
        assert_eq!(received.status, ReceiptStatus::Received);

        let db = engine.db();
        assert_eq!(db.ingredients().require("oil").await.unwrap().stock, dec!(800));
        let dest = db
            .ingredients()
            .find_by_name("norte", "olive oil")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(dest.id, "oil");
        assert_eq!(dest.stock, dec!(200));
        assert_eq!(dest.cost, dec!(0.01));

        let jobs = db.print_queue().get_pending(10).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_type, PrintJobType::Transfer);
    }

    #[tokio::test]
    async fn test_transfer_rolls_cost_into_existing_row() {
        let engine = stocked().await;
        engine
            .db()
            .ingredients()
            .put(&testing::ingredient("oil-n", "norte", "olive oil", dec!(100), dec!(0.04)))
            .await
            .unwrap();
        let transfer = Transfer {
            id: "tr2".to_string(),
            from_branch_id: BRANCH.to_string(),
            to_branch_id: "norte".to_string(),
            lines: vec![TransferLine {
                ingredient_id: "oil".to_string(),
                quantity: dec!(300),
            }],
            status: ReceiptStatus::Pending,
            received_at: None,
        };
        engine.purchasing().receive_transfer(transfer).await.unwrap();

        let dest = engine.db().ingredients().require("oil-n").await.unwrap();
        assert_eq!(dest.stock, dec!(400));
        // (100 x 0.04 + 300 x 0.01) / 400
        assert_eq!(dest.cost, dec!(0.0175));
    }

    #[tokio::test]
    async fn test_transfer_line_from_wrong_branch_is_rejected() {
        let engine = stocked().await;
        let transfer = Transfer {
            id: "tr3".to_string(),
            from_branch_id: "norte".to_string(),
            to_branch_id: BRANCH.to_string(),
            lines: vec![TransferLine {
                ingredient_id: "oil".to_string(),
                quantity: dec!(1),
            }],
            status: ReceiptStatus::Pending,
            received_at: None,
        };
        let err = engine.purchasing().receive_transfer(transfer).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(
            engine.db().ingredients().require("oil").await.unwrap().stock,
            dec!(1000)
        );
    }

    #[tokio::test]
    async fn test_adjustment_reports_variance_value() {
        let engine = stocked().await;
        let adjustment = engine
            .purchasing()
            .adjust_stock("oil", dec!(900), "Monthly count")
            .await
            .unwrap();
        assert_eq!(adjustment.previous_stock, dec!(1000));
        assert_eq!(adjustment.variance_qty, dec!(-100));
        assert_eq!(adjustment.variance_value, dec!(-1.00));
        assert_eq!(
            engine.db().ingredients().require("oil").await.unwrap().stock,
            dec!(900)
        );

        let err = engine
            .purchasing()
            .adjust_stock("oil", dec!(-1), "typo")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_count_waits_for_a_deduction_in_flight() {
        let engine = stocked().await;

        let mut tx = engine.db().begin().await.unwrap();
        let mut oil: Ingredient = tx.require("oil").await.unwrap();
        oil.stock -= dec!(100);
        tx.put(&oil).await.unwrap();

        let counter = engine.clone();
        let count = tokio::spawn(async move {
            counter.purchasing().adjust_stock("oil", dec!(850), "Shelf count").await
        });
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        tx.commit().await.unwrap();

        let adjustment = count.await.unwrap().unwrap();
        assert_eq!(adjustment.previous_stock, dec!(900));
        assert_eq!(adjustment.variance_qty, dec!(-50));
        assert_eq!(
            engine.db().ingredients().require("oil").await.unwrap().stock,
            dec!(850)
        );
    }
}
