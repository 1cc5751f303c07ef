//! # Print Jobs
//!
//! Job descriptors appended to the print queue. A separate consumer renders
//! and dispatches them.
//!
//! Each job type carries only its own payload:
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────────────┐
//! │ COMMAND      │ kitchen ticket: unprinted lines with modifiers           │
//! │ BILL         │ pre-check: lines, discount, service charge, total        │
//! │ RECEIPT      │ bill + tenders + tip                                     │
//! │ SHIFT_REPORT │ cash register summary                                    │
//! │ TRANSFER     │ transferred ingredients between branches                 │
//! │ PRODUCTION   │ produced sub-recipe batch                                │
//! └──────────────┴──────────────────────────────────────────────────────────┘
//! ```
//!
//! Serialized as `{"type": "BILL", "payload": {...}}`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::order::{Order, OrderItem};
use crate::types::{OrderType, PaymentEntry};

/// Discriminant of a [`PrintJob`], stored as its own column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintJobType {
    Command,
    Bill,
    Receipt,
    ShiftReport,
    Transfer,
    Production,
}

impl PrintJobType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PrintJobType::Command => "COMMAND",
            PrintJobType::Bill => "BILL",
            PrintJobType::Receipt => "RECEIPT",
            PrintJobType::ShiftReport => "SHIFT_REPORT",
            PrintJobType::Transfer => "TRANSFER",
            PrintJobType::Production => "PRODUCTION",
        }
    }
}

impl fmt::Display for PrintJobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// One line of a kitchen ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketLine {
    pub name: String,
    pub quantity: i64,
    pub modifiers: Vec<String>,
    /// Names (or ids) of base ingredients to leave out.
    pub without: Vec<String>,
}

impl From<&OrderItem> for TicketLine {
    fn from(item: &OrderItem) -> Self {
        TicketLine {
            name: item.name.clone(),
            quantity: item.quantity,
            modifiers: item.modifiers.iter().map(|m| m.name.clone()).collect(),
            without: item.excluded_ingredient_ids.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct KitchenTicket {
    pub order_id: String,
    pub table_id: Option<String>,
    pub order_type: OrderType,
    pub lines: Vec<TicketLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Pre-check contents, also embedded in receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillPayload {
    pub order_id: String,
    pub table_id: Option<String>,
    pub lines: Vec<BillLine>,
    pub subtotal: Money,
    pub discount_name: Option<String>,
    pub discount_amount: Money,
    pub is_courtesy: bool,
    pub service_charge: Money,
    pub total: Money,
}

impl From<&Order> for BillPayload {
    fn from(order: &Order) -> Self {
        BillPayload {
            order_id: order.id.clone(),
            table_id: order.table_id.clone(),
            lines: order
                .items
                .iter()
                .map(|i| BillLine {
                    name: i.name.clone(),
                    quantity: i.quantity,
                    unit_price: i.price,
                    line_total: i.line_total(),
                })
                .collect(),
            subtotal: order.subtotal,
            discount_name: order.applied_discount.as_ref().map(|d| d.name.clone()),
            discount_amount: order.discount_amount,
            is_courtesy: order.is_courtesy,
            service_charge: order.service_charge,
            total: order.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub bill: BillPayload,
    pub payments: Vec<PaymentEntry>,
    pub tip: Money,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<&Order> for ReceiptPayload {
    fn from(order: &Order) -> Self {
        ReceiptPayload {
            bill: BillPayload::from(order),
            payments: order.payment_methods.clone(),
            tip: order.tip,
            closed_at: order.closed_at,
        }
    }
}

/// Cash register summary. Produced by the register module, carried here so
/// the queue can hold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReportPayload {
    pub register_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    pub starting_cash: Money,
    pub expected_cash: Money,
    pub counted_cash: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransferTicketLine {
    pub name: String,
    #[ts(as = "String")]
    pub quantity: Decimal,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransferTicket {
    pub transfer_id: String,
    pub from_branch_id: String,
    pub to_branch_id: String,
    pub lines: Vec<TransferTicketLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductionTicket {
    pub ingredient_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub batch_count: Decimal,
    #[ts(as = "String")]
    pub output_qty: Decimal,
    pub unit: String,
    #[ts(as = "String")]
    pub unit_cost: Decimal,
}

// =============================================================================
// Print Job
// =============================================================================

/// A print job, tagged by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintJob {
    Command(KitchenTicket),
    Bill(BillPayload),
    Receipt(ReceiptPayload),
    ShiftReport(ShiftReportPayload),
    Transfer(TransferTicket),
    Production(ProductionTicket),
}

impl PrintJob {
    pub fn job_type(&self) -> PrintJobType {
        match self {
            PrintJob::Command(_) => PrintJobType::Command,
            PrintJob::Bill(_) => PrintJobType::Bill,
            PrintJob::Receipt(_) => PrintJobType::Receipt,
            PrintJob::ShiftReport(_) => PrintJobType::ShiftReport,
            PrintJob::Transfer(_) => PrintJobType::Transfer,
            PrintJob::Production(_) => PrintJobType::Production,
        }
    }

    /// Kitchen ticket for the given (just printed) items.
    pub fn kitchen_ticket(order: &Order, items: &[OrderItem]) -> Self {
        PrintJob::Command(KitchenTicket {
            order_id: order.id.clone(),
            table_id: order.table_id.clone(),
            order_type: order.order_type,
            lines: items.iter().map(TicketLine::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_serializes_with_type_tag() {
        let mut order = Order::new("o1", "b1", OrderType::DineIn, Utc::now());
        order.total = Money::from_cents(2400);
        let job = PrintJob::Bill(BillPayload::from(&order));

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "BILL");
        assert_eq!(value["payload"]["orderId"], "o1");
        assert_eq!(job.job_type(), PrintJobType::Bill);

        let back: PrintJob = serde_json::from_value(value).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_job_type_names() {
        assert_eq!(PrintJobType::ShiftReport.to_string(), "SHIFT_REPORT");
        assert_eq!(PrintJobType::Command.as_str(), "COMMAND");
    }
}
