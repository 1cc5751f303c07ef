//! Purchase and transfer documents.
//!
//! Both are written as PENDING by back-office staff and applied to stock
//! by a single receipt transaction, after which they are RECEIVED.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::validate_positive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReceiptStatus {
    Pending,
    Received,
}

impl Default for ReceiptStatus {
    fn default() -> Self {
        ReceiptStatus::Pending
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// One purchased ingredient, in purchase units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub ingredient_id: String,
    #[ts(as = "String")]
    pub quantity: Decimal,
    /// Price paid for the whole line, major units.
    #[ts(as = "String")]
    pub line_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub branch_id: String,
    #[serde(default)]
    pub supplier: Option<String>,
    pub lines: Vec<PurchaseLine>,
    #[serde(default)]
    pub status: ReceiptStatus,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl Purchase {
    /// Fails when already received or when a line has a non-positive
    /// quantity or a negative cost.
    pub fn ensure_receivable(&self) -> CoreResult<()> {
        if self.status == ReceiptStatus::Received {
            return Err(CoreError::AlreadyReceived(self.id.clone()));
        }
        for line in &self.lines {
            validate_positive("purchase quantity", line.quantity)?;
            if line.line_cost < Decimal::ZERO {
                return Err(ValidationError::MustNotBeNegative {
                    field: "line cost".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

// =============================================================================
// Transfers
// =============================================================================

/// One transferred ingredient, in usage units of the source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransferLine {
    /// Ingredient row in the source branch.
    pub ingredient_id: String,
    #[ts(as = "String")]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: String,
    pub from_branch_id: String,
    pub to_branch_id: String,
    pub lines: Vec<TransferLine>,
    #[serde(default)]
    pub status: ReceiptStatus,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl Transfer {
    pub fn ensure_receivable(&self) -> CoreResult<()> {
        if self.status == ReceiptStatus::Received {
            return Err(CoreError::AlreadyReceived(self.id.clone()));
        }
        if self.from_branch_id == self.to_branch_id {
            return Err(CoreError::SameBranchTransfer(self.from_branch_id.clone()));
        }
        for line in &self.lines {
            validate_positive("transfer quantity", line.quantity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transfer(from: &str, to: &str) -> Transfer {
        Transfer {
            id: "tr-1".into(),
            from_branch_id: from.into(),
            to_branch_id: to.into(),
            lines: vec![TransferLine {
                ingredient_id: "cheese".into(),
                quantity: dec!(500),
            }],
            status: ReceiptStatus::Pending,
            received_at: None,
        }
    }

    #[test]
    fn test_transfer_between_distinct_branches() {
        assert!(transfer("b1", "b2").ensure_receivable().is_ok());
        assert!(matches!(
            transfer("b1", "b1").ensure_receivable(),
            Err(CoreError::SameBranchTransfer(_))
        ));
    }

    #[test]
    fn test_received_documents_cannot_be_received_again() {
        let mut t = transfer("b1", "b2");
        t.status = ReceiptStatus::Received;
        assert!(matches!(t.ensure_receivable(), Err(CoreError::AlreadyReceived(_))));
    }

    #[test]
    fn test_purchase_line_validation() {
        let mut p = Purchase {
            id: "po-1".into(),
            branch_id: "b1".into(),
            supplier: None,
            lines: vec![PurchaseLine {
                ingredient_id: "flour".into(),
                quantity: dec!(2),
                line_cost: dec!(30),
            }],
            status: ReceiptStatus::Pending,
            received_at: None,
        };
        assert!(p.ensure_receivable().is_ok());
        p.lines[0].quantity = dec!(0);
        assert!(p.ensure_receivable().is_err());
    }
}
