//! Business settings consumed by the engine (read-only from its side).

use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;

/// A loyalty tier reached at `min_points`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyTier {
    pub name: String,
    pub min_points: i64,
}

/// The settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub currency_symbol: String,
    /// Overhead rate (percent) applied in margin reports.
    #[ts(as = "String")]
    pub indirect_cost_rate: Decimal,
    /// Commission percent per delivery platform name.
    #[ts(as = "BTreeMap<String, String>")]
    pub platform_commissions: BTreeMap<String, Decimal>,
    /// Spend needed for one loyalty point. Zero disables accrual.
    pub spending_per_point: Money,
    #[ts(as = "Vec<String>")]
    pub double_points_days: Vec<Weekday>,
    /// Ordered by `min_points`.
    pub loyalty_tiers: Vec<LoyaltyTier>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            currency_symbol: "$".to_string(),
            indirect_cost_rate: Decimal::ZERO,
            platform_commissions: BTreeMap::new(),
            spending_per_point: Money::from_cents(1000),
            double_points_days: Vec::new(),
            loyalty_tiers: Vec::new(),
        }
    }
}

impl Settings {
    /// Formats an amount with the configured symbol.
    pub fn format_money(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}
