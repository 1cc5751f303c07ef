//! # Customers & Loyalty
//!
//! Point accrual at settlement.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  earned = floor(order.total / spending_per_point)                       │
//! │           × 2 when today is a double-points day                         │
//! │                                                                         │
//! │  customer.points += earned                                              │
//! │  customer.visits += 1                                                   │
//! │  customer.last_visit = closed_at                                        │
//! │  customer.current_tier = highest tier with min_points ≤ points          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::settings::{LoyaltyTier, Settings};

/// A loyalty customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub visits: i64,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub last_visit: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_tier: Option<String>,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Customer {
            id: id.into(),
            name: name.into(),
            phone: None,
            points: 0,
            visits: 0,
            last_visit: None,
            current_tier: None,
        }
    }

    /// Books a paid visit and returns the points earned.
    pub fn record_visit(
        &mut self,
        order_total: Money,
        settings: &Settings,
        at: DateTime<Utc>,
        weekday: Weekday,
    ) -> i64 {
        let earned = earned_points(order_total, settings, weekday);
        self.points += earned;
        self.visits += 1;
        self.last_visit = Some(at);
        self.current_tier = tier_for(self.points, &settings.loyalty_tiers).map(|t| t.name.clone());
        earned
    }
}

/// Points earned for a total, doubled on the configured weekdays.
pub fn earned_points(total: Money, settings: &Settings, weekday: Weekday) -> i64 {
    let base = total.whole_units_of(settings.spending_per_point);
    if settings.double_points_days.contains(&weekday) {
        base * 2
    } else {
        base
    }
}

/// Highest tier whose threshold is reached.
pub fn tier_for(points: i64, tiers: &[LoyaltyTier]) -> Option<&LoyaltyTier> {
    tiers
        .iter()
        .filter(|t| t.min_points <= points)
        .max_by_key(|t| t.min_points)
}

// =============================================================================
// Unit Tests
// =============================================================================
