//! # Weighted-Average Costing
//!
//! Stock receipts (purchases, transfers, production) blend the incoming
//! value into the ingredient's unit cost.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │             old_stock × old_cost + incoming_value                       │
//! │  new_cost = ─────────────────────────────────────                       │
//! │                 old_stock + incoming_qty                                │
//! │                                                                         │
//! │  Denominator 0  → keep old_cost (never NaN / Infinity in a cost field)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Production plans live here as well: a batch consumes raw ingredients
//! resolved in the producing branch and yields sub-recipe stock.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Ingredient;
use crate::deduction::{DeductionSource, ResolutionMiss};
use crate::error::{CoreError, CoreResult};
use crate::resolver::{IngredientResolver, Resolution};
use crate::validation::{validate_non_negative, validate_positive};

/// Blended unit cost after receiving `incoming_qty` worth `incoming_value`.
///
/// ```rust
/// use comanda_core::costing::weighted_average;
/// use rust_decimal::Decimal;
///
/// let cost = weighted_average(Decimal::from(10), Decimal::from(2), Decimal::from(5), Decimal::from(20));
/// assert_eq!(cost.round_dp(3), Decimal::new(2667, 3));
/// ```
pub fn weighted_average(
    old_stock: Decimal,
    old_cost: Decimal,
    incoming_qty: Decimal,
    incoming_value: Decimal,
) -> Decimal {
    let new_stock = old_stock + incoming_qty;
    if new_stock.is_zero() {
        return old_cost;
    }
    (old_stock * old_cost + incoming_value) / new_stock
}

/// Adds stock to an ingredient and rolls its cost forward.
pub fn receive_stock(ingredient: &mut Ingredient, qty: Decimal, value: Decimal) {
    ingredient.cost = weighted_average(ingredient.stock, ingredient.cost, qty, value);
    ingredient.stock += qty;
}

// =============================================================================
// Production
// =============================================================================

/// Everything a production run writes, computed before any write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    pub sub_recipe_id: String,
    pub batch_count: Decimal,
    pub output_qty: Decimal,
    /// Resolved raw ingredient id to usage units consumed.
    pub consumptions: BTreeMap<String, Decimal>,
    pub total_input_cost: Decimal,
    /// This batch's own unit cost.
    pub unit_cost: Decimal,
    pub new_stock: Decimal,
    pub new_cost: Decimal,
    pub misses: Vec<ResolutionMiss>,
}

/// Plans `batch_count` batches of `sub_recipe`, yielding `output_qty`
/// usage units, with raw inputs resolved in `branch_id`.
///
/// Fails with `NotASubRecipe` when the target is not a sub-recipe or has an
/// empty composition.
pub fn plan_batch<R>(
    sub_recipe: &Ingredient,
    batch_count: Decimal,
    output_qty: Decimal,
    branch_id: &str,
    resolver: &R,
) -> CoreResult<BatchPlan>
where
    R: IngredientResolver + ?Sized,
{
    if !sub_recipe.is_producible() {
        return Err(CoreError::NotASubRecipe(sub_recipe.id.clone()));
    }
    validate_positive("batch count", batch_count)?;
    validate_non_negative("output quantity", output_qty)?;

    let mut consumptions: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut misses = Vec::new();
    let mut total_input_cost = Decimal::ZERO;

    for line in &sub_recipe.composition {
        let resolution = resolver.resolve(&line.ingredient_id, branch_id);
        if let Resolution::Fallback(_) = &resolution {
            misses.push(ResolutionMiss {
                reference_id: line.ingredient_id.clone(),
                branch_id: branch_id.to_string(),
                source: DeductionSource::Recipe,
            });
        }
        let id = resolution.into_id();
        let qty = line.quantity * batch_count;
        if let Some(raw) = resolver.ingredient(&id) {
            total_input_cost += raw.cost * qty;
        }
        *consumptions.entry(id).or_insert(Decimal::ZERO) += qty;
    }

    let unit_cost = if output_qty.is_zero() {
        sub_recipe.cost
    } else {
        total_input_cost / output_qty
    };

    Ok(BatchPlan {
        sub_recipe_id: sub_recipe.id.clone(),
        batch_count,
        output_qty,
        consumptions,
        total_input_cost,
        unit_cost,
        new_stock: sub_recipe.stock + output_qty,
        new_cost: weighted_average(sub_recipe.stock, sub_recipe.cost, output_qty, total_input_cost),
        misses,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
