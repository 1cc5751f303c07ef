//! # Production
//!
//! Turns raw stock into sub-recipe stock (sauces, doughs) and rolls the
//! sub-recipe's cost forward by weighted average.
//!
//! ```text
//! produce_batch("salsa", 2 batches, 5 L out)
//!
//!   composition × 2 ──resolve in this branch──► raw rows   stock -= qty
//!   Σ raw cost × qty = input cost
//!   salsa: stock += 5, cost = (stock×cost + input cost) / (stock + 5)
//!   PRODUCTION ticket
//! ```
//!
//! Raw inputs are resolved by name in the terminal's branch, the same way
//! settlement resolves recipes.

use rust_decimal::Decimal;
use tracing::{info, warn};

use comanda_core::print::ProductionTicket;
use comanda_core::{
    plan_batch, BatchPlan, CoreError, Ingredient, IngredientLookup, NameResolver, PrintJob,
    PrintJobType,
};

use crate::error::EngineResult;
use crate::Engine;

#[derive(Debug, Clone)]
pub struct ProductionService {
    engine: Engine,
}

impl ProductionService {
    pub fn new(engine: Engine) -> Self {
        ProductionService { engine }
    }

    /// Produces `batch_count` batches of a sub-recipe yielding `output_qty`
    /// usage units.
    ///
    /// Returns `false`, writing nothing, when the target does not exist or is
    /// not a sub-recipe with a composition. Invalid quantities and store
    /// failures are errors.
    pub async fn produce_batch(
        &self,
        sub_recipe_id: &str,
        batch_count: Decimal,
        output_qty: Decimal,
    ) -> EngineResult<bool> {
        Ok(self
            .produce_batch_report(sub_recipe_id, batch_count, output_qty)
            .await?
            .is_some())
    }

    /// Same as [`produce_batch`](Self::produce_batch) but returns the
    /// applied plan.
    pub async fn produce_batch_report(
        &self,
        sub_recipe_id: &str,
        batch_count: Decimal,
        output_qty: Decimal,
    ) -> EngineResult<Option<BatchPlan>> {
        let branch_id = self.engine.branch_id();
        let mut tx = self.engine.db().begin().await?;

        let Some(mut target) = tx.get::<Ingredient>(sub_recipe_id).await? else {
            warn!(sub_recipe_id, "Production target not found");
            return Ok(None);
        };

        let resolver = NameResolver::new(tx.list::<Ingredient>().await?);
        let plan = match plan_batch(&target, batch_count, output_qty, branch_id, &resolver) {
            Ok(plan) => plan,
            Err(CoreError::NotASubRecipe(id)) => {
                warn!(sub_recipe_id = %id, "Not a sub-recipe with a composition, nothing produced");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        for (ingredient_id, qty) in &plan.consumptions {
            let Some(current) = resolver.ingredient(ingredient_id) else {
                warn!(sub_recipe_id, ingredient_id = %ingredient_id, "Component row missing, skipped");
                continue;
            };
            let mut raw = current.clone();
            raw.stock -= *qty;
            tx.put(&raw).await?;
        }
        for miss in &plan.misses {
            warn!(
                sub_recipe_id,
                reference_id = %miss.reference_id,
                branch_id = %miss.branch_id,
                "Component has no twin in this branch, consuming the reference row"
            );
        }

        target.stock = plan.new_stock;
        target.cost = plan.new_cost;
        tx.put(&target).await?;

        let ticket = PrintJob::Production(ProductionTicket {
            ingredient_id: target.id.clone(),
            name: target.name.clone(),
            batch_count: plan.batch_count,
            output_qty: plan.output_qty,
            unit: target.usage_unit.clone(),
            unit_cost: plan.unit_cost,
        });
        let printer = self.engine.config().printers.for_job(PrintJobType::Production);
        tx.enqueue_print_job(&ticket, printer).await?;
        tx.commit().await?;

        info!(
            sub_recipe_id,
            batches = %plan.batch_count,
            output = %plan.output_qty,
            input_cost = %plan.total_input_cost,
            new_cost = %plan.new_cost,
            "Batch produced"
        );
        Ok(Some(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::service::testing::{self, BRANCH};
    use comanda_core::RecipeLine;
    use rust_decimal_macros::dec;

    /// Tomato sauce: 10 units of tomato (cost 2.0) per batch.
    async fn kitchen() -> Engine {
        let engine = testing::engine().await;
        let db = engine.db();
        db.ingredients()
            .put(&testing::ingredient("tomato", BRANCH, "Tomato", dec!(100), dec!(2.0)))
            .await
            .unwrap();
        let mut sauce = testing::ingredient("sauce", BRANCH, "Tomato sauce", dec!(10), dec!(2.0));
        sauce.is_sub_recipe = true;
        sauce.composition = vec![RecipeLine::new("tomato", dec!(10))];
        db.ingredients().put(&sauce).await.unwrap();
        db.ingredients()
            .put(&testing::ingredient("salt", BRANCH, "Salt", dec!(1000), dec!(0.001)))
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_batch_rolls_weighted_average_cost() {
        let engine = kitchen().await;
        let plan = engine
            .production()
            .produce_batch_report("sauce", dec!(1), dec!(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(plan.total_input_cost, dec!(20));
        assert_eq!(plan.unit_cost, dec!(4));

        let db = engine.db();
        let sauce = db.ingredients().require("sauce").await.unwrap();
        assert_eq!(sauce.stock, dec!(15));
        // (10 x 2.0 + 20) / 15
        assert_eq!(sauce.cost.round_dp(3), dec!(2.667));
        assert_eq!(db.ingredients().require("tomato").await.unwrap().stock, dec!(90));

        let tickets = db.print_queue().get_pending(10).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].job_type, PrintJobType::Production);
    }

    #[tokio::test]
    async fn test_zero_output_keeps_prior_unit_cost() {
        let engine = kitchen().await;
        let plan = engine
            .production()
            .produce_batch_report("sauce", dec!(1), dec!(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(plan.unit_cost, dec!(2.0));

        let sauce = engine.db().ingredients().require("sauce").await.unwrap();
        assert_eq!(sauce.stock, dec!(10));
        // (10 x 2.0 + 20) / 10: the spent inputs still land on the stock
        assert_eq!(sauce.cost, dec!(4));
        assert_eq!(
            engine.db().ingredients().require("tomato").await.unwrap().stock,
            dec!(90)
        );
    }

    #[tokio::test]
    async fn test_raw_ingredient_is_not_producible() {
        let engine = kitchen().await;
        let produced = engine
            .production()
            .produce_batch("salt", dec!(1), dec!(1))
            .await
            .unwrap();
        assert!(!produced);
        let db = engine.db();
        assert_eq!(db.ingredients().require("salt").await.unwrap().stock, dec!(1000));
        assert_eq!(db.print_queue().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_target_returns_false() {
        let engine = kitchen().await;
        assert!(!engine
            .production()
            .produce_batch("ghost", dec!(1), dec!(1))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_zero_batches_is_a_validation_error() {
        let engine = kitchen().await;
        let err = engine
            .production()
            .produce_batch("sauce", dec!(0), dec!(5))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(
            engine.db().ingredients().require("tomato").await.unwrap().stock,
            dec!(100)
        );
    }
}
