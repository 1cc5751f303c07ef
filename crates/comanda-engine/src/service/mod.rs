//! # Services
//!
//! One service per workflow. Each holds a clone of the [`Engine`] and is
//! created on demand (`engine.orders()`, `engine.settlement()`, ...).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service            Writes                         Atomic?             │
//! │  ─────────────────  ─────────────────────────────  ──────────────────  │
//! │  OrderService       order (+ tables on move/merge/ tx when a table or  │
//! │                     split/void/open)               a second order     │
//! │                                                    moves              │
//! │  SettlementService  order, table, ingredients,     always             │
//! │                     customer, RECEIPT job                              │
//! │  ProductionService  ingredients, PRODUCTION job    always             │
//! │  PurchasingService  ingredients, purchase or       always             │
//! │                     transfer, TRANSFER job                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod orders;
mod production;
mod purchasing;
mod settlement;

pub use orders::{ModifierChoice, OrderService};
pub use production::ProductionService;
pub use purchasing::{PurchasingService, StockAdjustment};
pub use settlement::{SettlementReport, SettlementService};

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the service tests.

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use comanda_core::{Ingredient, Money, OrderType, Product, RecipeLine, Table};
    use comanda_db::{Database, DbConfig};

    use crate::{Engine, EngineConfig, FixedClock};

    pub const BRANCH: &str = "main";

    /// Engine over a fresh in-memory store, clock pinned to
    /// Friday 2024-06-07 20:00.
    pub async fn engine() -> Engine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 6, 7)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        Engine::new(db, EngineConfig::default()).with_clock(FixedClock::at(at))
    }

    pub fn ingredient(id: &str, branch: &str, name: &str, stock: Decimal, cost: Decimal) -> Ingredient {
        let mut ingredient = Ingredient::new(id, branch, name, "g");
        ingredient.stock = stock;
        ingredient.cost = cost;
        ingredient
    }

    /// Product priced for every order type.
    pub fn product(id: &str, name: &str, category: &str, cents: i64, recipe: Vec<RecipeLine>) -> Product {
        let mut product = Product::new(id, name, category);
        for order_type in [OrderType::DineIn, OrderType::Takeout, OrderType::Delivery] {
            product.prices.insert(order_type, Money::from_cents(cents));
        }
        product.ingredients = recipe;
        product
    }

    pub async fn table(engine: &Engine, id: &str) -> Table {
        let table = Table::new(id, BRANCH, format!("Mesa {id}"));
        engine.db().tables().put(&table).await.unwrap();
        table
    }
}
