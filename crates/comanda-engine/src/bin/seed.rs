//! # Seed Data Loader
//!
//! Fills a database with a small pizzeria for development: two branches'
//! ingredients, a catalog with modifiers and packaging, tables, a customer,
//! then rings up one demo sale through the services.
//!
//! ## Usage
//! ```bash
//! # Configured database (comanda.toml / COMANDA_DB_PATH)
//! cargo run -p comanda-engine --bin seed
//!
//! # Explicit database file
//! cargo run -p comanda-engine --bin seed -- --db ./comanda_dev.db
//!
//! # Explicit config file, no demo sale
//! cargo run -p comanda-engine --bin seed -- --config ./comanda.toml --no-sale
//! ```

use std::env;
use std::path::PathBuf;

use rust_decimal::Decimal;
use tracing::info;

use comanda_core::{
    ApplyPer, Customer, Discount, DiscountKind, Ingredient, ModifierGroup, ModifierOption, Money,
    OrderType, PackagingRule, PaymentEntry, PaymentMethod, Product, RecipeLine, Settings, Table,
};
use comanda_engine::logging::init_tracing;
use comanda_engine::{Engine, EngineConfig, ModifierChoice};

const SECOND_BRANCH: &str = "norte";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut demo_sale = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--no-sale" => demo_sale = false,
            "--help" | "-h" => {
                println!("Comanda Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file (overrides the config)");
                println!("      --no-sale        Skip the demo sale");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = EngineConfig::load(config_path.as_deref())?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }
    init_tracing(&config.logging.filter);

    let engine = Engine::open(config).await?;
    let branch = engine.branch_id().to_string();

    if engine.db().products().count().await? > 0 {
        println!("Database already has a catalog, skipping seed.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    seed_ingredients(&engine, &branch).await?;
    seed_catalog(&engine).await?;
    seed_floor(&engine, &branch).await?;
    info!(branch = %branch, "Seed data written");

    if demo_sale {
        ring_up_demo_sale(&engine, &branch).await?;
    }

    let low = engine.db().ingredients().list_below_min(&branch).await?;
    println!("Seed complete. {} ingredient(s) at or below minimum.", low.len());
    Ok(())
}

/// Quantity helper: `q(25, 1)` is 2.5.
fn q(num: i64, scale: u32) -> Decimal {
    Decimal::new(num, scale)
}

fn stocked(id: &str, branch: &str, name: &str, unit: &str, stock: Decimal, cost: Decimal) -> Ingredient {
    let mut ingredient = Ingredient::new(id, branch, name, unit);
    ingredient.stock = stock;
    ingredient.cost = cost;
    ingredient.min_stock = stock / Decimal::from(10);
    ingredient
}

async fn seed_ingredients(engine: &Engine, branch: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ingredients = engine.db().ingredients();

    let mut flour = stocked("flour", branch, "Flour", "g", Decimal::from(20_000), q(12, 4));
    flour.purchase_unit = "kg".to_string();
    flour.conversion_ratio = Decimal::from(1000);

    let rows = vec![
        stocked("mozzarella", branch, "Mozzarella", "g", Decimal::from(5000), q(2, 2)),
        stocked("tomato", branch, "Tomato", "g", Decimal::from(8000), q(4, 3)),
        stocked("bacon", branch, "Bacon", "g", Decimal::from(1500), q(5, 2)),
        stocked("box", branch, "Pizza box", "unit", Decimal::from(200), q(40, 2)),
        stocked("bag", branch, "Paper bag", "unit", Decimal::from(300), q(10, 2)),
        flour,
        // Same names in the second branch: resolved by name at settlement.
        stocked("mozzarella-n", SECOND_BRANCH, "mozzarella", "g", Decimal::from(3000), q(25, 3)),
        stocked("tomato-n", SECOND_BRANCH, "Tomato", "g", Decimal::from(4000), q(5, 3)),
    ];
    for row in &rows {
        ingredients.put(row).await?;
    }

    let mut sauce = stocked("sauce", branch, "Tomato sauce", "ml", Decimal::ZERO, Decimal::ZERO);
    sauce.is_sub_recipe = true;
    sauce.batch_size = Some(Decimal::from(2000));
    sauce.composition = vec![RecipeLine::new("tomato", Decimal::from(2500))];
    ingredients.put(&sauce).await?;

    let produced = engine
        .production()
        .produce_batch("sauce", Decimal::ONE, Decimal::from(2000))
        .await?;
    println!("Produced a batch of tomato sauce: {produced}");
    Ok(())
}

async fn seed_catalog(engine: &Engine) -> Result<(), Box<dyn std::error::Error>> {
    let db = engine.db();

    let mut margherita = Product::new("margherita", "Margherita", "pizzas");
    margherita.prices.insert(OrderType::DineIn, Money::from_cents(1200));
    margherita.prices.insert(OrderType::Takeout, Money::from_cents(1200));
    margherita.prices.insert(OrderType::Delivery, Money::from_cents(1400));
    margherita.ingredients = vec![
        RecipeLine::new("mozzarella", Decimal::from(200)),
        RecipeLine::new("sauce", Decimal::from(120)),
        RecipeLine::new("flour", Decimal::from(250)),
    ];
    margherita.modifier_group_ids = vec!["extras".to_string()];
    db.products().put(&margherita).await?;

    let mut lemonade = Product::new("lemonade", "Lemonade", "drinks");
    lemonade.prices.insert(OrderType::DineIn, Money::from_cents(350));
    lemonade.prices.insert(OrderType::Takeout, Money::from_cents(350));
    db.products().put(&lemonade).await?;

    db.modifiers()
        .put(&ModifierGroup {
            id: "extras".to_string(),
            name: "Extras".to_string(),
            options: vec![ModifierOption {
                id: "bacon".to_string(),
                name: "Extra bacon".to_string(),
                price: Money::from_cents(150),
                recipe: vec![RecipeLine::new("bacon", Decimal::from(40))],
            }],
        })
        .await?;

    db.packaging()
        .put(&PackagingRule {
            id: "pizza-box".to_string(),
            name: "Pizza box".to_string(),
            order_types: vec![OrderType::Takeout, OrderType::Delivery],
            category_ids: vec!["pizzas".to_string()],
            product_ids: vec![],
            apply_per: ApplyPer::Item,
            items: vec![RecipeLine::new("box", Decimal::ONE)],
        })
        .await?;
    db.packaging()
        .put(&PackagingRule {
            id: "bag".to_string(),
            name: "Bag".to_string(),
            order_types: vec![OrderType::Takeout, OrderType::Delivery],
            category_ids: vec![],
            product_ids: vec![],
            apply_per: ApplyPer::Order,
            items: vec![RecipeLine::new("bag", Decimal::ONE)],
        })
        .await?;

    db.discounts()
        .put(&Discount {
            id: "staff".to_string(),
            name: "Staff 10%".to_string(),
            kind: DiscountKind::Percentage,
            value: Decimal::from(10),
            category_ids: vec![],
            schedule: None,
            requires_authorization: true,
        })
        .await?;

    db.settings().put(&Settings::default()).await?;
    Ok(())
}

async fn seed_floor(engine: &Engine, branch: &str) -> Result<(), Box<dyn std::error::Error>> {
    for n in 1..=6 {
        let table = Table::new(format!("{branch}-t{n}"), branch, format!("Mesa {n}"));
        engine.db().tables().put(&table).await?;
    }
    let mut customer = Customer::new("marta", "Marta Gil");
    customer.phone = Some("+34 600 000 000".to_string());
    engine.db().customers().put(&customer).await?;
    Ok(())
}

async fn ring_up_demo_sale(engine: &Engine, branch: &str) -> Result<(), Box<dyn std::error::Error>> {
    let orders = engine.orders();
    let table_id = format!("{branch}-t1");
    let order = orders
        .open_order(branch, Some(&table_id), OrderType::DineIn, Some("marta"))
        .await?;

    let (_, pizza) = orders
        .add_item(order.id(), "margherita", &[ModifierChoice::new("extras", "bacon")], &[])
        .await?;
    orders.change_quantity(order.id(), &pizza, 1).await?;
    orders.add_item(order.id(), "lemonade", &[], &[]).await?;
    orders.send_to_kitchen(order.id()).await?;

    let total = orders.get(order.id()).await?.total;
    let report = engine
        .settlement()
        .close_order(
            order.id(),
            vec![PaymentEntry::new(PaymentMethod::Card, total)],
            Money::from_cents(200),
        )
        .await?;

    println!(
        "Demo sale {} closed: total {}, {} ingredient(s) deducted, {:?} point(s)",
        report.order_id,
        report.total,
        report.deductions.len(),
        report.points_earned
    );
    Ok(())
}
