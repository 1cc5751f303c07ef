//! # Documents & Collections
//!
//! Maps domain types onto collection tables and provides the SQL shared by
//! repositories and transactions.
//!
//! ## Row Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  <collection table>                                                     │
//! │                                                                         │
//! │  id │ branch_id │ status │ normalized_name │ body (JSON) │ updated_at   │
//! │  ───┼───────────┼────────┼─────────────────┼─────────────┼──────────    │
//! │  o1 │ b1        │ OPEN   │ NULL            │ {"id":"o1"…}│ 2024-…       │
//! │                                                                         │
//! │  `body` is the source of truth. The middle columns are filled from      │
//! │  `Document::index()` on every write so queries can filter without       │
//! │  parsing JSON.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every helper is generic over the executor, so the same code runs against
//! the pool (single-document writes) or inside a [`DocTransaction`].
//!
//! [`DocTransaction`]: crate::transaction::DocTransaction

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Executor, Sqlite};
use std::fmt;

use comanda_core::{
    Customer, Discount, Ingredient, ModifierGroup, Order, PackagingRule, Product, Purchase,
    Settings, Table, Transfer,
};

use crate::error::DbResult;

// =============================================================================
// Collections
// =============================================================================

/// The document collections of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Ingredients,
    Products,
    Orders,
    Tables,
    Customers,
    Discounts,
    Modifiers,
    Packaging,
    Purchases,
    Transfers,
    Settings,
}

impl Collection {
    /// Table backing the collection.
    pub const fn table(&self) -> &'static str {
        match self {
            Collection::Ingredients => "ingredients",
            Collection::Products => "products",
            Collection::Orders => "orders",
            Collection::Tables => "tables",
            Collection::Customers => "customers",
            Collection::Discounts => "discounts",
            Collection::Modifiers => "modifiers",
            Collection::Packaging => "packaging",
            Collection::Purchases => "purchases",
            Collection::Transfers => "transfers",
            Collection::Settings => "settings",
        }
    }

    /// Singular name used in error messages.
    pub const fn entity(&self) -> &'static str {
        match self {
            Collection::Ingredients => "Ingredient",
            Collection::Products => "Product",
            Collection::Orders => "Order",
            Collection::Tables => "Table",
            Collection::Customers => "Customer",
            Collection::Discounts => "Discount",
            Collection::Modifiers => "Modifier group",
            Collection::Packaging => "Packaging rule",
            Collection::Purchases => "Purchase",
            Collection::Transfers => "Transfer",
            Collection::Settings => "Settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Filterable column values extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentIndex {
    pub branch_id: Option<String>,
    pub status: Option<String>,
    pub normalized_name: Option<String>,
}

/// A type stored in one collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn index(&self) -> DocumentIndex {
        DocumentIndex::default()
    }
}

// =============================================================================
// Document Implementations
// =============================================================================

impl Document for Ingredient {
    const COLLECTION: Collection = Collection::Ingredients;

    fn id(&self) -> &str {
        &self.id
    }

    fn index(&self) -> DocumentIndex {
        DocumentIndex {
            branch_id: Some(self.branch_id.clone()),
            status: None,
            normalized_name: Some(self.normalized_name()),
        }
    }
}

impl Document for Order {
    const COLLECTION: Collection = Collection::Orders;

    fn id(&self) -> &str {
        &self.id
    }

    fn index(&self) -> DocumentIndex {
        DocumentIndex {
            branch_id: Some(self.branch_id.clone()),
            status: Some(self.status.as_str().to_string()),
            normalized_name: None,
        }
    }
}

impl Document for Table {
    const COLLECTION: Collection = Collection::Tables;

    fn id(&self) -> &str {
        &self.id
    }

    fn index(&self) -> DocumentIndex {
        DocumentIndex {
            branch_id: Some(self.branch_id.clone()),
            ..DocumentIndex::default()
        }
    }
}

impl Document for Purchase {
    const COLLECTION: Collection = Collection::Purchases;

    fn id(&self) -> &str {
        &self.id
    }

    fn index(&self) -> DocumentIndex {
        DocumentIndex {
            branch_id: Some(self.branch_id.clone()),
            ..DocumentIndex::default()
        }
    }
}

impl Document for Transfer {
    const COLLECTION: Collection = Collection::Transfers;

    fn id(&self) -> &str {
        &self.id
    }

    /// Indexed by destination: that branch receives the transfer.
    fn index(&self) -> DocumentIndex {
        DocumentIndex {
            branch_id: Some(self.to_branch_id.clone()),
            ..DocumentIndex::default()
        }
    }
}

macro_rules! global_document {
    ($ty:ty, $collection:expr) => {
        impl Document for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

global_document!(Product, Collection::Products);
global_document!(Customer, Collection::Customers);
global_document!(Discount, Collection::Discounts);
global_document!(ModifierGroup, Collection::Modifiers);
global_document!(PackagingRule, Collection::Packaging);

/// Id of the single settings document.
pub const SETTINGS_ID: &str = "global";

impl Document for Settings {
    const COLLECTION: Collection = Collection::Settings;

    fn id(&self) -> &str {
        SETTINGS_ID
    }
}

// =============================================================================
// Shared SQL
// =============================================================================

/// Filterable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexColumn {
    BranchId,
    Status,
    NormalizedName,
}

impl IndexColumn {
    const fn name(&self) -> &'static str {
        match self {
            IndexColumn::BranchId => "branch_id",
            IndexColumn::Status => "status",
            IndexColumn::NormalizedName => "normalized_name",
        }
    }
}

fn decode<D: Document>(body: &str) -> DbResult<D> {
    Ok(serde_json::from_str(body)?)
}

pub(crate) async fn fetch<'e, E, D>(executor: E, id: &str) -> DbResult<Option<D>>
where
    E: Executor<'e, Database = Sqlite>,
    D: Document,
{
    let sql = format!("SELECT body FROM {} WHERE id = ?1", D::COLLECTION.table());
    let body: Option<String> = sqlx::query_scalar::<Sqlite, String>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    body.as_deref().map(decode).transpose()
}

pub(crate) async fn fetch_all<'e, E, D>(executor: E) -> DbResult<Vec<D>>
where
    E: Executor<'e, Database = Sqlite>,
    D: Document,
{
    let sql = format!("SELECT body FROM {} ORDER BY id", D::COLLECTION.table());
    let bodies: Vec<String> = sqlx::query_scalar::<Sqlite, String>(&sql)
        .fetch_all(executor)
        .await?;
    bodies.iter().map(|b| decode(b)).collect()
}

pub(crate) async fn fetch_where<'e, E, D>(
    executor: E,
    column: IndexColumn,
    value: &str,
) -> DbResult<Vec<D>>
where
    E: Executor<'e, Database = Sqlite>,
    D: Document,
{
    let sql = format!(
        "SELECT body FROM {} WHERE {} = ?1 ORDER BY id",
        D::COLLECTION.table(),
        column.name()
    );
    let bodies: Vec<String> = sqlx::query_scalar::<Sqlite, String>(&sql)
        .bind(value)
        .fetch_all(executor)
        .await?;
    bodies.iter().map(|b| decode(b)).collect()
}

/// Inserts or fully replaces a document.
pub(crate) async fn upsert<'e, E, D>(executor: E, doc: &D) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
    D: Document,
{
    let index = doc.index();
    let body = serde_json::to_string(doc)?;
    let sql = format!(
        r#"
        INSERT INTO {} (id, branch_id, status, normalized_name, body, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            branch_id = excluded.branch_id,
            status = excluded.status,
            normalized_name = excluded.normalized_name,
            body = excluded.body,
            updated_at = excluded.updated_at
        "#,
        D::COLLECTION.table()
    );
    sqlx::query(&sql)
        .bind(doc.id())
        .bind(index.branch_id)
        .bind(index.status)
        .bind(index.normalized_name)
        .bind(body)
        .bind(Utc::now())
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn remove<'e, E>(executor: E, collection: Collection, id: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("DELETE FROM {} WHERE id = ?1", collection.table());
    let result = sqlx::query(&sql).bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count<'e, E>(executor: E, collection: Collection) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
    let count: i64 = sqlx::query_scalar::<Sqlite, i64>(&sql)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_core::{OrderStatus, OrderType};

    #[test]
    fn test_order_index_carries_branch_and_status() {
        let mut order = Order::new("o1", "b1", OrderType::Takeout, Utc::now());
        order.status = OrderStatus::Cooking;
        let index = order.index();
        assert_eq!(index.branch_id.as_deref(), Some("b1"));
        assert_eq!(index.status.as_deref(), Some("COOKING"));
    }

    #[test]
    fn test_ingredient_index_uses_normalized_name() {
        let ing = Ingredient::new("i1", "b1", " Mozzarella", "g");
        assert_eq!(ing.index().normalized_name.as_deref(), Some("mozzarella"));
    }

    #[test]
    fn test_settings_is_a_singleton() {
        assert_eq!(Settings::default().id(), SETTINGS_ID);
        assert_eq!(<Settings as Document>::COLLECTION.table(), "settings");
    }
}
