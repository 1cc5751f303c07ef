//! # Repository Module
//!
//! Single-document access to every collection.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service                                                                │
//! │       │  db.ingredients().find_by_name("b2", "Mozzarella")              │
//! │       ▼                                                                 │
//! │  DocumentRepository<Ingredient>                                         │
//! │  ├── get / require / list / list_by_branch / count   (every collection)│
//! │  ├── put / delete                     (publish a change notification)  │
//! │  └── find_by_name / list_below_min        (ingredient.rs, extra impl)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite table `ingredients`                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes here are single statements. Anything that must change several
//! documents together goes through [`DocTransaction`](crate::DocTransaction).
//!
//! ## Available Repositories
//!
//! - [`IngredientRepository`] - Branch stock rows, name lookup, low stock
//! - [`OrderRepository`] - Orders by branch and status
//! - [`SettingsRepository`] - Business settings singleton
//! - [`PrintQueueRepository`] - Print job outbox
//! - the remaining collections use [`DocumentRepository`] directly

pub mod ingredient;
pub mod order;
pub mod print_queue;
pub mod settings;

use sqlx::SqlitePool;
use std::marker::PhantomData;
use tracing::debug;

use comanda_core::{
    Customer, Discount, Ingredient, ModifierGroup, Order, PackagingRule, Product, Purchase,
    Settings, Table, Transfer,
};

use crate::document::{self, Document, IndexColumn};
use crate::error::{DbError, DbResult};
use crate::watch::ChangeFeed;

pub use print_queue::{PrintQueueEntry, PrintQueueRepository};

pub type IngredientRepository = DocumentRepository<Ingredient>;
pub type ProductRepository = DocumentRepository<Product>;
pub type OrderRepository = DocumentRepository<Order>;
pub type TableRepository = DocumentRepository<Table>;
pub type CustomerRepository = DocumentRepository<Customer>;
pub type DiscountRepository = DocumentRepository<Discount>;
pub type ModifierRepository = DocumentRepository<ModifierGroup>;
pub type PackagingRepository = DocumentRepository<PackagingRule>;
pub type PurchaseRepository = DocumentRepository<Purchase>;
pub type TransferRepository = DocumentRepository<Transfer>;
pub type SettingsRepository = DocumentRepository<Settings>;

/// Repository over one document collection.
#[derive(Debug)]
pub struct DocumentRepository<D> {
    pool: SqlitePool,
    changes: ChangeFeed,
    _doc: PhantomData<fn() -> D>,
}

impl<D> Clone for DocumentRepository<D> {
    fn clone(&self) -> Self {
        DocumentRepository {
            pool: self.pool.clone(),
            changes: self.changes.clone(),
            _doc: PhantomData,
        }
    }
}

impl<D: Document> DocumentRepository<D> {
    pub fn new(pool: SqlitePool, changes: ChangeFeed) -> Self {
        DocumentRepository {
            pool,
            changes,
            _doc: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<D>> {
        debug!(collection = %D::COLLECTION, id = %id, "Fetching document");
        document::fetch(&self.pool, id).await
    }

    /// Like [`get`](Self::get) but a missing document is an error.
    pub async fn require(&self, id: &str) -> DbResult<D> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(D::COLLECTION.entity(), id))
    }

    pub async fn list(&self) -> DbResult<Vec<D>> {
        document::fetch_all(&self.pool).await
    }

    /// Documents whose indexed branch matches. Collections without a branch
    /// column return nothing.
    pub async fn list_by_branch(&self, branch_id: &str) -> DbResult<Vec<D>> {
        document::fetch_where(&self.pool, IndexColumn::BranchId, branch_id).await
    }

    /// Inserts or replaces the whole document (last writer wins).
    pub async fn put(&self, doc: &D) -> DbResult<()> {
        debug!(collection = %D::COLLECTION, id = %doc.id(), "Writing document");
        document::upsert(&self.pool, doc).await?;
        self.changes.publish(D::COLLECTION);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(collection = %D::COLLECTION, id = %id, "Deleting document");
        let removed = document::remove(&self.pool, D::COLLECTION, id).await?;
        if removed {
            self.changes.publish(D::COLLECTION);
        }
        Ok(removed)
    }

    pub async fn count(&self) -> DbResult<i64> {
        document::count(&self.pool, D::COLLECTION).await
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use comanda_core::{Money, OrderType, Product};

    fn pizza() -> Product {
        let mut p = Product::new("p1", "Margherita", "pizza");
        p.prices.insert(OrderType::DineIn, Money::from_cents(1200));
        p
    }

    #[tokio::test]
    async fn test_put_get_roundtrip_keeps_prices() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().put(&pizza()).await.unwrap();

        let back = db.products().require("p1").await.unwrap();
        assert_eq!(back.price_for(OrderType::DineIn), Some(Money::from_cents(1200)));
    }

    #[tokio::test]
    async fn test_put_replaces_whole_document() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.put(&pizza()).await.unwrap();

        let mut renamed = pizza();
        renamed.name = "Margherita DOP".to_string();
        renamed.prices.clear();
        repo.put(&renamed).await.unwrap();

        let back = repo.require("p1").await.unwrap();
        assert_eq!(back.name, "Margherita DOP");
        assert!(back.prices.is_empty());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_require_missing_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.customers().require("c404").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_removed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().put(&pizza()).await.unwrap();
        assert!(db.products().delete("p1").await.unwrap());
        assert!(!db.products().delete("p1").await.unwrap());
    }
}
