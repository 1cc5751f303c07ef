//! # Multi-Document Transactions
//!
//! Settlement, production and stock receipts touch several collections and
//! must land all-or-nothing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut tx = db.begin().await?;          BEGIN (write lock held)       │
//! │  let order: Order = tx.require(id)?;      read-your-writes              │
//! │  tx.put(&order)?; tx.put(&ingredient)?;   buffered in SQLite txn        │
//! │  tx.enqueue_print_job(&job, printer)?;    outbox row, same txn          │
//! │  tx.commit().await?;                      COMMIT → publish changes      │
//! │                                                                         │
//! │  Dropping `tx` without commit rolls everything back and publishes       │
//! │  nothing.                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write transactions are serialized within the process by an async mutex,
//! so a read-then-write sequence never races another one in this process.

use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use comanda_core::PrintJob;

use crate::document::{self, Collection, Document, IndexColumn};
use crate::error::{DbError, DbResult};
use crate::repository::print_queue::{self, PrintQueueEntry};
use crate::watch::ChangeFeed;

/// An open transaction over the document store.
pub struct DocTransaction {
    tx: Transaction<'static, Sqlite>,
    touched: BTreeSet<Collection>,
    changes: ChangeFeed,
    write_guard: OwnedMutexGuard<()>,
}

impl DocTransaction {
    pub(crate) async fn begin(
        pool: &SqlitePool,
        changes: ChangeFeed,
        write_lock: Arc<Mutex<()>>,
    ) -> DbResult<Self> {
        let guard = write_lock.lock_owned().await;
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Transaction started");

        Ok(DocTransaction {
            tx,
            touched: BTreeSet::new(),
            changes,
            write_guard: guard,
        })
    }

    pub async fn get<D: Document>(&mut self, id: &str) -> DbResult<Option<D>> {
        document::fetch(&mut *self.tx, id).await
    }

    pub async fn require<D: Document>(&mut self, id: &str) -> DbResult<D> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(D::COLLECTION.entity(), id))
    }

    pub async fn list<D: Document>(&mut self) -> DbResult<Vec<D>> {
        document::fetch_all(&mut *self.tx).await
    }

    pub async fn list_by_branch<D: Document>(&mut self, branch_id: &str) -> DbResult<Vec<D>> {
        document::fetch_where(&mut *self.tx, IndexColumn::BranchId, branch_id).await
    }

    pub async fn put<D: Document>(&mut self, doc: &D) -> DbResult<()> {
        document::upsert(&mut *self.tx, doc).await?;
        self.touched.insert(D::COLLECTION);
        Ok(())
    }

    pub async fn delete<D: Document>(&mut self, id: &str) -> DbResult<bool> {
        let removed = document::remove(&mut *self.tx, D::COLLECTION, id).await?;
        if removed {
            self.touched.insert(D::COLLECTION);
        }
        Ok(removed)
    }

    pub async fn enqueue_print_job(
        &mut self,
        job: &PrintJob,
        printer_name: &str,
    ) -> DbResult<PrintQueueEntry> {
        print_queue::insert_job(&mut *self.tx, job, printer_name).await
    }

    /// Collections written so far.
    pub fn touched(&self) -> impl Iterator<Item = Collection> + '_ {
        self.touched.iter().copied()
    }

    /// Commits and then notifies watchers of every touched collection.
    pub async fn commit(self) -> DbResult<()> {
        let DocTransaction {
            tx,
            touched,
            changes,
            write_guard,
        } = self;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        drop(write_guard);

        debug!(collections = touched.len(), "Transaction committed");
        for collection in touched {
            changes.publish(collection);
        }
        Ok(())
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Transaction rolled back");
        Ok(())
    }
}
