//! # comanda-db: Document Store for Comanda
//!
//! SQLite-backed document collections with multi-document transactions,
//! change notifications and a print-job outbox.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Data Flow                                │
//! │                                                                         │
//! │  comanda-engine service (close_order, produce_batch, ...)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    comanda-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌───────────┐  ┌─────────┐  │   │
//! │  │  │  Database  │  │ Repositories │  │DocTransac-│  │  Watch  │  │   │
//! │  │  │  (pool.rs) │◄─│ one per      │  │tion       │  │ change  │  │   │
//! │  │  │ SqlitePool │  │ collection   │  │ atomic    │  │ feed    │  │   │
//! │  │  └────────────┘  └──────────────┘  └───────────┘  └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │  document.rs: Collection ↔ table, Document trait, shared SQL    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL). Tables: ingredients, products, orders, ...,         │
//! │  print_jobs                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`document`] - Collections and the [`Document`] trait
//! - [`repository`] - Single-document repositories and the print queue
//! - [`transaction`] - [`DocTransaction`] for all-or-nothing writes
//! - [`watch`] - Change notifications and [`CollectionWatch`]
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("comanda.db")).await?;
//! let low = db.ingredients().list_below_min("branch-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod transaction;
pub mod watch;

// =============================================================================
// Re-exports
// =============================================================================

pub use document::{Collection, Document, DocumentIndex};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use transaction::DocTransaction;
pub use watch::{ChangeFeed, CollectionWatch};

pub use repository::{
    CustomerRepository, DiscountRepository, DocumentRepository, IngredientRepository,
    ModifierRepository, OrderRepository, PackagingRepository, PrintQueueEntry,
    PrintQueueRepository, ProductRepository, PurchaseRepository, SettingsRepository,
    TableRepository, TransferRepository,
};
