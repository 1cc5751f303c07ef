//! # Database Pool Management
//!
//! Connection pool creation and the [`Database`] handle services receive.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Handle                                    │
//! │                                                                         │
//! │  DbConfig::new(path) ──► Database::new(config).await                   │
//! │                               │  create pool + run migrations          │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Database (cheap to clone)                                       │  │
//! │  │                                                                  │  │
//! │  │  SqlitePool ─────────────┐   ChangeFeed ────────┐  write lock    │  │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ │   broadcast<Coll.>   │  Mutex<()>    │  │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │                      │               │  │
//! │  │  └─────┘ └─────┘ └─────┘ │                      │               │  │
//! │  └──────────┬───────────────┴──────────┬───────────┴───────┬───────┘  │
//! │             ▼                          ▼                   ▼          │
//! │   db.orders(), db.ingredients()   db.watch::<Order>()   db.begin()     │
//! │   single-document access          live snapshots        atomic writes │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so readers don't block
//! the writer and vice versa.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::document::Document;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    CustomerRepository, DiscountRepository, DocumentRepository, IngredientRepository,
    ModifierRepository, OrderRepository, PackagingRepository, PrintQueueRepository,
    ProductRepository, PurchaseRepository, SettingsRepository, TableRepository,
    TransferRepository,
};
use crate::transaction::DocTransaction;
use crate::watch::{ChangeFeed, CollectionWatch, DEFAULT_FEED_CAPACITY};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/comanda.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,

    /// Buffered change notifications per subscriber before it lags.
    pub change_feed_capacity: usize,
}

impl DbConfig {
    /// Creates a configuration for the given file. The file is created if it
    /// doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            change_feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Each in-memory connection is its own database, so the pool is pinned
    /// to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
            change_feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository, transaction and watch access.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./comanda.db")).await?;
/// let open = db.orders().list_active("branch-1").await?;
///
/// let mut tx = db.begin().await?;
/// // ... reads and writes across collections ...
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    changes: ChangeFeed,
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Creates the connection pool and runs migrations (if enabled).
    ///
    /// SQLite is configured with WAL journaling, NORMAL synchronous and
    /// foreign keys on.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            // May lose the last transaction on power loss, never corrupts
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            changes: ChangeFeed::new(config.change_feed_capacity),
            write_lock: Arc::new(Mutex::new(())),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// The connection pool, for queries not covered by repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The change feed watchers subscribe to.
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    /// Starts a multi-document transaction.
    ///
    /// ## Note
    /// With a single-connection pool (in-memory databases) the transaction
    /// holds the only connection: don't use repositories until it ends.
    pub async fn begin(&self) -> DbResult<DocTransaction> {
        DocTransaction::begin(&self.pool, self.changes.clone(), self.write_lock.clone()).await
    }

    /// Subscribes to changes of one collection.
    pub fn watch<D: Document>(&self) -> CollectionWatch<D> {
        CollectionWatch::new(self.pool.clone(), self.changes.subscribe())
    }

    /// Generic repository for any collection.
    pub fn collection<D: Document>(&self) -> DocumentRepository<D> {
        DocumentRepository::new(self.pool.clone(), self.changes.clone())
    }

    pub fn ingredients(&self) -> IngredientRepository {
        self.collection()
    }

    pub fn products(&self) -> ProductRepository {
        self.collection()
    }

    pub fn orders(&self) -> OrderRepository {
        self.collection()
    }

    pub fn tables(&self) -> TableRepository {
        self.collection()
    }

    pub fn customers(&self) -> CustomerRepository {
        self.collection()
    }

    pub fn discounts(&self) -> DiscountRepository {
        self.collection()
    }

    pub fn modifiers(&self) -> ModifierRepository {
        self.collection()
    }

    pub fn packaging(&self) -> PackagingRepository {
        self.collection()
    }

    pub fn purchases(&self) -> PurchaseRepository {
        self.collection()
    }

    pub fn transfers(&self) -> TransferRepository {
        self.collection()
    }

    pub fn settings(&self) -> SettingsRepository {
        self.collection()
    }

    pub fn print_queue(&self) -> PrintQueueRepository {
        PrintQueueRepository::new(self.pool.clone())
    }

    /// Closes the pool. Every later operation fails.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Whether the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
