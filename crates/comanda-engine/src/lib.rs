//! # comanda-engine: Order & Inventory Services
//!
//! The in-process API the UI layer calls. Every service loads documents from
//! [`comanda_db`], runs the pure rules from [`comanda_core`] and writes the
//! result back, inside one transaction whenever more than one document moves.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Call Flow                                │
//! │                                                                         │
//! │  UI action ("cobrar mesa 4")                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  comanda-engine (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │  Engine ──┬── OrderService       add/split/merge/move/void      │   │
//! │  │  (db,     ├── SettlementService  close_order (atomic)           │   │
//! │  │   config, ├── ProductionService  produce_batch (atomic)         │   │
//! │  │   clock)  └── PurchasingService  receipts, transfers, counts    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                        │                                        │
//! │       ▼                        ▼                                        │
//! │  comanda-core (rules)     comanda-db (documents, tx, print queue)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_engine::{Engine, EngineConfig};
//!
//! let engine = Engine::open(EngineConfig::load(None)?).await?;
//! let order = engine.orders().open_order("centro", Some("t4"), OrderType::DineIn, None).await?;
//! engine.orders().add_item(order.id(), "margherita", &[], &[]).await?;
//! let report = engine.settlement().close_order(order.id(), payments, Money::zero()).await?;
//! ```

use std::sync::Arc;

use tracing::info;

use comanda_db::{Database, DbConfig};

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult, ErrorCode, ErrorResponse};
pub use service::{
    ModifierChoice, OrderService, ProductionService, PurchasingService, SettlementReport,
    SettlementService, StockAdjustment,
};

// =============================================================================
// Engine
// =============================================================================

/// Shared handles every service needs. Cheap to clone.
#[derive(Clone)]
pub struct Engine {
    db: Database,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Engine {
            db,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Opens (and migrates) the configured database.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        let db_config: DbConfig = config.db_config()?;
        let db = Database::new(db_config).await?;
        info!(branch = %config.branch.id, "Engine ready");
        Ok(Engine::new(db, config))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Branch this terminal operates in.
    pub fn branch_id(&self) -> &str {
        &self.config.branch.id
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.clone())
    }

    pub fn settlement(&self) -> SettlementService {
        SettlementService::new(self.clone())
    }

    pub fn production(&self) -> ProductionService {
        ProductionService::new(self.clone())
    }

    pub fn purchasing(&self) -> PurchasingService {
        PurchasingService::new(self.clone())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("branch", &self.config.branch.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_engine_opens_in_memory_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = Engine::new(db, EngineConfig::default());

        assert_eq!(engine.branch_id(), "main");
        assert!(engine.db().health_check().await);
    }
}
