//! # stockline-db: Persistence and Deduction for Stockline
//!
//! SQLite storage for the catalog and the ledger, plus the transactional
//! service that applies POS sale events to stock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockline Data Flow                              │
//! │                                                                         │
//! │  POS sync (webhooks, batch imports)                                    │
//! │       │  SaleEvent                                                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockline-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐   ┌───────────────┐   ┌──────────────┐   │   │
//! │  │   │DeductionService│──►│ Repositories  │   │  Migrations  │   │   │
//! │  │   │ deduct         │   │ products      │   │  (embedded)  │   │   │
//! │  │   │ simulate       │   │ recipes       │   │              │   │   │
//! │  │   │ deduct_batch   │   │ ledger        │   │ 001_init.sql │   │   │
//! │  │   └───────┬────────┘   └───────────────┘   └──────────────┘   │   │
//! │  │           │ plan()                                             │   │
//! │  │           ▼                                                    │   │
//! │  │   stockline-core (conversion, planning, validation)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product, recipe and ledger repositories
//! - [`deduction`] - The deduction service
//! - [`config`] - TOML / environment configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockline_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockline.db")).await?;
//!
//! let event = SaleEvent::new("r-1", "Soda Can", 7.0, today).with_order_id("ord-981");
//! let result = db.deductions().deduct(&event).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod deduction;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use deduction::{BatchEntry, BatchReport, DeductionService};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::ledger::{LedgerRepository, StockDrift};
pub use repository::product::ProductRepository;
pub use repository::recipe::RecipeRepository;
