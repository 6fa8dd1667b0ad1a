//! # Repository Module
//!
//! Database repository implementations for Stockline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Catalog tooling / seed bin          DeductionService                   │
//! │       │                                   │                             │
//! │       │ db.products().insert(..)          │ same SQL, run on the        │
//! │       ▼                                   ▼ transaction's connection    │
//! │  ProductRepository ── RecipeRepository ── LedgerRepository              │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository wraps the pool for standalone calls. The statements a
//! deduction needs are also exposed as free functions over
//! `&mut SqliteConnection`, so the service can run them inside its own
//! transaction.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products and stock
//! - [`RecipeRepository`](recipe::RecipeRepository) - Recipes and ingredient lines
//! - [`LedgerRepository`](ledger::LedgerRepository) - Ledger rows and claims

pub mod ledger;
pub mod product;
pub mod recipe;
