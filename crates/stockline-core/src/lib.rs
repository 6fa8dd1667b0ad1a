//! # stockline-core: Pure Business Logic for Stockline
//!
//! This crate turns "N units of a POS item sold" into stock and cost deltas
//! without touching a database. The db crate feeds it catalog rows and
//! applies the plans it produces.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockline Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               POS sync (external collaborator)                  │   │
//! │  │    Toast / Square / Clover ──► canonical SaleEvent              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockline-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌─────────────┐  ┌──────────┐ │   │
//! │  │   │   units   │  │ conversion │  │ idempotency │  │ deduction│ │   │
//! │  │   │  Volume   │  │  Resolver  │  │ reference   │  │  Planner │ │   │
//! │  │   │  Weight   │  │  tiers 1-4 │  │    key      │  │          │ │   │
//! │  │   └───────────┘  └────────────┘  └─────────────┘  └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockline-db (Database Layer)                   │   │
//! │  │        catalog lookups, stock decrement, ledger append          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog, ledger and sale event types
//! - [`money`] - Money type with integer arithmetic
//! - [`units`] - Closed enumeration of unit families and their constants
//! - [`conversion`] - Recipe-unit to purchase-unit resolver
//! - [`idempotency`] - Reference keys for duplicate sale detection
//! - [`deduction`] - Planner shared by real and simulated deductions
//! - [`error`] - Domain error types
//! - [`validation`] - Sale event validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockline_core::conversion::resolve;
//! use stockline_core::{ConversionMethod, Money, Product};
//!
//! let vodka = Product::new("p-1", "r-1", "House Vodka", "bottle", Money::from_cents(2000))
//!     .with_size(750.0, "ml");
//!
//! // 10 servings of 1.5 oz each
//! let conversion = resolve(15.0, "oz", &vodka);
//! assert_eq!(conversion.method, ConversionMethod::Volume);
//! assert_eq!(conversion.cost.cents(), 1183); // $11.83
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod conversion;
pub mod deduction;
pub mod error;
pub mod idempotency;
pub mod money;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use conversion::{Conversion, ConversionMethod, ConversionWarning, WarningType};
pub use deduction::{DeductedIngredient, DeductionOutcome, DeductionPlan, DeductionResult, SaleTarget};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a POS item name.
///
/// Vendor connectors truncate well below this; anything longer is a
/// malformed event rather than a real menu item.
pub const MAX_ITEM_NAME_LEN: usize = 200;

/// Ledger actor recorded when the caller does not configure one.
pub const DEFAULT_PERFORMED_BY: &str = "pos-sync";
