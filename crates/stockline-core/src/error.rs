//! # Error Types
//!
//! Domain-specific error types for stockline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockline-core errors (this file)                                     │
//! │  ├── CoreError        - Data errors that abort a single sale event     │
//! │  └── ValidationError  - Malformed sale events                          │
//! │                                                                         │
//! │  stockline-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller (log / retry)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! "No mapping", "already processed" and fallback conversions are expected
//! outcomes. They are reported through `DeductionResult`, never here.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Each variant aborts exactly one sale event. The surrounding unit of work
/// is rolled back, so a partial deduction is never visible.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A recipe line points at a product that no longer exists.
    ///
    /// ## When This Occurs
    /// - The product was deleted after the recipe was written
    /// - The product belongs to another restaurant
    #[error("Recipe '{recipe}' references missing product {product_id}")]
    IngredientProductMissing { recipe: String, product_id: String },

    /// A recipe line has a zero, negative or non-numeric quantity.
    ///
    /// Deducting it would raise stock instead of lowering it.
    #[error("Recipe '{recipe}' has an invalid line for product {product_id}: {source}")]
    InvalidIngredient {
        recipe: String,
        product_id: String,
        #[source]
        source: ValidationError,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., NaN quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
