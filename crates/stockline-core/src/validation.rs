//! # Validation Module
//!
//! Input checks for sale events and catalog rows.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POS connector ──► SaleEvent ──► validate_sale_event ← THIS MODULE     │
//! │                                        │                                │
//! │                         Err ◄──────────┤  (before any transaction)      │
//! │                                        ▼                                │
//! │                               DeductionService::deduct                  │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                     SQLite CHECK / NOT NULL constraints                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockline_core::validation::{validate_item_name, validate_quantity_sold};
//!
//! validate_item_name("Moscow Mule").unwrap();
//! validate_quantity_sold(2.0).unwrap();
//! assert!(validate_quantity_sold(0.0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::SaleEvent;
use crate::MAX_ITEM_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a POS item name.
///
/// ## Rules
/// - Must not be blank
/// - At most `MAX_ITEM_NAME_LEN` characters after trimming
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    required_text("pos_item_name", name)
}

/// Validates a restaurant (tenant) id.
pub fn validate_restaurant_id(id: &str) -> ValidationResult<()> {
    required_text("restaurant_id", id)
}

/// Validates a product or recipe name.
///
/// ## Example
/// ```rust
/// use stockline_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Tito's Vodka 750ml").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name)
}

fn required_text(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ITEM_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity on a sale event.
///
/// ## Rules
/// - Must be a finite number
/// - Must be positive (> 0); fractional quantities are allowed
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  quantity_sold                                                          │
/// │       │                                                                 │
/// │       ├── NaN / ±inf? → InvalidFormat                                  │
/// │       ├── <= 0?       → MustBePositive                                 │
/// │       └── OK          → proceed to deduction                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity_sold(quantity: f64) -> ValidationResult<()> {
    positive_finite("quantity_sold", quantity)
}

/// Validates the per-portion quantity on a recipe line.
pub fn validate_ingredient_quantity(quantity: f64) -> ValidationResult<()> {
    positive_finite("quantity", quantity)
}

/// Validates a cost per purchase unit in cents. Zero is allowed.
pub fn validate_cost_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::InvalidFormat {
            field: "cost_per_unit".to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    Ok(())
}

fn positive_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if value <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Event Validators
// =============================================================================

/// Validates a whole sale event. The first failing field is reported.
pub fn validate_sale_event(event: &SaleEvent) -> ValidationResult<()> {
    validate_restaurant_id(&event.restaurant_id)?;
    validate_item_name(&event.pos_item_name)?;
    validate_quantity_sold(event.quantity_sold)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(item: &str, quantity: f64) -> SaleEvent {
        SaleEvent::new(
            "r-1",
            item,
            quantity,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        )
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Moscow Mule").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"A".repeat(MAX_ITEM_NAME_LEN)).is_ok());
        assert!(matches!(
            validate_item_name(&"A".repeat(MAX_ITEM_NAME_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_quantity_sold() {
        assert!(validate_quantity_sold(1.0).is_ok());
        assert!(validate_quantity_sold(0.5).is_ok());

        assert!(matches!(
            validate_quantity_sold(0.0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity_sold(-2.0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity_sold(f64::NAN),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(validate_quantity_sold(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_cost_cents() {
        assert!(validate_cost_cents(0).is_ok());
        assert!(validate_cost_cents(2000).is_ok());
        assert!(validate_cost_cents(-1).is_err());
    }

    #[test]
    fn test_validate_sale_event() {
        assert!(validate_sale_event(&event("Soda Can", 3.0)).is_ok());
        assert!(validate_sale_event(&event("", 3.0)).is_err());
        assert!(validate_sale_event(&event("Soda Can", 0.0)).is_err());

        let mut no_tenant = event("Soda Can", 1.0);
        no_tenant.restaurant_id = " ".to_string();
        assert!(matches!(
            validate_sale_event(&no_tenant),
            Err(ValidationError::Required { field }) if field == "restaurant_id"
        ));
    }
}
