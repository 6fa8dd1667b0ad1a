//! # Domain Types
//!
//! Catalog, ledger and sale event types used throughout Stockline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │    Product      │   │     Recipe      │   │  RecipeIngredient    │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  uom_purchase   │◄──│  pos_item_name  │──►│  quantity + unit     │  │
//! │  │  size + package │   │  is_active      │   │  (per unit sold)     │  │
//! │  │  current_stock  │   └─────────────────┘   └──────────────────────┘  │
//! │  └────────┬────────┘                                                    │
//! │           │ decremented by a SaleEvent                                  │
//! │           ▼                                                             │
//! │  ┌──────────────────────────┐                                           │
//! │  │  InventoryTransaction    │  append-only, signed, keyed by            │
//! │  │  (ledger row)            │  reference_id                             │
//! │  └──────────────────────────┘                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::idempotency;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A stocked product, counted in purchase units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Restaurant this product belongs to.
    pub restaurant_id: String,

    /// Display name. Also the key for density overrides.
    pub name: String,

    /// When set, selling this POS item deducts the product directly.
    pub pos_item_name: Option<String>,

    /// Stock on hand in purchase units. Never negative.
    pub current_stock: f64,

    /// Cost per purchase unit in cents.
    pub cost_per_unit_cents: i64,

    /// Unit the product is bought and counted in (bottle, lb, case, ...).
    pub uom_purchase: String,

    /// Default unit recipes use for this product.
    pub uom_recipe: Option<String>,

    /// Legacy recipe-units-per-purchase-unit scalar.
    pub conversion_factor: Option<f64>,

    /// Physical size of one purchase unit (750 for a 750 ml bottle).
    pub size_value: Option<f64>,

    /// Unit of `size_value`.
    pub size_unit: Option<String>,

    /// Inner units per purchase unit (24 for a case of 24).
    pub package_qty: Option<f64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with no size metadata and zero stock.
    pub fn new(
        id: impl Into<String>,
        restaurant_id: impl Into<String>,
        name: impl Into<String>,
        uom_purchase: impl Into<String>,
        cost_per_unit: Money,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            name: name.into(),
            pos_item_name: None,
            current_stock: 0.0,
            cost_per_unit_cents: cost_per_unit.cents(),
            uom_purchase: uom_purchase.into(),
            uom_recipe: None,
            conversion_factor: None,
            size_value: None,
            size_unit: None,
            package_qty: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the physical package size.
    pub fn with_size(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.size_value = Some(value);
        self.size_unit = Some(unit.into());
        self
    }

    /// Sets the number of inner units per purchase unit.
    pub fn with_package_qty(mut self, qty: f64) -> Self {
        self.package_qty = Some(qty);
        self
    }

    /// Sets the stock on hand.
    pub fn with_stock(mut self, stock: f64) -> Self {
        self.current_stock = stock;
        self
    }

    /// Sets the direct-sale POS alias.
    pub fn with_pos_item_name(mut self, name: impl Into<String>) -> Self {
        self.pos_item_name = Some(name.into());
        self
    }

    /// Sets the legacy conversion factor.
    pub fn with_conversion_factor(mut self, factor: f64) -> Self {
        self.conversion_factor = Some(factor);
        self
    }

    /// Sets the default recipe unit.
    pub fn with_recipe_unit(mut self, unit: impl Into<String>) -> Self {
        self.uom_recipe = Some(unit.into());
        self
    }

    /// Returns the cost per purchase unit as Money.
    #[inline]
    pub fn cost_per_unit(&self) -> Money {
        Money::from_cents(self.cost_per_unit_cents)
    }

    /// Returns the package size when both value and unit are present and
    /// the value is usable.
    pub fn package_size(&self) -> Option<(f64, &str)> {
        match (self.size_value, self.size_unit.as_deref()) {
            (Some(value), Some(unit)) if value > 0.0 && value.is_finite() && !unit.trim().is_empty() => {
                Some((value, unit))
            }
            _ => None,
        }
    }

    /// Inner units per purchase unit, defaulting to one.
    pub fn package_quantity(&self) -> f64 {
        match self.package_qty {
            Some(qty) if qty > 0.0 && qty.is_finite() => qty,
            _ => 1.0,
        }
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// A menu item built from ingredients. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Recipe {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Name the POS reports for this recipe, when it differs from `name`.
    pub pos_item_name: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(id: impl Into<String>, restaurant_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Recipe {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            name: name.into(),
            pos_item_name: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_pos_item_name(mut self, name: impl Into<String>) -> Self {
        self.pos_item_name = Some(name.into());
        self
    }
}

// =============================================================================
// Recipe Ingredient
// =============================================================================

/// One line of a recipe: how much of a product one unit sold consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipeIngredient {
    pub id: String,
    pub recipe_id: String,
    pub product_id: String,
    /// Quantity per one unit sold, in `unit`.
    pub quantity: f64,
    /// Recipe unit. Blank means "the product's uom_recipe".
    pub unit: String,
}

impl RecipeIngredient {
    pub fn new(
        id: impl Into<String>,
        recipe_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        RecipeIngredient {
            id: id.into(),
            recipe_id: recipe_id.into(),
            product_id: product_id.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Classification of a ledger row.
///
/// Only `Usage` is written by the deduction engine. The other kinds come
/// from purchasing and manual adjustments that share the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Consumption by a sale.
    Usage,
    /// Stock received from a supplier.
    Purchase,
    /// Manual count correction.
    Adjustment,
    /// Spoilage, breakage, comps.
    Waste,
    /// Moved between locations.
    Transfer,
}

impl TransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Usage => "usage",
            TransactionType::Purchase => "purchase",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Waste => "waste",
            TransactionType::Transfer => "transfer",
        }
    }
}

// =============================================================================
// Inventory Transaction
// =============================================================================

/// A ledger row. Quantity and cost are signed; consumption is negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryTransaction {
    pub id: String,
    pub restaurant_id: String,
    pub product_id: String,
    /// Signed quantity in purchase units.
    pub quantity: f64,
    /// Signed cost in cents.
    pub cost_cents: i64,
    pub transaction_type: TransactionType,
    pub reason: Option<String>,
    /// Idempotency key of the sale event that produced this row.
    pub reference_id: Option<String>,
    pub performed_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    /// Returns the signed cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

// =============================================================================
// Sale Event
// =============================================================================

/// One sold POS line, as handed over by the POS sync layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleEvent {
    pub restaurant_id: String,
    /// Item name as the POS reports it.
    pub pos_item_name: String,
    /// Units sold. Must be positive.
    pub quantity_sold: f64,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    /// Vendor order id. Strengthens the idempotency key when present.
    #[serde(default)]
    pub external_order_id: Option<String>,
    /// Time of sale. Only used as the ledger timestamp.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub sale_time: Option<NaiveTime>,
}

impl SaleEvent {
    pub fn new(
        restaurant_id: impl Into<String>,
        pos_item_name: impl Into<String>,
        quantity_sold: f64,
        sale_date: NaiveDate,
    ) -> Self {
        SaleEvent {
            restaurant_id: restaurant_id.into(),
            pos_item_name: pos_item_name.into(),
            quantity_sold,
            sale_date,
            external_order_id: None,
            sale_time: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.external_order_id = Some(order_id.into());
        self
    }

    pub fn with_sale_time(mut self, time: NaiveTime) -> Self {
        self.sale_time = Some(time);
        self
    }

    /// Idempotency key for this event.
    pub fn reference_key(&self) -> String {
        idempotency::reference_key(
            self.external_order_id.as_deref(),
            &self.pos_item_name,
            self.sale_date,
        )
    }

    /// Timestamp to record on the ledger rows, if the POS supplied one.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.sale_time
            .map(|time| self.sale_date.and_time(time).and_utc())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn test_package_size_requires_value_and_unit() {
        let bare = Product::new("p", "r", "Gin", "bottle", Money::from_cents(2500));
        assert_eq!(bare.package_size(), None);

        let sized = bare.clone().with_size(750.0, "ml");
        assert_eq!(sized.package_size(), Some((750.0, "ml")));

        let mut zero = sized.clone();
        zero.size_value = Some(0.0);
        assert_eq!(zero.package_size(), None);

        let mut blank = sized;
        blank.size_unit = Some("  ".to_string());
        assert_eq!(blank.package_size(), None);
    }

    #[test]
    fn test_package_quantity_defaults_to_one() {
        let product = Product::new("p", "r", "Cola", "case", Money::zero());
        assert_eq!(product.package_quantity(), 1.0);
        assert_eq!(product.clone().with_package_qty(24.0).package_quantity(), 24.0);
        assert_eq!(product.with_package_qty(-3.0).package_quantity(), 1.0);
    }

    #[test]
    fn test_transaction_type_as_str() {
        assert_eq!(TransactionType::Usage.as_str(), "usage");
        assert_eq!(TransactionType::Waste.as_str(), "waste");
    }

    #[test]
    fn test_sale_event_deserializes_without_optionals() {
        let json = r#"{
            "restaurant_id": "r-1",
            "pos_item_name": "Soda Can",
            "quantity_sold": 7,
            "sale_date": "2026-03-14"
        }"#;
        let event: SaleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.quantity_sold, 7.0);
        assert_eq!(event.sale_date, date());
        assert!(event.external_order_id.is_none());
        assert!(event.occurred_at().is_none());
    }

    #[test]
    fn test_occurred_at_combines_date_and_time() {
        let event = SaleEvent::new("r-1", "Soda Can", 1.0, date())
            .with_sale_time(NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        let at = event.occurred_at().unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-14T19:30:00+00:00");
    }
}
