//! # Unit Conversion Resolver
//!
//! Converts a recipe-unit quantity into purchase units and cost for one
//! product.
//!
//! ## Resolution Tiers (first match wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. DIRECT MATCH     recipe unit == purchase unit          → "1:1"      │
//! │                                                                         │
//! │  2. CONTAINER        bottle/jar/can/bag/box/case/package/container     │
//! │     with size data   ├── volume package: recipe "oz" is FLUID          │
//! │                      ├── volume ↔ volume  (ml ratio)     → "volume"    │
//! │                      ├── weight ↔ weight  (g ratio)      → "weight"    │
//! │                      └── cups of rice/flour/sugar/butter                │
//! │                          vs weight package               → "density"   │
//! │                                                                         │
//! │  3. MEASURE          purchase unit is itself lb, kg, gal, l, ...       │
//! │                      ├── size data: ratio vs size × package_qty        │
//! │                      └── no size: qty / conversion_factor (default 1)  │
//! │                                               → "conversion_factor"    │
//! │                                                                         │
//! │  4. COUNT / UNKNOWN  explicit factor ≠ 1: qty / conversion_factor      │
//! │                                                                         │
//! │     FALLBACK         nothing applies (container without usable size,   │
//! │                      unknown units, incompatible families)             │
//! │                                               → "fallback_1:1"         │
//! │                      + warning returned as data                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver never fails. A sale must never be blocked by incomplete
//! catalog data: accuracy degrades to 1:1 and the caller is told so.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::types::Product;
use crate::units::{density_grams_per_cup, same_symbol, Unit, ML_PER_CUP};

// =============================================================================
// Conversion Method
// =============================================================================

/// How a purchase quantity was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ConversionMethod {
    /// Recipe unit equals purchase unit.
    #[serde(rename = "1:1")]
    DirectMatch,
    /// POS item sold as a product; one sold is one purchase unit.
    #[serde(rename = "direct_sale")]
    DirectSale,
    /// Milliliter ratio.
    #[serde(rename = "volume")]
    Volume,
    /// Gram ratio.
    #[serde(rename = "weight")]
    Weight,
    /// Recipe volume converted to grams through a density override.
    #[serde(rename = "density")]
    Density,
    /// Legacy recipe-units-per-purchase-unit scalar.
    #[serde(rename = "conversion_factor")]
    ConversionFactor,
    /// Nothing applied; deducted 1:1.
    #[serde(rename = "fallback_1:1")]
    Fallback,
}

impl ConversionMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConversionMethod::DirectMatch => "1:1",
            ConversionMethod::DirectSale => "direct_sale",
            ConversionMethod::Volume => "volume",
            ConversionMethod::Weight => "weight",
            ConversionMethod::Density => "density",
            ConversionMethod::ConversionFactor => "conversion_factor",
            ConversionMethod::Fallback => "fallback_1:1",
        }
    }
}

impl fmt::Display for ConversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Warnings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum WarningType {
    #[serde(rename = "fallback_1:1")]
    Fallback,
}

/// Non-blocking notice attached to a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConversionWarning {
    pub warning_type: WarningType,
    pub message: String,
}

// =============================================================================
// Conversion
// =============================================================================

/// Result of resolving one ingredient line against its product.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Quantity in the product's purchase unit.
    pub purchase_quantity: f64,
    /// `purchase_quantity × cost_per_unit`, rounded to the cent.
    pub cost: Money,
    pub method: ConversionMethod,
    pub warning: Option<ConversionWarning>,
}

impl Conversion {
    fn new(purchase_quantity: f64, method: ConversionMethod, product: &Product) -> Self {
        Conversion {
            purchase_quantity,
            cost: product.cost_per_unit().multiply_fractional(purchase_quantity),
            method,
            warning: None,
        }
    }

    /// A direct product sale: one unit sold is one purchase unit.
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::conversion::Conversion;
    /// use stockline_core::{ConversionMethod, Money, Product};
    ///
    /// let soda = Product::new("p-2", "r-1", "Soda", "can", Money::from_cents(250));
    /// let conversion = Conversion::direct_sale(7.0, &soda);
    /// assert_eq!(conversion.purchase_quantity, 7.0);
    /// assert_eq!(conversion.cost.cents(), 1750);
    /// assert_eq!(conversion.method, ConversionMethod::DirectSale);
    /// ```
    pub fn direct_sale(quantity_sold: f64, product: &Product) -> Self {
        Conversion::new(quantity_sold, ConversionMethod::DirectSale, product)
    }

    pub fn is_fallback(&self) -> bool {
        self.method == ConversionMethod::Fallback
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Converts `recipe_quantity` of `recipe_unit` into the product's purchase
/// unit and prices it.
///
/// A blank `recipe_unit` means the product's own `uom_recipe` (or, failing
/// that, its purchase unit).
///
/// ## Example
/// ```rust
/// use stockline_core::conversion::resolve;
/// use stockline_core::{ConversionMethod, Money, Product};
///
/// let lime_juice = Product::new("p-3", "r-1", "Lime Juice", "bottle", Money::from_cents(800));
///
/// // No size data: deducted 1:1 with a warning, never an error
/// let conversion = resolve(2.0, "oz", &lime_juice);
/// assert_eq!(conversion.method, ConversionMethod::Fallback);
/// assert_eq!(conversion.purchase_quantity, 2.0);
/// assert!(conversion.warning.is_some());
/// ```
pub fn resolve(recipe_quantity: f64, recipe_unit: &str, product: &Product) -> Conversion {
    let recipe_unit = effective_recipe_unit(recipe_unit, product);

    // Tier 1
    if same_symbol(recipe_unit, &product.uom_purchase) {
        return Conversion::new(recipe_quantity, ConversionMethod::DirectMatch, product);
    }

    let recipe = Unit::parse(recipe_unit);
    let purchase = Unit::parse(&product.uom_purchase);

    let resolved = match purchase {
        // Tier 2
        Unit::Container(_) => product.package_size().and_then(|(size, size_unit)| {
            measure_ratio(recipe_quantity, recipe, size, Unit::parse(size_unit), &product.name)
        }),

        // Tier 3
        Unit::Volume(_) | Unit::Weight(_) | Unit::Ounce => match product.package_size() {
            Some((size, size_unit)) => measure_ratio(
                recipe_quantity,
                recipe,
                size * product.package_quantity(),
                Unit::parse(size_unit),
                &product.name,
            ),
            None => Some((
                recipe_quantity / factor_or_one(product),
                ConversionMethod::ConversionFactor,
            )),
        },

        // Tier 4
        Unit::Count | Unit::Unknown => legacy_factor(recipe_quantity, product),
    };

    if let Some((purchase_quantity, method)) = resolved {
        return Conversion::new(purchase_quantity, method, product);
    }

    let mut conversion = Conversion::new(recipe_quantity, ConversionMethod::Fallback, product);
    conversion.warning = Some(ConversionWarning {
        warning_type: WarningType::Fallback,
        message: fallback_message(recipe_unit, recipe, purchase, product),
    });
    conversion
}

/// The unit a recipe line is really expressed in: its own unit, else the
/// product's `uom_recipe`, else the purchase unit.
pub fn effective_recipe_unit<'a>(recipe_unit: &'a str, product: &'a Product) -> &'a str {
    if !recipe_unit.trim().is_empty() {
        return recipe_unit;
    }
    product
        .uom_recipe
        .as_deref()
        .filter(|unit| !unit.trim().is_empty())
        .unwrap_or(&product.uom_purchase)
}

/// Ratio of a recipe measure to a package measure, or None when the two
/// cannot be compared.
///
/// A bare "oz" is fluid on whichever side faces a volume unit. The one
/// exception is a weight-sized package of a density-listed ingredient,
/// where "oz" on the package stays a weight ounce.
fn measure_ratio(
    recipe_quantity: f64,
    recipe: Unit,
    package_amount: f64,
    package: Unit,
    product_name: &str,
) -> Option<(f64, ConversionMethod)> {
    if package_amount <= 0.0 || !package_amount.is_finite() {
        return None;
    }

    let density = density_grams_per_cup(product_name);
    let recipe_ounce_is_fluid = package.is_volume();
    let package_ounce_is_fluid = recipe.is_volume() && density.is_none();

    if let (Some(r), Some(p)) = (
        recipe.as_volume(recipe_ounce_is_fluid),
        package.as_volume(package_ounce_is_fluid),
    ) {
        let recipe_ml = recipe_quantity * r.milliliters();
        let package_ml = package_amount * p.milliliters();
        return Some((recipe_ml / package_ml, ConversionMethod::Volume));
    }

    if let (Some(r), Some(p)) = (recipe.as_weight(), package.as_weight()) {
        let recipe_g = recipe_quantity * r.grams();
        let package_g = package_amount * p.grams();
        return Some((recipe_g / package_g, ConversionMethod::Weight));
    }

    if let (Unit::Volume(r), Some(p), Some(grams_per_cup)) = (recipe, package.as_weight(), density) {
        let recipe_g = recipe_quantity * r.milliliters() / ML_PER_CUP * grams_per_cup;
        let package_g = package_amount * p.grams();
        return Some((recipe_g / package_g, ConversionMethod::Density));
    }

    None
}

/// The product's conversion factor. Missing, non-finite or non-positive
/// factors count as 1.
fn factor_or_one(product: &Product) -> f64 {
    match product.conversion_factor {
        Some(factor) if factor.is_finite() && factor > 0.0 => factor,
        _ => 1.0,
    }
}

/// `recipe_quantity / conversion_factor` when a factor other than 1 is set.
fn legacy_factor(recipe_quantity: f64, product: &Product) -> Option<(f64, ConversionMethod)> {
    let factor = factor_or_one(product);
    (factor != 1.0).then(|| (recipe_quantity / factor, ConversionMethod::ConversionFactor))
}

fn fallback_message(recipe_unit: &str, recipe: Unit, purchase: Unit, product: &Product) -> String {
    let reason = match (purchase, product.package_size()) {
        (Unit::Container(_), None) => "container has no size data".to_string(),
        (Unit::Container(_), Some((_, size_unit))) => format!(
            "'{}' does not convert to package unit '{}'",
            recipe_unit.trim(),
            size_unit.trim()
        ),
        _ => format!("{} unit cannot be converted to {} unit", recipe, purchase),
    };

    format!(
        "No conversion from '{}' to '{}' for {} ({}); deducted 1:1",
        recipe_unit.trim(),
        product.uom_purchase.trim(),
        product.name,
        reason
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn product(name: &str, uom: &str, cost_cents: i64) -> Product {
        Product::new("p-1", "r-1", name, uom, Money::from_cents(cost_cents))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_direct_match_is_exact() {
        let lemons = product("Lemons", "Each", 35);
        let conversion = resolve(3.25, "each", &lemons);

        assert_eq!(conversion.method, ConversionMethod::DirectMatch);
        assert_eq!(conversion.purchase_quantity, 3.25);
        assert_eq!(conversion.cost.cents(), 114); // 113.75 → 114
        assert!(conversion.warning.is_none());
    }

    #[test]
    fn test_bottle_of_spirits_in_fluid_ounces() {
        // 10 servings × 1.5 oz of a $20.00 750 ml bottle
        let vodka = product("House Vodka", "bottle", 2000).with_size(750.0, "ml");
        let conversion = resolve(15.0, "oz", &vodka);

        assert_eq!(conversion.method, ConversionMethod::Volume);
        assert_close(conversion.purchase_quantity, 443.6025 / 750.0);
        assert!((conversion.purchase_quantity - 0.5915).abs() < 0.0001);
        assert_eq!(conversion.cost.cents(), 1183);
    }

    #[test]
    fn test_ounce_is_fluid_against_volume_and_weight_against_weight() {
        let syrup = product("Simple Syrup", "jar", 1000).with_size(1000.0, "ml");
        let cheese = product("Parmesan", "bag", 1000).with_size(1000.0, "g");

        let fluid = resolve(1.0, "oz", &syrup);
        let weight = resolve(1.0, "oz", &cheese);

        assert_eq!(fluid.method, ConversionMethod::Volume);
        assert_close(fluid.purchase_quantity * 1000.0, 29.5735);
        assert_eq!(weight.method, ConversionMethod::Weight);
        assert_close(weight.purchase_quantity * 1000.0, 28.3495);
    }

    #[test]
    fn test_container_volume_units_cross_convert() {
        let milk = product("Whole Milk", "container", 450).with_size(1.0, "gal");
        let conversion = resolve(2.0, "cup", &milk);

        assert_eq!(conversion.method, ConversionMethod::Volume);
        assert_close(conversion.purchase_quantity, 2.0 * 236.588 / 3785.41);
    }

    #[test]
    fn test_container_weight_units_cross_convert() {
        let parmesan = product("Parmesan", "bag", 2400).with_size(2.0, "lb");
        let conversion = resolve(3.0, "oz", &parmesan);

        assert_eq!(conversion.method, ConversionMethod::Weight);
        assert!((conversion.purchase_quantity - 0.09375).abs() < 1e-6);
        assert_eq!(conversion.cost.cents(), 225);
    }

    #[test]
    fn test_density_override_for_cups_of_rice() {
        // 5 cups of rice from a 25 lb bag
        let rice = product("Jasmine Rice", "bag", 3000).with_size(25.0, "lb");
        let conversion = resolve(5.0, "cup", &rice);

        assert_eq!(conversion.method, ConversionMethod::Density);
        assert_close(conversion.purchase_quantity, 925.0 / (25.0 * 453.592));
        assert_eq!(conversion.cost.cents(), 245);
    }

    #[test]
    fn test_density_override_with_ounce_sized_bag() {
        // "oz" on a flour bag is a weight ounce
        let flour = product("Bread Flour", "bag", 500).with_size(80.0, "oz");
        let conversion = resolve(1.0, "cup", &flour);

        assert_eq!(conversion.method, ConversionMethod::Density);
        assert_close(conversion.purchase_quantity, 120.0 / (80.0 * 28.3495));
    }

    #[test]
    fn test_volume_recipe_without_density_is_fallback_against_weight_package() {
        let olive_oil = product("Olive Oil", "jar", 1200).with_size(500.0, "g");
        let conversion = resolve(2.0, "tbsp", &olive_oil);

        assert_eq!(conversion.method, ConversionMethod::Fallback);
        assert_eq!(conversion.purchase_quantity, 2.0);
        let warning = conversion.warning.unwrap();
        assert_eq!(warning.warning_type, WarningType::Fallback);
        assert!(warning.message.contains("Olive Oil"));
    }

    #[test]
    fn test_container_without_size_falls_back() {
        let bitters = product("Bitters", "bottle", 1500);
        let conversion = resolve(0.25, "oz", &bitters);

        assert!(conversion.is_fallback());
        assert_eq!(conversion.purchase_quantity, 0.25);
        assert!(conversion
            .warning
            .unwrap()
            .message
            .contains("container has no size data"));
    }

    #[test]
    fn test_container_ignores_conversion_factor() {
        let bitters = product("Bitters", "bottle", 1500).with_conversion_factor(16.0);
        let conversion = resolve(4.0, "oz", &bitters);

        assert!(conversion.is_fallback());
        assert_eq!(conversion.purchase_quantity, 4.0);
        assert_eq!(conversion.cost.cents(), 6000);
        assert_eq!(
            conversion.warning.unwrap().warning_type,
            WarningType::Fallback
        );

        // Size data in the wrong family does not reach the factor either
        let syrup = product("Simple Syrup", "jar", 800)
            .with_size(500.0, "g")
            .with_conversion_factor(10.0);
        let conversion = resolve(2.0, "tbsp", &syrup);
        assert!(conversion.is_fallback());
        assert_eq!(conversion.purchase_quantity, 2.0);
    }

    #[test]
    fn test_count_unit_uses_conversion_factor() {
        let eggs = product("Eggs", "dozen", 480).with_conversion_factor(12.0);
        let conversion = resolve(3.0, "each", &eggs);

        assert_eq!(conversion.method, ConversionMethod::ConversionFactor);
        assert_close(conversion.purchase_quantity, 0.25);
        assert!(conversion.warning.is_none());
    }

    #[test]
    fn test_measure_purchase_unit_uses_size_times_package_qty() {
        // purchase unit "kg" described as 2 × 500 g
        let coffee = product("Espresso Beans", "kg", 2800)
            .with_size(500.0, "g")
            .with_package_qty(2.0);
        let conversion = resolve(250.0, "g", &coffee);

        assert_eq!(conversion.method, ConversionMethod::Weight);
        assert_close(conversion.purchase_quantity, 0.25);
        assert_eq!(conversion.cost.cents(), 700);
    }

    #[test]
    fn test_measure_purchase_unit_prefers_legacy_factor_without_size() {
        let lemons = product("Lemons", "lb", 199).with_conversion_factor(4.0);
        let conversion = resolve(2.0, "each", &lemons);

        assert_eq!(conversion.method, ConversionMethod::ConversionFactor);
        assert_close(conversion.purchase_quantity, 0.5);
    }

    #[test]
    fn test_measure_purchase_unit_without_size_divides_by_factor() {
        // No size data and no factor: 1:1 under the legacy method
        let chicken = product("Chicken Breast", "lb", 450);
        let conversion = resolve(6.0, "oz", &chicken);
        assert_eq!(conversion.method, ConversionMethod::ConversionFactor);
        assert_eq!(conversion.purchase_quantity, 6.0);
        assert_eq!(conversion.cost.cents(), 2700);
        assert!(conversion.warning.is_none());

        // Non-positive factors count as 1
        let milk = product("Whole Milk", "gal", 450).with_conversion_factor(-3.0);
        let conversion = resolve(2.0, "cups", &milk);
        assert_eq!(conversion.method, ConversionMethod::ConversionFactor);
        assert_eq!(conversion.purchase_quantity, 2.0);
    }

    #[test]
    fn test_measure_purchase_unit_with_incompatible_size_falls_back() {
        let oil = product("Fryer Oil", "gal", 2500).with_size(1.0, "gal");
        let conversion = resolve(100.0, "g", &oil);

        assert!(conversion.is_fallback());
        assert_eq!(conversion.purchase_quantity, 100.0);
    }

    #[test]
    fn test_fallback_is_total() {
        let pairs = [
            ("each", "bottle"),
            ("slice", "case"),
            ("pinch", "bag"),
            ("ml", "each"),
            ("g", "box"),
            ("smidge", "whatsit"),
            ("cup", "each"),
        ];

        for (recipe_unit, purchase_unit) in pairs {
            let p = product("Mystery", purchase_unit, 100);
            let conversion = resolve(1.5, recipe_unit, &p);
            assert!(conversion.is_fallback(), "{recipe_unit} → {purchase_unit}");
            assert_eq!(conversion.purchase_quantity, 1.5);
            assert_eq!(conversion.cost.cents(), 150);
            assert!(conversion.warning.is_some());
        }
    }

    #[test]
    fn test_factor_of_one_is_not_treated_as_data() {
        let napkins = product("Napkins", "case", 4000).with_conversion_factor(1.0);
        assert!(resolve(2.0, "each", &napkins).is_fallback());
    }

    #[test]
    fn test_blank_recipe_unit_uses_product_recipe_unit() {
        let vodka = product("House Vodka", "bottle", 2000)
            .with_size(750.0, "ml")
            .with_recipe_unit("oz");
        let conversion = resolve(1.5, "", &vodka);

        assert_eq!(conversion.method, ConversionMethod::Volume);
        assert_close(conversion.purchase_quantity, 1.5 * 29.5735 / 750.0);
    }

    #[test]
    fn test_method_serializes_to_legacy_tags() {
        assert_eq!(
            serde_json::to_string(&ConversionMethod::DirectMatch).unwrap(),
            "\"1:1\""
        );
        assert_eq!(
            serde_json::to_string(&ConversionMethod::Fallback).unwrap(),
            "\"fallback_1:1\""
        );
        assert_eq!(ConversionMethod::Density.to_string(), "density");
    }
}
