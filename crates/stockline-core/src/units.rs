//! # Unit Families
//!
//! A closed enumeration of the unit symbols the resolver understands, with
//! the fixed physical constants used to convert between them.
//!
//! ## Families
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Volume     fl oz, ml, l, gal, qt, pint, cup, tbsp, tsp   (→ ml)        │
//! │  Weight     g, kg, lb, oz                                 (→ g)         │
//! │  Ounce      bare "oz": weight or fluid, decided by context             │
//! │  Count      each, piece, serving, slice, ...                           │
//! │  Container  bottle, jar, can, bag, box, case, package, container       │
//! │  Unknown    anything else                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Constants
//! The constants below are the values costs have always been computed with.
//! Changing any of them changes historical cost parity; do not "improve"
//! their precision.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Physical Constants
// =============================================================================

/// Milliliters per US fluid ounce.
pub const ML_PER_FL_OZ: f64 = 29.5735;
/// Milliliters per liter.
pub const ML_PER_LITER: f64 = 1000.0;
/// Milliliters per US gallon.
pub const ML_PER_GALLON: f64 = 3785.41;
/// Milliliters per US quart.
pub const ML_PER_QUART: f64 = 946.353;
/// Milliliters per US pint.
pub const ML_PER_PINT: f64 = 473.176;
/// Milliliters per US cup.
pub const ML_PER_CUP: f64 = 236.588;
/// Milliliters per tablespoon.
pub const ML_PER_TBSP: f64 = 14.7868;
/// Milliliters per teaspoon.
pub const ML_PER_TSP: f64 = 4.92892;

/// Grams per avoirdupois ounce.
pub const G_PER_OZ: f64 = 28.3495;
/// Grams per pound.
pub const G_PER_LB: f64 = 453.592;
/// Grams per kilogram.
pub const G_PER_KG: f64 = 1000.0;

// =============================================================================
// Volume
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    FluidOunce,
    Milliliter,
    Liter,
    Gallon,
    Quart,
    Pint,
    Cup,
    Tablespoon,
    Teaspoon,
}

impl VolumeUnit {
    /// Size of one of this unit in milliliters.
    pub const fn milliliters(self) -> f64 {
        match self {
            VolumeUnit::FluidOunce => ML_PER_FL_OZ,
            VolumeUnit::Milliliter => 1.0,
            VolumeUnit::Liter => ML_PER_LITER,
            VolumeUnit::Gallon => ML_PER_GALLON,
            VolumeUnit::Quart => ML_PER_QUART,
            VolumeUnit::Pint => ML_PER_PINT,
            VolumeUnit::Cup => ML_PER_CUP,
            VolumeUnit::Tablespoon => ML_PER_TBSP,
            VolumeUnit::Teaspoon => ML_PER_TSP,
        }
    }
}

// =============================================================================
// Weight
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Gram,
    Kilogram,
    Pound,
    Ounce,
}

impl WeightUnit {
    /// Size of one of this unit in grams.
    pub const fn grams(self) -> f64 {
        match self {
            WeightUnit::Gram => 1.0,
            WeightUnit::Kilogram => G_PER_KG,
            WeightUnit::Pound => G_PER_LB,
            WeightUnit::Ounce => G_PER_OZ,
        }
    }
}

// =============================================================================
// Containers
// =============================================================================

/// Purchase units whose contents are only known from size metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Bottle,
    Jar,
    Can,
    Bag,
    Box,
    Case,
    Package,
    Container,
}

// =============================================================================
// Unit
// =============================================================================

/// A parsed unit symbol.
///
/// `Ounce` is kept apart from both families on purpose: "oz" on a recipe
/// card means fluid ounces for a bottle of vodka and weight ounces for a
/// bag of flour, and only the product's package unit can tell which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Volume(VolumeUnit),
    Weight(WeightUnit),
    Ounce,
    Count,
    Container(ContainerKind),
    Unknown,
}

impl Unit {
    /// Parses a free-form unit symbol. Never fails; unrecognised symbols
    /// become [`Unit::Unknown`].
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::units::{Unit, VolumeUnit, WeightUnit, ContainerKind};
    ///
    /// assert_eq!(Unit::parse("ML"), Unit::Volume(VolumeUnit::Milliliter));
    /// assert_eq!(Unit::parse("fl oz"), Unit::Volume(VolumeUnit::FluidOunce));
    /// assert_eq!(Unit::parse("oz"), Unit::Ounce);
    /// assert_eq!(Unit::parse("lbs"), Unit::Weight(WeightUnit::Pound));
    /// assert_eq!(Unit::parse("Bottle"), Unit::Container(ContainerKind::Bottle));
    /// assert_eq!(Unit::parse("smidge"), Unit::Unknown);
    /// ```
    pub fn parse(symbol: &str) -> Unit {
        let normalized = symbol.trim().to_ascii_lowercase();
        let normalized = normalized.trim_end_matches('.');

        match normalized {
            "fl oz" | "fl. oz" | "floz" | "fl_oz" | "fluid ounce" | "fluid ounces" => {
                Unit::Volume(VolumeUnit::FluidOunce)
            }
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Unit::Volume(VolumeUnit::Milliliter)
            }
            "l" | "liter" | "liters" | "litre" | "litres" => Unit::Volume(VolumeUnit::Liter),
            "gal" | "gallon" | "gallons" => Unit::Volume(VolumeUnit::Gallon),
            "qt" | "quart" | "quarts" => Unit::Volume(VolumeUnit::Quart),
            "pint" | "pints" | "pt" => Unit::Volume(VolumeUnit::Pint),
            "cup" | "cups" => Unit::Volume(VolumeUnit::Cup),
            "tbsp" | "tbs" | "tablespoon" | "tablespoons" => Unit::Volume(VolumeUnit::Tablespoon),
            "tsp" | "teaspoon" | "teaspoons" => Unit::Volume(VolumeUnit::Teaspoon),

            "g" | "gram" | "grams" | "gr" => Unit::Weight(WeightUnit::Gram),
            "kg" | "kilogram" | "kilograms" | "kilo" | "kilos" => Unit::Weight(WeightUnit::Kilogram),
            "lb" | "lbs" | "pound" | "pounds" => Unit::Weight(WeightUnit::Pound),

            "oz" | "ounce" | "ounces" => Unit::Ounce,

            "each" | "ea" | "unit" | "units" | "piece" | "pieces" | "pc" | "pcs" | "serving"
            | "servings" | "slice" | "slices" | "portion" | "portions" | "item" | "items" => {
                Unit::Count
            }

            "bottle" | "bottles" => Unit::Container(ContainerKind::Bottle),
            "jar" | "jars" => Unit::Container(ContainerKind::Jar),
            "can" | "cans" => Unit::Container(ContainerKind::Can),
            "bag" | "bags" => Unit::Container(ContainerKind::Bag),
            "box" | "boxes" => Unit::Container(ContainerKind::Box),
            "case" | "cases" => Unit::Container(ContainerKind::Case),
            "package" | "packages" | "pkg" | "pack" | "packs" => {
                Unit::Container(ContainerKind::Package)
            }
            "container" | "containers" => Unit::Container(ContainerKind::Container),

            _ => Unit::Unknown,
        }
    }

    /// Returns the volume unit, reading a bare ounce as fluid only when
    /// `ounce_is_fluid` is set.
    pub fn as_volume(self, ounce_is_fluid: bool) -> Option<VolumeUnit> {
        match self {
            Unit::Volume(v) => Some(v),
            Unit::Ounce if ounce_is_fluid => Some(VolumeUnit::FluidOunce),
            _ => None,
        }
    }

    /// Returns the weight unit. A bare ounce is a weight ounce here.
    pub fn as_weight(self) -> Option<WeightUnit> {
        match self {
            Unit::Weight(w) => Some(w),
            Unit::Ounce => Some(WeightUnit::Ounce),
            _ => None,
        }
    }

    pub fn is_volume(self) -> bool {
        matches!(self, Unit::Volume(_))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Unit::Volume(_) => "volume",
            Unit::Weight(_) => "weight",
            Unit::Ounce => "ounce",
            Unit::Count => "count",
            Unit::Container(_) => "container",
            Unit::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Case-insensitive, whitespace-insensitive comparison of two unit symbols.
pub fn same_symbol(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

// =============================================================================
// Density Overrides
// =============================================================================

/// Grams per US cup for ingredients bought by weight but measured by volume.
///
/// Matched as a case-insensitive substring of the product name, first entry
/// wins. Keep this table short and audited; every entry changes costs.
pub const DENSITY_OVERRIDES: &[(&str, f64)] = &[
    ("rice", 185.0),
    ("flour", 120.0),
    ("sugar", 200.0),
    ("butter", 227.0),
];

/// Looks up a grams-per-cup density for a product name.
///
/// ## Example
/// ```rust
/// use stockline_core::units::density_grams_per_cup;
///
/// assert_eq!(density_grams_per_cup("Jasmine Rice 25lb"), Some(185.0));
/// assert_eq!(density_grams_per_cup("All-Purpose FLOUR"), Some(120.0));
/// assert_eq!(density_grams_per_cup("Olive Oil"), None);
/// ```
pub fn density_grams_per_cup(product_name: &str) -> Option<f64> {
    let name = product_name.to_ascii_lowercase();
    DENSITY_OVERRIDES
        .iter()
        .find(|(needle, _)| name.contains(needle))
        .map(|(_, grams)| *grams)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_constants() {
        assert_eq!(VolumeUnit::FluidOunce.milliliters(), 29.5735);
        assert_eq!(VolumeUnit::Cup.milliliters(), 236.588);
        assert_eq!(VolumeUnit::Gallon.milliliters(), 3785.41);
        assert_eq!(VolumeUnit::Liter.milliliters(), 1000.0);
    }

    #[test]
    fn test_weight_constants() {
        assert_eq!(WeightUnit::Ounce.grams(), 28.3495);
        assert_eq!(WeightUnit::Pound.grams(), 453.592);
        assert_eq!(WeightUnit::Kilogram.grams(), 1000.0);
    }

    #[test]
    fn test_parse_is_case_and_whitespace_insensitive() {
        assert_eq!(Unit::parse("  Cups "), Unit::Volume(VolumeUnit::Cup));
        assert_eq!(Unit::parse("TBSP"), Unit::Volume(VolumeUnit::Tablespoon));
        assert_eq!(Unit::parse("Kg"), Unit::Weight(WeightUnit::Kilogram));
        assert_eq!(Unit::parse("Fl. Oz."), Unit::Volume(VolumeUnit::FluidOunce));
        assert_eq!(Unit::parse("each"), Unit::Count);
        assert_eq!(Unit::parse("pkg"), Unit::Container(ContainerKind::Package));
    }

    #[test]
    fn test_bare_ounce_depends_on_context() {
        let oz = Unit::parse("oz");
        assert_eq!(oz.as_volume(true), Some(VolumeUnit::FluidOunce));
        assert_eq!(oz.as_volume(false), None);
        assert_eq!(oz.as_weight(), Some(WeightUnit::Ounce));
        assert!(!oz.is_volume());
    }

    #[test]
    fn test_families_do_not_cross() {
        assert_eq!(Unit::parse("ml").as_weight(), None);
        assert_eq!(Unit::parse("lb").as_volume(true), None);
        assert_eq!(Unit::parse("bottle").as_volume(true), None);
    }

    #[test]
    fn test_same_symbol() {
        assert!(same_symbol("Bottle", " bottle"));
        assert!(!same_symbol("bottle", "bottles"));
    }

    #[test]
    fn test_density_first_match_wins() {
        // "brown sugar" matches sugar, "rice flour" matches rice first
        assert_eq!(density_grams_per_cup("Brown Sugar"), Some(200.0));
        assert_eq!(density_grams_per_cup("Rice Flour"), Some(185.0));
        assert_eq!(density_grams_per_cup("Unsalted Butter"), Some(227.0));
    }
}
