//! # Deduction Planning
//!
//! Computes what a sale will do to stock and cost, without doing it.
//!
//! ## One Planner, Two Callers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   DeductionService::deduct ──┐                                          │
//! │     (inside the transaction) │                                          │
//! │                              ├──► plan(target, quantity_sold)           │
//! │   DeductionService::simulate ┘          │                               │
//! │     (read-only)                         ▼                               │
//! │                                   DeductionPlan                         │
//! │                                         │                               │
//! │                 deduct: apply lines ◄───┴───► simulate: return as-is    │
//! │                                                                         │
//! │  Because both callers share this function, a simulation can never      │
//! │  drift numerically from the deduction it previews.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::conversion::{self, Conversion, ConversionMethod, ConversionWarning};
use crate::money::Money;
use crate::types::{Product, Recipe, RecipeIngredient};

// =============================================================================
// Sale Target
// =============================================================================

/// What a POS item name resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleTarget {
    /// The item is a product sold as-is (a can of soda).
    Direct(Product),
    /// The item is a recipe; each line carries the product it consumes.
    Recipe {
        recipe: Recipe,
        lines: Vec<(RecipeIngredient, Product)>,
    },
}

impl SaleTarget {
    pub fn name(&self) -> &str {
        match self {
            SaleTarget::Direct(product) => &product.name,
            SaleTarget::Recipe { recipe, .. } => &recipe.name,
        }
    }
}

// =============================================================================
// Deduction Lines
// =============================================================================

/// One product's share of a deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeductedIngredient {
    pub product_id: String,
    pub product_name: String,
    pub quantity_recipe_units: f64,
    pub recipe_unit: String,
    pub quantity_purchase_units: f64,
    pub purchase_unit: String,
    /// Stock after this line, clamped at zero.
    pub remaining_stock_purchase_units: f64,
    pub conversion_method: ConversionMethod,
    pub cost: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ConversionWarning>,
}

/// The computed effect of one sale, ready to apply or to show.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionPlan {
    pub target_name: String,
    pub lines: Vec<DeductedIngredient>,
    pub total_cost: Money,
}

/// Plans the deduction for `quantity_sold` units of `target`.
///
/// Stock is tracked per product across lines, so a recipe that uses the
/// same product twice sees the second line start where the first ended.
/// Remaining stock is clamped at zero; the purchase quantity is not.
///
/// ## Example
/// ```rust
/// use stockline_core::deduction::{plan, SaleTarget};
/// use stockline_core::{Money, Product};
///
/// let soda = Product::new("p-2", "r-1", "Soda", "can", Money::from_cents(250))
///     .with_stock(100.0);
/// let plan = plan(&SaleTarget::Direct(soda), 7.0);
///
/// assert_eq!(plan.lines[0].quantity_purchase_units, 7.0);
/// assert_eq!(plan.lines[0].remaining_stock_purchase_units, 93.0);
/// assert_eq!(plan.total_cost.cents(), 1750);
/// ```
pub fn plan(target: &SaleTarget, quantity_sold: f64) -> DeductionPlan {
    let mut running_stock: HashMap<&str, f64> = HashMap::new();
    let mut lines = Vec::new();

    match target {
        SaleTarget::Direct(product) => {
            let conversion = Conversion::direct_sale(quantity_sold, product);
            lines.push(line(
                product,
                quantity_sold,
                &product.uom_purchase,
                conversion,
                &mut running_stock,
            ));
        }
        SaleTarget::Recipe { lines: ingredients, .. } => {
            for (ingredient, product) in ingredients {
                let needed = ingredient.quantity * quantity_sold;
                let conversion = conversion::resolve(needed, &ingredient.unit, product);
                let recipe_unit = conversion::effective_recipe_unit(&ingredient.unit, product);
                lines.push(line(product, needed, recipe_unit, conversion, &mut running_stock));
            }
        }
    }

    let total_cost = lines.iter().map(|l| l.cost).sum();

    DeductionPlan {
        target_name: target.name().to_string(),
        lines,
        total_cost,
    }
}

fn line<'a>(
    product: &'a Product,
    recipe_quantity: f64,
    recipe_unit: &str,
    conversion: Conversion,
    running_stock: &mut HashMap<&'a str, f64>,
) -> DeductedIngredient {
    let stock = running_stock
        .entry(product.id.as_str())
        .or_insert(product.current_stock);
    *stock = clamp_remaining(*stock, conversion.purchase_quantity);

    DeductedIngredient {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity_recipe_units: recipe_quantity,
        recipe_unit: recipe_unit.to_string(),
        quantity_purchase_units: conversion.purchase_quantity,
        purchase_unit: product.uom_purchase.clone(),
        remaining_stock_purchase_units: *stock,
        conversion_method: conversion.method,
        cost: conversion.cost,
        warning: conversion.warning,
    }
}

/// `max(0, stock − deducted)`, the same expression the stock UPDATE uses.
#[inline]
pub fn clamp_remaining(stock: f64, deducted: f64) -> f64 {
    (stock - deducted).max(0.0)
}

// =============================================================================
// Deduction Result
// =============================================================================

/// How a sale event ended. All four are successful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeductionOutcome {
    /// Stock decremented and ledger rows written.
    Deducted,
    /// The reference key was already processed; nothing changed.
    AlreadyProcessed,
    /// No product or recipe matched; the item needs manual mapping.
    NoMapping,
    /// Preview only; nothing changed.
    Simulated,
}

/// What the caller gets back for one sale event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeductionResult {
    /// Product or recipe name, empty when nothing matched.
    pub target_name: String,
    pub ingredients_deducted: Vec<DeductedIngredient>,
    pub total_cost: Money,
    pub already_processed: bool,
    pub outcome: DeductionOutcome,
    /// Idempotency key, absent for simulations.
    pub reference_id: Option<String>,
}

impl DeductionResult {
    /// Empty result for an item with no product or recipe behind it.
    pub fn no_mapping(reference_id: Option<String>) -> Self {
        DeductionResult {
            target_name: String::new(),
            ingredients_deducted: Vec::new(),
            total_cost: Money::zero(),
            already_processed: false,
            outcome: DeductionOutcome::NoMapping,
            reference_id,
        }
    }

    /// Empty result for a replayed event.
    pub fn already_processed(reference_id: impl Into<String>) -> Self {
        DeductionResult {
            target_name: String::new(),
            ingredients_deducted: Vec::new(),
            total_cost: Money::zero(),
            already_processed: true,
            outcome: DeductionOutcome::AlreadyProcessed,
            reference_id: Some(reference_id.into()),
        }
    }

    /// Result carrying a computed plan.
    pub fn from_plan(plan: DeductionPlan, outcome: DeductionOutcome, reference_id: Option<String>) -> Self {
        DeductionResult {
            target_name: plan.target_name,
            ingredients_deducted: plan.lines,
            total_cost: plan.total_cost,
            already_processed: false,
            outcome,
            reference_id,
        }
    }

    /// Conversion warnings across all lines.
    pub fn warnings(&self) -> impl Iterator<Item = &ConversionWarning> {
        self.ingredients_deducted
            .iter()
            .filter_map(|line| line.warning.as_ref())
    }

    pub fn is_mapped(&self) -> bool {
        self.outcome != DeductionOutcome::NoMapping
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vodka() -> Product {
        Product::new("vodka", "r-1", "House Vodka", "bottle", Money::from_cents(2000))
            .with_size(750.0, "ml")
            .with_stock(4.0)
    }

    fn lime_juice() -> Product {
        Product::new("lime", "r-1", "Lime Juice", "bottle", Money::from_cents(800)).with_stock(0.5)
    }

    fn mule() -> SaleTarget {
        let recipe = Recipe::new("rec-1", "r-1", "Moscow Mule");
        SaleTarget::Recipe {
            lines: vec![
                (RecipeIngredient::new("i-1", "rec-1", "vodka", 1.5, "oz"), vodka()),
                (RecipeIngredient::new("i-2", "rec-1", "lime", 0.5, "oz"), lime_juice()),
            ],
            recipe,
        }
    }

    #[test]
    fn test_recipe_plan_multiplies_by_quantity_sold() {
        let plan = plan(&mule(), 10.0);

        assert_eq!(plan.target_name, "Moscow Mule");
        assert_eq!(plan.lines.len(), 2);

        let vodka_line = &plan.lines[0];
        assert_eq!(vodka_line.quantity_recipe_units, 15.0);
        assert_eq!(vodka_line.recipe_unit, "oz");
        assert_eq!(vodka_line.conversion_method, ConversionMethod::Volume);
        assert_eq!(vodka_line.cost.cents(), 1183);
        assert!((vodka_line.remaining_stock_purchase_units - (4.0 - 443.6025 / 750.0)).abs() < 1e-9);
    }

    #[test]
    fn test_total_cost_is_sum_of_line_costs() {
        let plan = plan(&mule(), 10.0);
        let sum: Money = plan.lines.iter().map(|l| l.cost).sum();
        assert_eq!(plan.total_cost, sum);
        // lime juice falls back 1:1: 5 bottles × $8.00
        assert_eq!(plan.total_cost.cents(), 1183 + 4000);
    }

    #[test]
    fn test_remaining_stock_is_clamped_but_quantity_is_not() {
        let plan = plan(&mule(), 10.0);
        let lime_line = &plan.lines[1];

        assert_eq!(lime_line.conversion_method, ConversionMethod::Fallback);
        assert_eq!(lime_line.quantity_purchase_units, 5.0);
        assert_eq!(lime_line.remaining_stock_purchase_units, 0.0);
        assert!(lime_line.warning.is_some());
    }

    #[test]
    fn test_same_product_twice_uses_running_stock() {
        let recipe = Recipe::new("rec-2", "r-1", "Double Vodka Soda");
        let target = SaleTarget::Recipe {
            lines: vec![
                (RecipeIngredient::new("i-1", "rec-2", "vodka", 750.0, "ml"), vodka()),
                (RecipeIngredient::new("i-2", "rec-2", "vodka", 750.0, "ml"), vodka()),
            ],
            recipe,
        };

        let plan = plan(&target, 1.0);
        assert_eq!(plan.lines[0].remaining_stock_purchase_units, 3.0);
        assert_eq!(plan.lines[1].remaining_stock_purchase_units, 2.0);
    }

    #[test]
    fn test_direct_sale_plan() {
        let soda = Product::new("soda", "r-1", "Soda Can", "can", Money::from_cents(250)).with_stock(100.0);
        let plan = plan(&SaleTarget::Direct(soda), 7.0);

        assert_eq!(plan.target_name, "Soda Can");
        let line = &plan.lines[0];
        assert_eq!(line.conversion_method, ConversionMethod::DirectSale);
        assert_eq!(line.recipe_unit, "can");
        assert_eq!(line.quantity_purchase_units, 7.0);
        assert_eq!(line.remaining_stock_purchase_units, 93.0);
        assert_eq!(plan.total_cost.cents(), 1750);
    }

    #[test]
    fn test_empty_recipe_plans_nothing() {
        let target = SaleTarget::Recipe {
            recipe: Recipe::new("rec-3", "r-1", "Glass of Water"),
            lines: Vec::new(),
        };
        let plan = plan(&target, 3.0);
        assert!(plan.lines.is_empty());
        assert!(plan.total_cost.is_zero());
    }

    #[test]
    fn test_result_constructors() {
        let none = DeductionResult::no_mapping(Some("k".to_string()));
        assert_eq!(none.target_name, "");
        assert!(none.ingredients_deducted.is_empty());
        assert!(!none.is_mapped());

        let dup = DeductionResult::already_processed("k");
        assert!(dup.already_processed);
        assert_eq!(dup.outcome, DeductionOutcome::AlreadyProcessed);
        assert!(dup.total_cost.is_zero());
    }

    #[test]
    fn test_result_serializes_warnings_only_when_present() {
        let result = DeductionResult::from_plan(plan(&mule(), 1.0), DeductionOutcome::Simulated, None);
        let json = serde_json::to_value(&result).unwrap();
        let lines = json["ingredients_deducted"].as_array().unwrap();

        assert!(lines[0].get("warning").is_none());
        assert_eq!(lines[1]["warning"]["warning_type"], "fallback_1:1");
        assert_eq!(json["outcome"], "simulated");
        assert_eq!(result.warnings().count(), 1);
    }
}
