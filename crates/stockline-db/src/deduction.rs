//! # Deduction Service
//!
//! Turns one POS sale event into stock decrements and ledger rows, exactly
//! once.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RECEIVED ── validate ──► DEDUP_CHECK (usage rows for key?)            │
//! │                               │                                         │
//! │                 yes ◄─────────┴────────► no                             │
//! │                  │                       │                              │
//! │                  │                 BEGIN; INSERT claim ── conflict ──┐  │
//! │                  │                       │                           │  │
//! │                  ▼                       ▼                           │  │
//! │         ALREADY_PROCESSED ◄──────── RESOLVE_TARGET                   │  │
//! │                  ▲                 │     │        │                  │  │
//! │                  └─────────────────┼─────┼────────┼──────────────────┘  │
//! │                                    │     │        │                     │
//! │                          DIRECT_PRODUCT RECIPE  NO_MAPPING              │
//! │                                    │     │      (ROLLBACK)              │
//! │                                    ▼     ▼                              │
//! │                          plan() → per line: UPDATE stock,               │
//! │                                             INSERT ledger row           │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                       COMMIT                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Race Safety
//! The claim insert is the first statement of the transaction, so it takes
//! SQLite's write lock before anything is read. A second event with the same
//! key waits for the lock, then fails on the claim's primary key and reports
//! already-processed. Every product read and decrement of the winner happens
//! under that same lock, so concurrent sales never lose an update.
//!
//! ## Simulation
//! [`DeductionService::simulate`] runs target resolution and the shared
//! planner on a plain connection. No claim, no writes, no dedup check.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use stockline_core::deduction::{self, DeductedIngredient, SaleTarget};
use stockline_core::validation::{
    validate_ingredient_quantity, validate_item_name, validate_quantity_sold,
    validate_restaurant_id, validate_sale_event,
};
use stockline_core::{
    CoreError, DeductionOutcome, DeductionResult, InventoryTransaction, Money, SaleEvent,
    TransactionType,
};

use crate::error::DbResult;
use crate::repository::ledger::{self, generate_transaction_id};
use crate::repository::{product, recipe};

// =============================================================================
// Service
// =============================================================================

/// Applies sale events to stock and the ledger.
///
/// Cheap to clone; clones share the pool and can run concurrently.
///
/// ## Usage
/// ```rust,ignore
/// let service = db.deductions();
///
/// let event = SaleEvent::new("r-1", "Moscow Mule", 2.0, today).with_order_id("ord-9");
/// let result = service.deduct(&event).await?;
///
/// match result.outcome {
///     DeductionOutcome::Deducted => println!("cost {}", result.total_cost),
///     DeductionOutcome::NoMapping => println!("map '{}' to a recipe", event.pos_item_name),
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DeductionService {
    pool: SqlitePool,
    performed_by: String,
}

impl DeductionService {
    /// Creates a service that records `performed_by` on every ledger row.
    pub fn new(pool: SqlitePool, performed_by: impl Into<String>) -> Self {
        DeductionService {
            pool,
            performed_by: performed_by.into(),
        }
    }

    /// Actor recorded on ledger rows.
    pub fn performed_by(&self) -> &str {
        &self.performed_by
    }

    /// Deducts one sale event.
    ///
    /// ## Returns
    /// * `Ok(result)` with `outcome`:
    ///   - `Deducted` - stock decremented, one ledger row per line
    ///   - `AlreadyProcessed` - the reference key was seen before; nothing changed
    ///   - `NoMapping` - no product or recipe matched; nothing changed
    /// * `Err(DbError::Core)` - invalid event, missing ingredient product or
    ///   non-positive recipe line; the whole event was rolled back
    /// * `Err(_)` - storage failure; the whole event was rolled back
    pub async fn deduct(&self, event: &SaleEvent) -> DbResult<DeductionResult> {
        validate_sale_event(event)?;

        let restaurant_id = event.restaurant_id.as_str();
        let item_name = event.pos_item_name.trim();
        let reference_id = event.reference_key();

        debug!(
            restaurant_id = %restaurant_id,
            item = %item_name,
            reference_id = %reference_id,
            quantity_sold = event.quantity_sold,
            "Received sale event"
        );

        // Fast path: already-processed events never open a write transaction
        {
            let mut conn = self.pool.acquire().await?;
            if ledger::has_usage_for_reference(&mut conn, restaurant_id, &reference_id).await? {
                info!(reference_id = %reference_id, "Sale event already processed");
                return Ok(DeductionResult::already_processed(reference_id));
            }
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if !ledger::try_claim(&mut *tx, restaurant_id, &reference_id, item_name, now).await? {
            tx.rollback().await?;
            warn!(reference_id = %reference_id, "Lost idempotency race, treating as processed");
            return Ok(DeductionResult::already_processed(reference_id));
        }

        let Some(target) = resolve_target(&mut *tx, restaurant_id, item_name).await? else {
            // Release the claim so the event can be replayed once mapped
            tx.rollback().await?;
            info!(item = %item_name, "No product or recipe mapped to POS item");
            return Ok(DeductionResult::no_mapping(Some(reference_id)));
        };

        let mut plan = deduction::plan(&target, event.quantity_sold);
        let created_at = event.occurred_at().unwrap_or(now);
        let reason = format!("POS sale: {} x {}", event.quantity_sold, item_name);

        for line in plan.lines.iter_mut() {
            log_fallback(line);

            let remaining = product::decrement_stock(
                &mut *tx,
                &line.product_id,
                line.quantity_purchase_units,
                now,
            )
            .await?;
            line.remaining_stock_purchase_units = remaining;

            let row = InventoryTransaction {
                id: generate_transaction_id(),
                restaurant_id: restaurant_id.to_string(),
                product_id: line.product_id.clone(),
                quantity: -line.quantity_purchase_units,
                cost_cents: -line.cost.cents(),
                transaction_type: TransactionType::Usage,
                reason: Some(reason.clone()),
                reference_id: Some(reference_id.clone()),
                performed_by: Some(self.performed_by.clone()),
                created_at,
            };
            ledger::insert_transaction(&mut *tx, &row).await?;
        }

        tx.commit().await?;

        info!(
            reference_id = %reference_id,
            target = %plan.target_name,
            lines = plan.lines.len(),
            total_cost = %plan.total_cost,
            "Sale event deducted"
        );

        Ok(DeductionResult::from_plan(
            plan,
            DeductionOutcome::Deducted,
            Some(reference_id),
        ))
    }

    /// Previews what deducting `quantity_sold` of `item_name` would do.
    ///
    /// Read-only and repeatable. Uses the same target resolution and the
    /// same planner as [`deduct`](Self::deduct), so the numbers match a real
    /// deduction from the same starting state.
    pub async fn simulate(
        &self,
        restaurant_id: &str,
        item_name: &str,
        quantity_sold: f64,
    ) -> DbResult<DeductionResult> {
        validate_restaurant_id(restaurant_id)?;
        validate_item_name(item_name)?;
        validate_quantity_sold(quantity_sold)?;

        let mut conn = self.pool.acquire().await?;
        let Some(target) = resolve_target(&mut conn, restaurant_id, item_name.trim()).await? else {
            return Ok(DeductionResult::no_mapping(None));
        };

        let plan = deduction::plan(&target, quantity_sold);
        debug!(
            target = %plan.target_name,
            total_cost = %plan.total_cost,
            "Simulated deduction"
        );

        Ok(DeductionResult::from_plan(plan, DeductionOutcome::Simulated, None))
    }

    /// Deducts events one after another. A failing event is recorded in the
    /// report and the batch carries on.
    pub async fn deduct_batch(&self, events: &[SaleEvent]) -> BatchReport {
        let mut report = BatchReport::default();

        for event in events {
            let result = self.deduct(event).await;
            report.record(event, result);
        }

        info!(
            events = events.len(),
            deducted = report.deducted,
            already_processed = report.already_processed,
            unmapped = report.unmapped,
            failed = report.failed,
            "Batch processed"
        );

        report
    }
}

/// Resolves a POS item name to what it consumes.
///
/// Direct product first, then an active recipe. A recipe line pointing at a
/// product that does not exist (in this restaurant), or one whose quantity
/// is not positive, is a data error.
async fn resolve_target(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    item_name: &str,
) -> DbResult<Option<SaleTarget>> {
    if let Some(product) = product::find_by_pos_item_name(conn, restaurant_id, item_name).await? {
        return Ok(Some(SaleTarget::Direct(product)));
    }

    let Some(recipe) = recipe::find_active_by_item_name(conn, restaurant_id, item_name).await?
    else {
        return Ok(None);
    };

    let ingredients = recipe::fetch_ingredients(conn, &recipe.id).await?;
    let mut lines = Vec::with_capacity(ingredients.len());

    for ingredient in ingredients {
        validate_ingredient_quantity(ingredient.quantity).map_err(|source| {
            CoreError::InvalidIngredient {
                recipe: recipe.name.clone(),
                product_id: ingredient.product_id.clone(),
                source,
            }
        })?;

        let product = product::fetch_product(conn, restaurant_id, &ingredient.product_id)
            .await?
            .ok_or_else(|| CoreError::IngredientProductMissing {
                recipe: recipe.name.clone(),
                product_id: ingredient.product_id.clone(),
            })?;
        lines.push((ingredient, product));
    }

    Ok(Some(SaleTarget::Recipe { recipe, lines }))
}

fn log_fallback(line: &DeductedIngredient) {
    if let Some(warning) = &line.warning {
        warn!(
            product_id = %line.product_id,
            recipe_unit = %line.recipe_unit,
            purchase_unit = %line.purchase_unit,
            "{}",
            warning.message
        );
    }
}

// =============================================================================
// Batch Report
// =============================================================================

/// Outcome of one event in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub pos_item_name: String,
    pub reference_id: String,
    /// `None` when the event failed.
    pub outcome: Option<DeductionOutcome>,
    pub total_cost: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a [`DeductionService::deduct_batch`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub deducted: usize,
    pub already_processed: usize,
    pub unmapped: usize,
    pub failed: usize,
    /// Sum of the costs actually posted.
    pub total_cost: Money,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    fn record(&mut self, event: &SaleEvent, result: DbResult<DeductionResult>) {
        let mut entry = BatchEntry {
            pos_item_name: event.pos_item_name.clone(),
            reference_id: event.reference_key(),
            outcome: None,
            total_cost: Money::zero(),
            error: None,
        };

        match result {
            Ok(result) => {
                match result.outcome {
                    DeductionOutcome::Deducted => {
                        self.deducted += 1;
                        self.total_cost += result.total_cost;
                    }
                    DeductionOutcome::AlreadyProcessed => self.already_processed += 1,
                    DeductionOutcome::NoMapping => self.unmapped += 1,
                    DeductionOutcome::Simulated => {}
                }
                entry.outcome = Some(result.outcome);
                entry.total_cost = result.total_cost;
            }
            Err(err) => {
                warn!(item = %event.pos_item_name, error = %err, "Sale event failed");
                self.failed += 1;
                entry.error = Some(err.to_string());
            }
        }

        self.entries.push(entry);
    }

    /// Events handed in.
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Events that should be retried or fixed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|entry| entry.error.is_some())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
