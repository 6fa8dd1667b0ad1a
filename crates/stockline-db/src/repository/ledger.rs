//! # Ledger Repository
//!
//! Append-only inventory transactions and the deduction claim table.
//!
//! ## Ledger Rows Written by a Deduction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale: 2 × Moscow Mule, ref "ord-9_Moscow Mule_2026-03-14"             │
//! │                                                                         │
//! │  product   quantity   cost_cents  type   reference_id                  │
//! │  ───────   ────────   ──────────  ─────  ──────────────────────────     │
//! │  vodka     -0.11829       -237    usage  ord-9_Moscow Mule_2026-03-14  │
//! │  lime      -1.0           -800    usage  ord-9_Moscow Mule_2026-03-14  │
//! │                                                                         │
//! │  Rows are never updated or deleted (enforced by triggers).             │
//! │  Σ quantity per product = stock movement before clamping.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockline_core::{InventoryTransaction, TransactionType};

const TRANSACTION_COLUMNS: &str = r#"
    id, restaurant_id, product_id, quantity, cost_cents, transaction_type,
    reason, reference_id, performed_by, created_at
"#;

// =============================================================================
// Connection-Level Queries
// =============================================================================

/// Claims a reference key for one deduction.
///
/// ## Returns
/// * `Ok(true)` - Claim taken; this caller owns the event
/// * `Ok(false)` - Someone already claimed it
pub async fn try_claim(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    reference_id: &str,
    item_name: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO deduction_claims (restaurant_id, reference_id, item_name, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(restaurant_id)
    .bind(reference_id)
    .bind(item_name)
    .bind(now)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(true),
        Err(err) => match DbError::from(err) {
            DbError::UniqueViolation { .. } => Ok(false),
            other => Err(other),
        },
    }
}

/// True when usage rows already exist for this reference key.
pub async fn has_usage_for_reference(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    reference_id: &str,
) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM inventory_transactions
            WHERE restaurant_id = ?1
              AND reference_id = ?2
              AND transaction_type = 'usage'
        )
        "#,
    )
    .bind(restaurant_id)
    .bind(reference_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

/// Appends one ledger row.
pub async fn insert_transaction(
    conn: &mut SqliteConnection,
    tx: &InventoryTransaction,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_transactions (
            id, restaurant_id, product_id, quantity, cost_cents, transaction_type,
            reason, reference_id, performed_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&tx.id)
    .bind(&tx.restaurant_id)
    .bind(&tx.product_id)
    .bind(tx.quantity)
    .bind(tx.cost_cents)
    .bind(tx.transaction_type)
    .bind(&tx.reason)
    .bind(&tx.reference_id)
    .bind(&tx.performed_by)
    .bind(tx.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Stock Drift
// =============================================================================

/// Comparison of a product's stock against what its ledger implies.
///
/// `drift` is positive when clamping at zero hid consumption: the shelf
/// shows more than `initial + Σ ledger`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDrift {
    pub product_id: String,
    pub initial_stock: f64,
    pub ledger_net: f64,
    pub expected_stock: f64,
    pub actual_stock: f64,
    pub drift: f64,
}

impl StockDrift {
    /// True when stock and ledger agree within floating-point noise.
    pub fn is_balanced(&self) -> bool {
        self.drift.abs() < 1e-9
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for ledger reads and non-sale ledger writes.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends a ledger row outside a deduction (purchases, waste, counts).
    ///
    /// Stock is not touched; callers that receive goods update the product
    /// themselves.
    pub async fn record(&self, tx: &InventoryTransaction) -> DbResult<()> {
        debug!(
            product_id = %tx.product_id,
            transaction_type = tx.transaction_type.as_str(),
            quantity = tx.quantity,
            "Recording ledger row"
        );
        let mut conn = self.pool.acquire().await?;
        insert_transaction(&mut conn, tx).await
    }

    /// All ledger rows written for one reference key, oldest first.
    pub async fn list_by_reference(
        &self,
        restaurant_id: &str,
        reference_id: &str,
    ) -> DbResult<Vec<InventoryTransaction>> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM inventory_transactions
            WHERE restaurant_id = ?1 AND reference_id = ?2
            ORDER BY created_at, rowid
            "#
        );

        let rows = sqlx::query_as::<_, InventoryTransaction>(&sql)
            .bind(restaurant_id)
            .bind(reference_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// All ledger rows for a product, oldest first.
    pub async fn list_by_product(&self, product_id: &str) -> DbResult<Vec<InventoryTransaction>> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM inventory_transactions
            WHERE product_id = ?1
            ORDER BY created_at, rowid
            "#
        );

        let rows = sqlx::query_as::<_, InventoryTransaction>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// True when usage rows exist for the reference key.
    pub async fn has_usage_for_reference(
        &self,
        restaurant_id: &str,
        reference_id: &str,
    ) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        has_usage_for_reference(&mut conn, restaurant_id, reference_id).await
    }

    /// True when a deduction has claimed the reference key.
    pub async fn is_claimed(&self, restaurant_id: &str, reference_id: &str) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM deduction_claims
                WHERE restaurant_id = ?1 AND reference_id = ?2
            )
            "#,
        )
        .bind(restaurant_id)
        .bind(reference_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Σ quantity of every ledger row for a product.
    pub async fn net_quantity(&self, product_id: &str) -> DbResult<f64> {
        let net: f64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(quantity), 0.0) AS REAL)
            FROM inventory_transactions
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net)
    }

    /// Σ cost_cents of the usage rows for a product.
    pub async fn usage_cost_cents(&self, product_id: &str) -> DbResult<i64> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(cost_cents), 0)
            FROM inventory_transactions
            WHERE product_id = ?1 AND transaction_type = ?2
            "#,
        )
        .bind(product_id)
        .bind(TransactionType::Usage)
        .fetch_one(&self.pool)
        .await?;

        Ok(cents)
    }

    /// Compares a product's current stock with `initial_stock + Σ ledger`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn stock_drift(&self, product_id: &str, initial_stock: f64) -> DbResult<StockDrift> {
        let actual: Option<f64> =
            sqlx::query_scalar("SELECT CAST(current_stock AS REAL) FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;
        let actual_stock = actual.ok_or_else(|| DbError::not_found("Product", product_id))?;

        let ledger_net = self.net_quantity(product_id).await?;
        let expected_stock = initial_stock + ledger_net;

        Ok(StockDrift {
            product_id: product_id.to_string(),
            initial_stock,
            ledger_net,
            expected_stock,
            actual_stock,
            drift: actual_stock - expected_stock,
        })
    }
}

/// Helper to generate a new ledger row ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockline_core::{Money, Product};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(
                &Product::new("p-soda", "r-1", "Soda", "can", Money::from_cents(250))
                    .with_stock(10.0),
            )
            .await
            .unwrap();
        db
    }

    fn waste(quantity: f64) -> InventoryTransaction {
        InventoryTransaction {
            id: generate_transaction_id(),
            restaurant_id: "r-1".to_string(),
            product_id: "p-soda".to_string(),
            quantity,
            cost_cents: -250,
            transaction_type: TransactionType::Waste,
            reason: Some("dropped".to_string()),
            reference_id: None,
            performed_by: Some("manager".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let db = setup().await;
        let ledger = db.ledger();

        ledger.record(&waste(-1.0)).await.unwrap();

        let rows = ledger.list_by_product("p-soda").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_type, TransactionType::Waste);
        assert_eq!(rows[0].cost(), Money::from_cents(-250));
        assert_eq!(ledger.net_quantity("p-soda").await.unwrap(), -1.0);
        assert_eq!(ledger.usage_cost_cents("p-soda").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_is_append_only() {
        let db = setup().await;
        let row = waste(-1.0);
        db.ledger().record(&row).await.unwrap();

        let update = sqlx::query("UPDATE inventory_transactions SET quantity = 0 WHERE id = ?1")
            .bind(&row.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from);
        assert!(matches!(update, Err(DbError::ConstraintViolation(_))));

        let delete = sqlx::query("DELETE FROM inventory_transactions WHERE id = ?1")
            .bind(&row.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from);
        assert!(matches!(delete, Err(DbError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_claim_is_taken_once() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(try_claim(&mut conn, "r-1", "ref-1", "Soda", Utc::now()).await.unwrap());
        assert!(!try_claim(&mut conn, "r-1", "ref-1", "Soda", Utc::now()).await.unwrap());
        // Same key, other restaurant
        assert!(try_claim(&mut conn, "r-2", "ref-1", "Soda", Utc::now()).await.unwrap());
        drop(conn);

        assert!(db.ledger().is_claimed("r-1", "ref-1").await.unwrap());
        assert!(!db.ledger().is_claimed("r-1", "ref-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_stock_drift_without_clamping_is_balanced() {
        let db = setup().await;

        // Stock untouched, ledger says -1 → shelf shows one more than expected
        db.ledger().record(&waste(-1.0)).await.unwrap();
        let drift = db.ledger().stock_drift("p-soda", 10.0).await.unwrap();
        assert_eq!(drift.expected_stock, 9.0);
        assert_eq!(drift.drift, 1.0);
        assert!(!drift.is_balanced());

        db.products().decrement_stock("p-soda", 1.0).await.unwrap();
        let drift = db.ledger().stock_drift("p-soda", 10.0).await.unwrap();
        assert!(drift.is_balanced());

        assert!(matches!(
            db.ledger().stock_drift("missing", 0.0).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
