//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Catalog inserts and lookups
//! - POS item name matching (case-insensitive, trimmed)
//! - Atomic, clamped stock decrement
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compute, write back                                   │
//! │     SELECT current_stock ...   → 4.0                                   │
//! │     UPDATE ... SET current_stock = 3.4     (lost update under races)   │
//! │                                                                         │
//! │  ✅ CORRECT: single relative statement                                 │
//! │     UPDATE products                                                     │
//! │        SET current_stock = MAX(0.0, current_stock - ?)                 │
//! │      RETURNING current_stock                                           │
//! │                                                                         │
//! │  Two sales of 0.6 against 4.0 always end at 2.8, in either order.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockline_core::validation::{validate_cost_cents, validate_product_name};
use stockline_core::Product;

const PRODUCT_COLUMNS: &str = r#"
    id, restaurant_id, name, pos_item_name, current_stock, cost_per_unit_cents,
    uom_purchase, uom_recipe, conversion_factor, size_value, size_unit, package_qty,
    created_at, updated_at
"#;

// =============================================================================
// Connection-Level Queries
// =============================================================================

/// Finds the product a POS item name maps to directly.
///
/// Matching ignores case and surrounding whitespace. When several products
/// carry the same POS name, the oldest wins. Case folding is SQLite's
/// `lower()`, so only ASCII letters fold.
pub async fn find_by_pos_item_name(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    item_name: &str,
) -> DbResult<Option<Product>> {
    let sql = format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE restaurant_id = ?1
          AND pos_item_name IS NOT NULL
          AND lower(trim(pos_item_name)) = lower(trim(?2))
        ORDER BY created_at, id
        LIMIT 1
        "#
    );

    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(restaurant_id)
        .bind(item_name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Gets a product by id, scoped to a restaurant.
pub async fn fetch_product(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND restaurant_id = ?2");

    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Subtracts `quantity` purchase units from a product's stock, clamping at
/// zero, and returns the new stock.
///
/// ## Returns
/// * `Ok(f64)` - Stock after the update
/// * `Err(DbError::NotFound)` - Product doesn't exist
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: f64,
    now: DateTime<Utc>,
) -> DbResult<f64> {
    debug!(id = %id, quantity = %quantity, "Decrementing stock");

    let remaining: Option<f64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET
            current_stock = MAX(0.0, current_stock - ?2),
            updated_at = ?3
        WHERE id = ?1
        RETURNING CAST(current_stock AS REAL)
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    remaining.ok_or_else(|| DbError::not_found("Product", id))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// repo.insert(&vodka).await?;
/// let soda = repo.find_by_pos_item_name("r-1", "soda can").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by POS item name. See [`find_by_pos_item_name`].
    pub async fn find_by_pos_item_name(
        &self,
        restaurant_id: &str,
        item_name: &str,
    ) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_by_pos_item_name(&mut conn, restaurant_id, item_name).await
    }

    /// Lists a restaurant's products by name.
    pub async fn list(&self, restaurant_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE restaurant_id = ?1 ORDER BY name, id"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - ID already exists
    /// * `Err(DbError::Core)` - Blank name or negative cost
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product_name(&product.name)?;
        validate_cost_cents(product.cost_per_unit_cents)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, restaurant_id, name, pos_item_name, current_stock, cost_per_unit_cents,
                uom_purchase, uom_recipe, conversion_factor, size_value, size_unit, package_qty,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.restaurant_id)
        .bind(&product.name)
        .bind(&product.pos_item_name)
        .bind(product.current_stock)
        .bind(product.cost_per_unit_cents)
        .bind(&product.uom_purchase)
        .bind(&product.uom_recipe)
        .bind(product.conversion_factor)
        .bind(product.size_value)
        .bind(&product.size_unit)
        .bind(product.package_qty)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Decrements stock outside a deduction. See [`decrement_stock`].
    pub async fn decrement_stock(&self, id: &str, quantity: f64) -> DbResult<f64> {
        let mut conn = self.pool.acquire().await?;
        decrement_stock(&mut conn, id, quantity, Utc::now()).await
    }

    /// Counts a restaurant's products (for diagnostics).
    pub async fn count(&self, restaurant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE restaurant_id = ?1")
            .bind(restaurant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockline_core::Money;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn soda() -> Product {
        Product::new("p-soda", "r-1", "Soda", "can", Money::from_cents(250))
            .with_pos_item_name("Soda Can")
            .with_stock(100.0)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let repo = db.products();

        let vodka = Product::new("p-vodka", "r-1", "Vodka", "bottle", Money::from_cents(2000))
            .with_size(750.0, "ml")
            .with_stock(4.0);
        repo.insert(&vodka).await.unwrap();

        let loaded = repo.get_by_id("p-vodka").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Vodka");
        assert_eq!(loaded.size_value, Some(750.0));
        assert_eq!(loaded.size_unit.as_deref(), Some("ml"));
        assert_eq!(loaded.current_stock, 4.0);
        assert_eq!(loaded.cost_per_unit(), Money::from_cents(2000));

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = setup().await;
        let repo = db.products();

        repo.insert(&soda()).await.unwrap();
        let err = repo.insert(&soda()).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_insert_validates() {
        let db = setup().await;
        let blank = Product::new("p-x", "r-1", "  ", "can", Money::from_cents(100));

        assert!(matches!(
            db.products().insert(&blank).await,
            Err(DbError::Core(_))
        ));
    }

    #[tokio::test]
    async fn test_pos_name_match_ignores_case_and_whitespace() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(&soda()).await.unwrap();

        let found = repo.find_by_pos_item_name("r-1", "  soda CAN ").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some("p-soda".to_string()));

        // Other restaurant
        assert!(repo.find_by_pos_item_name("r-2", "Soda Can").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decrement_clamps_at_zero() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(&soda().with_stock(2.0)).await.unwrap();

        assert_eq!(repo.decrement_stock("p-soda", 1.5).await.unwrap(), 0.5);
        assert_eq!(repo.decrement_stock("p-soda", 3.0).await.unwrap(), 0.0);

        let err = repo.decrement_stock("missing", 1.0).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
