//! # Recipe Repository
//!
//! Recipes and their ingredient lines.
//!
//! ## Matching a POS Item
//! ```text
//! "moscow mule" ──► active recipes of the restaurant
//!                     ├── pos_item_name matches?   (preferred)
//!                     └── name matches?
//!                   case-insensitive, trimmed, oldest first
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockline_core::validation::{validate_ingredient_quantity, validate_product_name};
use stockline_core::{Recipe, RecipeIngredient};

const RECIPE_COLUMNS: &str =
    "id, restaurant_id, name, pos_item_name, is_active, created_at, updated_at";

// =============================================================================
// Connection-Level Queries
// =============================================================================

/// Finds the active recipe a POS item name maps to.
///
/// A match on `pos_item_name` beats a match on `name`; ties go to the
/// oldest recipe.
///
/// Case folding is SQLite's `lower()`, which only folds ASCII letters:
/// "CAFÉ" and "café" are different items.
pub async fn find_active_by_item_name(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    item_name: &str,
) -> DbResult<Option<Recipe>> {
    let sql = format!(
        r#"
        SELECT {RECIPE_COLUMNS}
        FROM recipes
        WHERE restaurant_id = ?1
          AND is_active = 1
          AND (
                lower(trim(pos_item_name)) = lower(trim(?2))
             OR lower(trim(name)) = lower(trim(?2))
          )
        ORDER BY
            CASE WHEN lower(trim(pos_item_name)) = lower(trim(?2)) THEN 0 ELSE 1 END,
            created_at,
            id
        LIMIT 1
        "#
    );

    let recipe = sqlx::query_as::<_, Recipe>(&sql)
        .bind(restaurant_id)
        .bind(item_name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(recipe)
}

/// Lists a recipe's ingredient lines in insertion order.
pub async fn fetch_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: &str,
) -> DbResult<Vec<RecipeIngredient>> {
    let ingredients = sqlx::query_as::<_, RecipeIngredient>(
        r#"
        SELECT id, recipe_id, product_id, quantity, unit
        FROM recipe_ingredients
        WHERE recipe_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(recipe_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ingredients)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for recipe database operations.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    /// Creates a new RecipeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    /// Gets a recipe by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1");

        let recipe = sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(recipe)
    }

    /// Finds the active recipe for a POS item. See [`find_active_by_item_name`].
    pub async fn find_active_by_item_name(
        &self,
        restaurant_id: &str,
        item_name: &str,
    ) -> DbResult<Option<Recipe>> {
        let mut conn = self.pool.acquire().await?;
        find_active_by_item_name(&mut conn, restaurant_id, item_name).await
    }

    /// Lists a recipe's ingredient lines.
    pub async fn ingredients(&self, recipe_id: &str) -> DbResult<Vec<RecipeIngredient>> {
        let mut conn = self.pool.acquire().await?;
        fetch_ingredients(&mut conn, recipe_id).await
    }

    /// Inserts a new recipe.
    pub async fn insert(&self, recipe: &Recipe) -> DbResult<Recipe> {
        validate_product_name(&recipe.name)?;

        debug!(id = %recipe.id, name = %recipe.name, "Inserting recipe");

        sqlx::query(
            r#"
            INSERT INTO recipes (
                id, restaurant_id, name, pos_item_name, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.restaurant_id)
        .bind(&recipe.name)
        .bind(&recipe.pos_item_name)
        .bind(recipe.is_active)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(recipe.clone())
    }

    /// Adds an ingredient line to an existing recipe.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Recipe doesn't exist
    pub async fn add_ingredient(&self, ingredient: &RecipeIngredient) -> DbResult<RecipeIngredient> {
        validate_ingredient_quantity(ingredient.quantity)?;

        debug!(
            recipe_id = %ingredient.recipe_id,
            product_id = %ingredient.product_id,
            "Adding recipe ingredient"
        );

        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (id, recipe_id, product_id, quantity, unit)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.recipe_id)
        .bind(&ingredient.product_id)
        .bind(ingredient.quantity)
        .bind(ingredient.unit.trim())
        .execute(&self.pool)
        .await?;

        Ok(ingredient.clone())
    }

    /// Activates or deactivates a recipe.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE recipes SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Recipe", id));
        }

        Ok(())
    }
}

/// Helper to generate a new recipe or ingredient ID.
pub fn generate_recipe_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_match_by_pos_name_or_name() {
        let db = setup().await;
        let repo = db.recipes();

        repo.insert(&Recipe::new("rc-1", "r-1", "Moscow Mule")).await.unwrap();
        repo.insert(&Recipe::new("rc-2", "r-1", "House Mule").with_pos_item_name("MULE"))
            .await
            .unwrap();

        let by_name = repo.find_active_by_item_name("r-1", " moscow mule").await.unwrap();
        assert_eq!(by_name.map(|r| r.id), Some("rc-1".to_string()));

        let by_pos = repo.find_active_by_item_name("r-1", "mule").await.unwrap();
        assert_eq!(by_pos.map(|r| r.id), Some("rc-2".to_string()));
    }

    #[tokio::test]
    async fn test_pos_name_preferred_over_name() {
        let db = setup().await;
        let repo = db.recipes();

        // rc-1 is older and matches by name only
        repo.insert(&Recipe::new("rc-1", "r-1", "Margarita")).await.unwrap();
        repo.insert(&Recipe::new("rc-2", "r-1", "Classic Marg").with_pos_item_name("Margarita"))
            .await
            .unwrap();

        let found = repo.find_active_by_item_name("r-1", "Margarita").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some("rc-2".to_string()));
    }

    #[tokio::test]
    async fn test_inactive_recipe_ignored() {
        let db = setup().await;
        let repo = db.recipes();

        let mut mojito = Recipe::new("rc-1", "r-1", "Mojito");
        mojito.is_active = false;
        repo.insert(&mojito).await.unwrap();
        assert!(repo.find_active_by_item_name("r-1", "Mojito").await.unwrap().is_none());

        repo.set_active("rc-1", true).await.unwrap();
        assert!(repo.find_active_by_item_name("r-1", "Mojito").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ingredients_keep_order_and_require_recipe() {
        let db = setup().await;
        let repo = db.recipes();
        repo.insert(&Recipe::new("rc-1", "r-1", "Moscow Mule")).await.unwrap();

        repo.add_ingredient(&RecipeIngredient::new("i-1", "rc-1", "p-vodka", 1.5, "oz"))
            .await
            .unwrap();
        repo.add_ingredient(&RecipeIngredient::new("i-2", "rc-1", "p-lime", 0.5, "oz"))
            .await
            .unwrap();

        let lines = repo.ingredients("rc-1").await.unwrap();
        let ids: Vec<_> = lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["i-1", "i-2"]);

        let orphan = RecipeIngredient::new("i-3", "rc-missing", "p-vodka", 1.0, "oz");
        assert!(matches!(
            repo.add_ingredient(&orphan).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected_by_schema() {
        let db = setup().await;
        db.recipes().insert(&Recipe::new("rc-1", "r-1", "Mojito")).await.unwrap();

        for quantity in [0.0, -2.0] {
            let err = sqlx::query(
                "INSERT INTO recipe_ingredients (id, recipe_id, product_id, quantity, unit)
                 VALUES (?1, 'rc-1', 'p-mint', ?2, 'leaf')",
            )
            .bind(generate_recipe_id())
            .bind(quantity)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();

            assert!(matches!(err, DbError::ConstraintViolation(_)), "{quantity}: {err}");
        }
    }

    #[tokio::test]
    async fn test_name_match_folds_ascii_case_only() {
        let db = setup().await;
        let repo = db.recipes();
        repo.insert(&Recipe::new("rc-1", "r-1", "Café Latte")).await.unwrap();

        assert!(repo.find_active_by_item_name("r-1", " CAFé latte ").await.unwrap().is_some());
        assert!(repo.find_active_by_item_name("r-1", "CAFÉ LATTE").await.unwrap().is_none());
    }
}
