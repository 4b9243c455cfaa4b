//! # Product Ledger Repository
//!
//! Database operations for products, viewed by the engine as the stock
//! ledger: catalog CRUD plus the atomic `(stock, sold_count)` adjustment
//! primitive.
//!
//! ## The Adjustment Primitive
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read-modify-write on the absolute value                      │
//! │     SELECT stock ... ; UPDATE products SET stock = 7 WHERE id = ?      │
//! │     (two concurrent sales both read 10, both write, one is lost)       │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional relative increment                         │
//! │     UPDATE products                                                     │
//! │     SET stock = stock + Δs, sold_count = sold_count + Δc               │
//! │     WHERE id = ? AND stock + Δs >= 0                                   │
//! │                                                                         │
//! │  Two concurrent createSale calls may both pass the advisory stock      │
//! │  validation, but only the increments that keep stock >= 0 apply.       │
//! │  The WHERE clause is the actual correctness boundary.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bodega_core::{Product, ProductCategory};

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row shape for the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: String,
    unit_cost_cents: i64,
    margin_bps: u32,
    wholesale_margin_bps: u32,
    stock: i64,
    sold_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Product> {
        let category = ProductCategory::parse(&row.category).ok_or_else(|| {
            DbError::Internal(format!("unknown product category '{}'", row.category))
        })?;

        Ok(Product {
            id: row.id,
            name: row.name,
            category,
            unit_cost_cents: row.unit_cost_cents,
            margin_bps: row.margin_bps,
            wholesale_margin_bps: row.wholesale_margin_bps,
            stock: row.stock,
            sold_count: row.sold_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, category, unit_cost_cents, margin_bps,
           wholesale_margin_bps, stock, sold_count, created_at, updated_at
    FROM products
"#;

// =============================================================================
// Stock Adjustment Outcome
// =============================================================================

/// Result of one conditional ledger adjustment.
///
/// A three-way outcome instead of an error so the engine can decide per
/// phase: during validation a missing product aborts the operation, but
/// during the apply phase it is a warn-and-continue condition.
#[derive(Debug, Clone)]
pub enum StockAdjustment {
    /// The increment applied; carries the updated product.
    Applied(Product),
    /// The product no longer exists (deleted after the sale referenced it).
    ProductMissing,
    /// The conditional update refused: stock would have gone negative.
    WouldOverdraw {
        /// Stock on hand at refusal time.
        available: i64,
    },
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product ledger operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Sell 3 units: stock -3, sold_count +3
/// match repo.adjust("uuid-here", -3, 3).await? {
///     StockAdjustment::Applied(p) => ...,
///     StockAdjustment::WouldOverdraw { available } => ...,
///     StockAdjustment::ProductMissing => ...,
/// }
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
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_with(&mut conn, id).await
    }

    /// Transaction-scoped variant of [`get_by_id`](Self::get_by_id).
    pub async fn get_by_id_with(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY name"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, unit_cost_cents, margin_bps,
                wholesale_margin_bps, stock, sold_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(product.unit_cost_cents)
        .bind(product.margin_bps)
        .bind(product.wholesale_margin_bps)
        .bind(product.stock)
        .bind(product.sold_count)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Updates a product's catalog attributes.
    ///
    /// Deliberately does NOT touch `stock` or `sold_count`: those
    /// counters move only through [`adjust`](Self::adjust).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                unit_cost_cents = ?4,
                margin_bps = ?5,
                wholesale_margin_bps = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(product.unit_cost_cents)
        .bind(product.margin_bps)
        .bind(product.wholesale_margin_bps)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product from the catalog.
    ///
    /// Historical sale lines referencing it stay valid: they carry the
    /// product name and a frozen snapshot, and the id column is not a
    /// foreign key.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Atomically adjusts the ledger counters of one product.
    ///
    /// See [`adjust_with`](Self::adjust_with); this variant takes its own
    /// connection from the pool.
    pub async fn adjust(
        &self,
        id: &str,
        stock_delta: i64,
        sold_count_delta: i64,
    ) -> DbResult<StockAdjustment> {
        let mut conn = self.pool.acquire().await?;
        Self::adjust_with(&mut conn, id, stock_delta, sold_count_delta).await
    }

    /// Atomically adjusts `(stock, sold_count)` by relative increments.
    ///
    /// The update is a single conditional statement: it applies only if
    /// the resulting stock stays non-negative, so concurrent callers can
    /// never overdraw past the advisory validation. The outcome reports
    /// which of the three cases happened; no case is an `Err` because
    /// the caller decides severity per phase.
    pub async fn adjust_with(
        conn: &mut SqliteConnection,
        id: &str,
        stock_delta: i64,
        sold_count_delta: i64,
    ) -> DbResult<StockAdjustment> {
        debug!(
            id = %id,
            stock_delta = %stock_delta,
            sold_count_delta = %sold_count_delta,
            "Adjusting ledger counters"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2,
                sold_count = sold_count + ?3,
                updated_at = ?4
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(stock_delta)
        .bind(sold_count_delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            // Refused: distinguish a vanished product from an overdraw
            let available: Option<i64> =
                sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;

            return Ok(match available {
                None => StockAdjustment::ProductMissing,
                Some(available) => StockAdjustment::WouldOverdraw { available },
            });
        }

        let product = Self::get_by_id_with(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        Ok(StockAdjustment::Applied(product))
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

    fn sample_product(stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            name: "Gin Nativo 750ml".to_string(),
            category: ProductCategory::Gin,
            unit_cost_cents: 10000,
            margin_bps: 2000,
            wholesale_margin_bps: 0,
            stock,
            sold_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let product = sample_product(10);
        repo.insert(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, product.name);
        assert_eq!(fetched.category, ProductCategory::Gin);
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.sold_count, 0);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = test_db().await;
        let repo = db.products();

        assert!(repo.get_by_id("no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_adjust_applies_relative_increments() {
        let db = test_db().await;
        let repo = db.products();

        let product = sample_product(10);
        repo.insert(&product).await.unwrap();

        let outcome = repo.adjust(&product.id, -3, 3).await.unwrap();
        let updated = match outcome {
            StockAdjustment::Applied(p) => p,
            other => panic!("expected Applied, got {other:?}"),
        };
        assert_eq!(updated.stock, 7);
        assert_eq!(updated.sold_count, 3);

        // Reversal composes back to the original counters
        let outcome = repo.adjust(&product.id, 3, -3).await.unwrap();
        let restored = match outcome {
            StockAdjustment::Applied(p) => p,
            other => panic!("expected Applied, got {other:?}"),
        };
        assert_eq!(restored.stock, 10);
        assert_eq!(restored.sold_count, 0);
    }

    #[tokio::test]
    async fn test_adjust_refuses_overdraw() {
        let db = test_db().await;
        let repo = db.products();

        let product = sample_product(7);
        repo.insert(&product).await.unwrap();

        let outcome = repo.adjust(&product.id, -10, 10).await.unwrap();
        match outcome {
            StockAdjustment::WouldOverdraw { available } => assert_eq!(available, 7),
            other => panic!("expected WouldOverdraw, got {other:?}"),
        }

        // Nothing moved
        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 7);
        assert_eq!(fetched.sold_count, 0);
    }

    #[tokio::test]
    async fn test_adjust_missing_product() {
        let db = test_db().await;
        let repo = db.products();

        let outcome = repo.adjust("ghost-id", -1, 1).await.unwrap();
        assert!(matches!(outcome, StockAdjustment::ProductMissing));
    }

    #[tokio::test]
    async fn test_update_does_not_touch_counters() {
        let db = test_db().await;
        let repo = db.products();

        let mut product = sample_product(10);
        repo.insert(&product).await.unwrap();
        repo.adjust(&product.id, -4, 4).await.unwrap();

        product.name = "Gin Nativo 1L".to_string();
        product.unit_cost_cents = 12000;
        product.stock = 999; // must be ignored
        repo.update(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Gin Nativo 1L");
        assert_eq!(fetched.unit_cost_cents, 12000);
        assert_eq!(fetched.stock, 6);
        assert_eq!(fetched.sold_count, 4);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.products();

        let product = sample_product(1);
        repo.insert(&product).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        repo.delete(&product.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(matches!(
            repo.delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
