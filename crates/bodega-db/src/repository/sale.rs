//! # Sale Record Store
//!
//! Database operations for sale headers and their line items.
//!
//! ## Storage Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Sale Record Store                                    │
//! │                                                                         │
//! │  sales                         sale_lines                              │
//! │  ┌──────────────┐              ┌──────────────────────────────┐        │
//! │  │ id           │◄─────────────│ sale_id (FK, CASCADE)        │        │
//! │  │ date         │              │ position (line order)        │        │
//! │  │ wholesale    │              │ product_id (NOT an FK)       │        │
//! │  │ seller_id    │              │ product_name (durable copy)  │        │
//! │  │ total_cents  │              │ quantity, unit_price_cents   │        │
//! │  └──────────────┘              │ snapshot_* (frozen economics)│        │
//! │                                └──────────────────────────────┘        │
//! │                                                                         │
//! │  Lines are exclusively owned by their sale: replace and delete         │
//! │  operate on the whole set, never on individual rows.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine calls the `*_with` variants inside the transaction that
//! also applies stock deltas, so a refused decrement rolls back the sale
//! write along with it.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bodega_core::{LineSnapshot, Sale, SaleLine};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    date: DateTime<Utc>,
    wholesale: bool,
    seller_id: Option<String>,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleLineRow {
    id: String,
    sale_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    snapshot_unit_cost_cents: i64,
    snapshot_cost_extras_cents: i64,
    snapshot_margin_bps: u32,
    snapshot_wholesale_margin_bps: Option<u32>,
    snapshot_unit_price_cents: i64,
}

impl From<SaleLineRow> for SaleLine {
    fn from(row: SaleLineRow) -> SaleLine {
        SaleLine {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            snapshot: LineSnapshot {
                unit_cost_cents: row.snapshot_unit_cost_cents,
                cost_extras_cents: row.snapshot_cost_extras_cents,
                margin_bps: row.snapshot_margin_bps,
                wholesale_margin_bps: row.snapshot_wholesale_margin_bps,
                unit_price_cents: row.snapshot_unit_price_cents,
            },
        }
    }
}

const SELECT_SALE: &str = r#"
    SELECT id, date, wholesale, seller_id, total_cents, created_at, updated_at
    FROM sales
"#;

const SELECT_LINES: &str = r#"
    SELECT id, sale_id, product_id, product_name, quantity, unit_price_cents,
           snapshot_unit_cost_cents, snapshot_cost_extras_cents,
           snapshot_margin_bps, snapshot_wholesale_margin_bps,
           snapshot_unit_price_cents
    FROM sale_lines
    WHERE sale_id = ?1
    ORDER BY position
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a fully materialized sale (header + ordered lines) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_with(&mut conn, id).await
    }

    /// Transaction-scoped variant of [`get_by_id`](Self::get_by_id).
    pub async fn get_by_id_with(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let header: Option<SaleRow> =
            sqlx::query_as(&format!("{SELECT_SALE} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines: Vec<SaleLineRow> = sqlx::query_as(SELECT_LINES)
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(Some(Sale {
            id: header.id,
            date: header.date,
            wholesale: header.wholesale,
            seller_id: header.seller_id,
            total_cents: header.total_cents,
            lines: lines.into_iter().map(SaleLine::from).collect(),
            created_at: header.created_at,
            updated_at: header.updated_at,
        }))
    }

    /// Lists all sales, newest first, each with its lines.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let headers: Vec<SaleRow> =
            sqlx::query_as(&format!("{SELECT_SALE} ORDER BY date DESC, id"))
                .fetch_all(&mut *conn)
                .await?;

        let mut sales = Vec::with_capacity(headers.len());
        for header in headers {
            let lines: Vec<SaleLineRow> = sqlx::query_as(SELECT_LINES)
                .bind(&header.id)
                .fetch_all(&mut *conn)
                .await?;

            sales.push(Sale {
                id: header.id,
                date: header.date,
                wholesale: header.wholesale,
                seller_id: header.seller_id,
                total_cents: header.total_cents,
                lines: lines.into_iter().map(SaleLine::from).collect(),
                created_at: header.created_at,
                updated_at: header.updated_at,
            });
        }

        Ok(sales)
    }

    /// Inserts a sale with all its lines.
    pub async fn insert_with(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, total = %sale.total_cents, lines = sale.lines.len(), "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, date, wholesale, seller_id, total_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.date)
        .bind(sale.wholesale)
        .bind(&sale.seller_id)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Self::insert_lines(conn, &sale.id, &sale.lines).await
    }

    /// Updates a sale's scalar fields and total.
    ///
    /// Line changes go through [`replace_lines_with`](Self::replace_lines_with);
    /// this only rewrites the header.
    pub async fn update_header_with(
        conn: &mut SqliteConnection,
        id: &str,
        date: DateTime<Utc>,
        wholesale: bool,
        total_cents: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                date = ?2,
                wholesale = ?3,
                total_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(date)
        .bind(wholesale)
        .bind(total_cents)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Replaces a sale's entire line set.
    ///
    /// The old rows are dropped wholesale; edits never mutate persisted
    /// snapshot columns in place.
    pub async fn replace_lines_with(
        conn: &mut SqliteConnection,
        sale_id: &str,
        lines: &[SaleLine],
    ) -> DbResult<()> {
        debug!(sale_id = %sale_id, lines = lines.len(), "Replacing sale lines");

        sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *conn)
            .await?;

        Self::insert_lines(conn, sale_id, lines).await
    }

    /// Deletes a sale; its lines cascade. Returns the removed sale so the
    /// caller can reverse its stock effect.
    pub async fn delete_with(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sale = Self::get_by_id_with(conn, id).await?;

        if sale.is_some() {
            debug!(id = %id, "Deleting sale");
            sqlx::query("DELETE FROM sales WHERE id = ?1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(sale)
    }

    async fn insert_lines(
        conn: &mut SqliteConnection,
        sale_id: &str,
        lines: &[SaleLine],
    ) -> DbResult<()> {
        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, position, product_id, product_name,
                    quantity, unit_price_cents,
                    snapshot_unit_cost_cents, snapshot_cost_extras_cents,
                    snapshot_margin_bps, snapshot_wholesale_margin_bps,
                    snapshot_unit_price_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(&line.id)
            .bind(sale_id)
            .bind(position as i64)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.snapshot.unit_cost_cents)
            .bind(line.snapshot.cost_extras_cents)
            .bind(line.snapshot.margin_bps)
            .bind(line.snapshot.wholesale_margin_bps)
            .bind(line.snapshot.unit_price_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale line ID.
pub fn generate_sale_line_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
