//! # Sales Engine
//!
//! The stock reconciliation engine: keeps each product's `(stock,
//! sold_count)` counters consistent across sale creation, editing and
//! deletion, while freezing per-line economics into immutable snapshots
//! at the moment of sale.
//!
//! ## Operation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              validate → build → persist → apply                         │
//! │                                                                         │
//! │  1. VALIDATE   per requested line, against the pre-mutation ledger     │
//! │                (edit: against stock + what this sale would restore).   │
//! │                All-or-nothing: any failure leaves everything as-is.    │
//! │                                                                         │
//! │  2. BUILD      price_line() freezes unit cost, margins and the price   │
//! │                actually charged; total = Σ(unit_price × quantity).     │
//! │                                                                         │
//! │  3. PERSIST    sale header + lines written inside a transaction.       │
//! │                                                                         │
//! │  4. APPLY      per-product net deltas via the conditional adjust       │
//! │                primitive, same transaction:                            │
//! │                - overdraw  → roll back, surface InsufficientStock      │
//! │                - vanished  → skip line's effect, warn, keep the sale   │
//! │                                                                         │
//! │  Validation is advisory under concurrency; the conditional increment   │
//! │  in step 4 is the actual correctness boundary.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No long-lived locks are held: each operation is a bounded sequence of
//! single-round-trip statements on one transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use bodega_core::reconcile::ProductDelta;
use bodega_core::{pricing, reconcile, validation, CoreError, Money, RequestedLine, Sale, SaleLine};
use bodega_db::repository::sale::{generate_sale_id, generate_sale_line_id};
use bodega_db::{Database, DbError, ProductRepository, SaleRepository, StockAdjustment};

use crate::error::EngineResult;

// =============================================================================
// Requests
// =============================================================================

/// A request to record a new sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    /// Lines to sell. Must be non-empty.
    pub lines: Vec<RequestedLine>,
    /// Wholesale pricing context for snapshot construction.
    #[serde(default)]
    pub wholesale: bool,
    /// Business date; defaults to now.
    pub date: Option<DateTime<Utc>>,
}

/// A request to edit an existing sale.
///
/// `lines: None` means a scalar-only edit: `date`/`wholesale` update and
/// stock is untouched. `lines: Some(..)` replaces the whole item set and
/// reconciles stock by per-product net delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditSaleRequest {
    pub lines: Option<Vec<RequestedLine>>,
    pub wholesale: Option<bool>,
    pub date: Option<DateTime<Utc>>,
}

// =============================================================================
// Outcomes
// =============================================================================

/// A ledger adjustment that could not be applied because the product no
/// longer exists. The owning operation still committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedAdjustment {
    pub product_id: String,
    pub stock_delta: i64,
    pub sold_count_delta: i64,
}

/// "Succeeded, possibly with caveats": the committed sale plus any
/// non-fatal adjustment failures (reported for operational visibility,
/// never raised to the caller as errors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOutcome {
    pub sale: Sale,
    pub skipped: Vec<SkippedAdjustment>,
}

/// Outcome of deleting a sale: the reversal's non-fatal skips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub skipped: Vec<SkippedAdjustment>,
}

// =============================================================================
// Engine
// =============================================================================

/// Orchestrates the sale lifecycle over the product ledger and the sale
/// record store.
///
/// Cloning is cheap; the underlying pool is shared.
#[derive(Debug, Clone)]
pub struct SalesEngine {
    db: Database,
}

impl SalesEngine {
    /// Creates an engine over an initialized database.
    pub fn new(db: Database) -> Self {
        SalesEngine { db }
    }

    /// Returns the underlying database handle (catalog management,
    /// diagnostics).
    pub fn database(&self) -> &Database {
        &self.db
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Records a new sale.
    ///
    /// `seller_id` is the resolved caller identity from the auth
    /// collaborator; any seller id inside the request payload is ignored
    /// by design, which is why it is a separate parameter.
    pub async fn create_sale(
        &self,
        request: CreateSaleRequest,
        seller_id: Option<&str>,
    ) -> EngineResult<SaleOutcome> {
        debug!(lines = request.lines.len(), wholesale = request.wholesale, "create_sale");

        validation::validate_requested_lines(&request.lines).map_err(CoreError::from)?;

        let products = self.db.products();
        let sale_id = generate_sale_id();

        // Validate + build. All reads happen before any mutation, so a
        // failing line leaves the ledger untouched.
        let mut lines = Vec::with_capacity(request.lines.len());
        for req in &request.lines {
            let product = products
                .get_by_id(&req.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(req.product_id.clone()))?;

            if product.stock < req.quantity {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                    restorable: 0,
                    requested: req.quantity,
                }
                .into());
            }

            let (unit_price, snapshot) = pricing::price_line(
                &product,
                request.wholesale,
                req.unit_price_cents.map(Money::from_cents),
            );

            lines.push(SaleLine {
                id: generate_sale_line_id(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                product_name: product.name,
                quantity: req.quantity,
                unit_price_cents: unit_price.cents(),
                snapshot,
            });
        }

        let total_cents: i64 = lines.iter().map(|l| l.line_total().cents()).sum();
        let now = Utc::now();
        let sale = Sale {
            id: sale_id,
            date: request.date.unwrap_or(now),
            wholesale: request.wholesale,
            seller_id: seller_id.map(str::to_string),
            total_cents,
            lines,
            created_at: now,
            updated_at: now,
        };

        let names = name_index(&sale.lines);
        let new_qty = reconcile::quantities_by_product(
            sale.lines.iter().map(|l| (l.product_id.as_str(), l.quantity)),
        );
        let deltas = reconcile::stock_deltas(&HashMap::new(), &new_qty);

        // Persist + apply under one transaction: a refused decrement
        // rolls the sale write back with it.
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        SaleRepository::insert_with(&mut tx, &sale).await?;
        let skipped = Self::apply_deltas(&mut tx, &deltas, &names).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            total = %sale.total_cents,
            lines = sale.lines.len(),
            skipped = skipped.len(),
            "Sale created"
        );

        Ok(SaleOutcome { sale, skipped })
    }

    // -------------------------------------------------------------------------
    // Edit
    // -------------------------------------------------------------------------

    /// Edits an existing sale.
    ///
    /// When the request carries a new line set, reconciliation is a
    /// per-product net delta between old and new quantities, never
    /// delete-then-recreate. New lines are rebuilt from the products'
    /// *current* attributes; old snapshots are never reused or rewritten.
    pub async fn edit_sale(&self, sale_id: &str, request: EditSaleRequest) -> EngineResult<SaleOutcome> {
        debug!(sale_id = %sale_id, relines = request.lines.is_some(), "edit_sale");

        let sales = self.db.sales();
        let current = sales
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let date = request.date.unwrap_or(current.date);
        let wholesale = request.wholesale.unwrap_or(current.wholesale);

        let Some(requested_lines) = request.lines else {
            // Scalar-only edit: stock untouched.
            let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
            SaleRepository::update_header_with(&mut tx, sale_id, date, wholesale, current.total_cents)
                .await?;
            tx.commit().await.map_err(DbError::from)?;

            let sale = sales
                .get_by_id(sale_id)
                .await?
                .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
            info!(sale_id = %sale_id, "Sale scalars updated");
            return Ok(SaleOutcome { sale, skipped: Vec::new() });
        };

        validation::validate_requested_lines(&requested_lines).map_err(CoreError::from)?;

        let products = self.db.products();
        let old_qty = reconcile::quantities_by_product(
            current.lines.iter().map(|l| (l.product_id.as_str(), l.quantity)),
        );
        let mut names = name_index(&current.lines);

        // Validate against available-for-this-edit stock and rebuild
        // every line fresh from current product attributes.
        let mut new_lines = Vec::with_capacity(requested_lines.len());
        for req in &requested_lines {
            let product = products
                .get_by_id(&req.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(req.product_id.clone()))?;

            let restorable = old_qty.get(&req.product_id).copied().unwrap_or(0);
            if reconcile::available_for_edit(product.stock, restorable) < req.quantity {
                // Itemized so the operator sees the bare stock and what
                // this edit would have given back, not just the sum.
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                    restorable,
                    requested: req.quantity,
                }
                .into());
            }

            let (unit_price, snapshot) = pricing::price_line(
                &product,
                wholesale,
                req.unit_price_cents.map(Money::from_cents),
            );

            names.insert(product.id.clone(), product.name.clone());
            new_lines.push(SaleLine {
                id: generate_sale_line_id(),
                sale_id: sale_id.to_string(),
                product_id: product.id,
                product_name: product.name,
                quantity: req.quantity,
                unit_price_cents: unit_price.cents(),
                snapshot,
            });
        }

        let total_cents: i64 = new_lines.iter().map(|l| l.line_total().cents()).sum();
        let new_qty = reconcile::quantities_by_product(
            new_lines.iter().map(|l| (l.product_id.as_str(), l.quantity)),
        );
        let deltas = reconcile::stock_deltas(&old_qty, &new_qty);

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        SaleRepository::replace_lines_with(&mut tx, sale_id, &new_lines).await?;
        SaleRepository::update_header_with(&mut tx, sale_id, date, wholesale, total_cents).await?;
        let skipped = Self::apply_deltas(&mut tx, &deltas, &names).await?;
        tx.commit().await.map_err(DbError::from)?;

        let sale = sales
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        info!(
            sale_id = %sale_id,
            total = %total_cents,
            deltas = deltas.len(),
            skipped = skipped.len(),
            "Sale edited"
        );

        Ok(SaleOutcome { sale, skipped })
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    /// Deletes a sale and reverses its stock effect: the exact inverse of
    /// the create-time apply, so create→delete on an untouched product is
    /// a no-op on its counters.
    pub async fn delete_sale(&self, sale_id: &str) -> EngineResult<DeleteOutcome> {
        debug!(sale_id = %sale_id, "delete_sale");

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        let sale = SaleRepository::delete_with(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let names = name_index(&sale.lines);
        let old_qty = reconcile::quantities_by_product(
            sale.lines.iter().map(|l| (l.product_id.as_str(), l.quantity)),
        );
        // Empty new set: every product's stock is fully restored.
        let deltas = reconcile::stock_deltas(&old_qty, &HashMap::new());
        let skipped = Self::apply_deltas(&mut tx, &deltas, &names).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale_id, skipped = skipped.len(), "Sale deleted, stock restored");

        Ok(DeleteOutcome { skipped })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Fetches a fully materialized sale.
    pub async fn get_sale(&self, sale_id: &str) -> EngineResult<Sale> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Lists all sales, newest first.
    pub async fn list_sales(&self) -> EngineResult<Vec<Sale>> {
        Ok(self.db.sales().list().await?)
    }

    // -------------------------------------------------------------------------
    // Apply Phase
    // -------------------------------------------------------------------------

    /// Applies per-product deltas through the conditional adjust
    /// primitive.
    ///
    /// - `WouldOverdraw` aborts with `InsufficientStock`; the caller's
    ///   transaction rolls back on drop, taking the sale write with it.
    /// - `ProductMissing` must not abort the remaining lines: the effect
    ///   is skipped and reported, the operation still commits.
    async fn apply_deltas(
        conn: &mut SqliteConnection,
        deltas: &[ProductDelta],
        names: &HashMap<String, String>,
    ) -> EngineResult<Vec<SkippedAdjustment>> {
        let mut skipped = Vec::new();

        for delta in deltas {
            let outcome = ProductRepository::adjust_with(
                conn,
                &delta.product_id,
                delta.stock_delta(),
                delta.sold_count_delta(),
            )
            .await?;

            match outcome {
                StockAdjustment::Applied(_) => {}
                StockAdjustment::ProductMissing => {
                    warn!(
                        product_id = %delta.product_id,
                        stock_delta = delta.stock_delta(),
                        sold_count_delta = delta.sold_count_delta(),
                        "Product vanished before its stock effect applied; skipping"
                    );
                    skipped.push(SkippedAdjustment {
                        product_id: delta.product_id.clone(),
                        stock_delta: delta.stock_delta(),
                        sold_count_delta: delta.sold_count_delta(),
                    });
                }
                StockAdjustment::WouldOverdraw { available } => {
                    let name = names
                        .get(&delta.product_id)
                        .cloned()
                        .unwrap_or_else(|| delta.product_id.clone());
                    // The delta is already net of any restore, so there
                    // is nothing further this operation could give back.
                    return Err(CoreError::InsufficientStock {
                        name,
                        available,
                        restorable: 0,
                        requested: delta.quantity,
                    }
                    .into());
                }
            }
        }

        Ok(skipped)
    }
}

/// product_id → product_name lookup for error messages.
fn name_index(lines: &[SaleLine]) -> HashMap<String, String> {
    lines
        .iter()
        .map(|l| (l.product_id.clone(), l.product_name.clone()))
        .collect()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_core::types::{Product, ProductCategory};
    use bodega_core::ValidationError;
    use bodega_db::repository::product::generate_product_id;
    use crate::error::EngineError;
    use bodega_db::DbConfig;

    async fn test_engine() -> SalesEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        SalesEngine::new(db)
    }

    async fn seed_product(
        engine: &SalesEngine,
        name: &str,
        unit_cost_cents: i64,
        margin_bps: u32,
        wholesale_margin_bps: u32,
        stock: i64,
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            category: ProductCategory::Blend,
            unit_cost_cents,
            margin_bps,
            wholesale_margin_bps,
            stock,
            sold_count: 0,
            created_at: now,
            updated_at: now,
        };
        engine.database().products().insert(&product).await.unwrap()
    }

    fn line(product: &Product, quantity: i64) -> RequestedLine {
        RequestedLine {
            product_id: product.id.clone(),
            quantity,
            unit_price_cents: None,
        }
    }

    fn create_request(lines: Vec<RequestedLine>) -> CreateSaleRequest {
        CreateSaleRequest {
            lines,
            wholesale: false,
            date: None,
        }
    }

    async fn fetch(engine: &SalesEngine, id: &str) -> Product {
        engine.database().products().get_by_id(id).await.unwrap().unwrap()
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_sale_decrements_stock_and_freezes_snapshot() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;
        let gin = seed_product(&engine, "Gin Nativo 750ml", 20000, 3000, 0, 5).await;

        let outcome = engine
            .create_sale(
                create_request(vec![line(&blend, 3), line(&gin, 1)]),
                Some("seller-1"),
            )
            .await
            .unwrap();

        assert!(outcome.skipped.is_empty());
        let sale = &outcome.sale;
        assert_eq!(sale.lines.len(), 2);
        assert_eq!(sale.seller_id.as_deref(), Some("seller-1"));
        // 3 × 12000 + 1 × 26000
        assert_eq!(sale.total_cents, 62000);

        let first = &sale.lines[0];
        assert_eq!(first.product_name, "Blend Roble 750ml");
        assert_eq!(first.unit_price_cents, 12000);
        assert_eq!(first.snapshot.unit_cost_cents, 10000);
        assert_eq!(first.snapshot.margin_bps, 2000);
        assert_eq!(first.snapshot.wholesale_margin_bps, None);
        assert_eq!(first.snapshot.cost_extras_cents, 0);

        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 7);
        assert_eq!(blend.sold_count, 3);
        let gin = fetch(&engine, &gin.id).await;
        assert_eq!(gin.stock, 4);
        assert_eq!(gin.sold_count, 1);

        // Round-trips through storage identically
        let stored = engine.get_sale(&sale.id).await.unwrap();
        assert_eq!(stored.total_cents, sale.total_cents);
        assert_eq!(stored.lines.len(), 2);
        assert_eq!(stored.lines[0].snapshot, first.snapshot);
    }

    #[tokio::test]
    async fn test_create_sale_duplicate_product_lines_net_once() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;

        // Two distinct lines for the same product survive as lines but
        // hit the ledger as one net delta of 5.
        let outcome = engine
            .create_sale(create_request(vec![line(&blend, 2), line(&blend, 3)]), None)
            .await
            .unwrap();

        assert_eq!(outcome.sale.lines.len(), 2);
        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 5);
        assert_eq!(blend.sold_count, 5);
    }

    #[tokio::test]
    async fn test_create_sale_insufficient_stock_is_all_or_nothing() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;
        let gin = seed_product(&engine, "Gin Nativo 750ml", 20000, 3000, 0, 2).await;

        let err = engine
            .create_sale(create_request(vec![line(&blend, 3), line(&gin, 5)]), None)
            .await
            .unwrap_err();

        match err {
            EngineError::Core(CoreError::InsufficientStock {
                name,
                available,
                restorable,
                requested,
            }) => {
                assert_eq!(name, "Gin Nativo 750ml");
                assert_eq!(available, 2);
                assert_eq!(restorable, 0);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Neither product moved, no sale was recorded
        assert_eq!(fetch(&engine, &blend.id).await.stock, 10);
        assert_eq!(fetch(&engine, &gin.id).await.stock, 2);
        assert!(engine.list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_sale_aggregate_overdraw_rolls_back() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;

        // Each line passes the advisory per-line check (6 <= 10), but the
        // net delta of 12 trips the conditional update at apply time.
        let err = engine
            .create_sale(create_request(vec![line(&blend, 6), line(&blend, 6)]), None)
            .await
            .unwrap_err();

        match err {
            EngineError::Core(CoreError::InsufficientStock {
                name,
                available,
                requested,
                ..
            }) => {
                assert_eq!(name, "Blend Roble 750ml");
                assert_eq!(available, 10);
                assert_eq!(requested, 12);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The refused decrement rolled the sale write back with it
        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 10);
        assert_eq!(blend.sold_count, 0);
        assert!(engine.list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_sale_unknown_product() {
        let engine = test_engine().await;
        let ghost = RequestedLine {
            product_id: generate_product_id(),
            quantity: 1,
            unit_price_cents: None,
        };

        let err = engine.create_sale(create_request(vec![ghost]), None).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_sale_rejects_empty_line_set() {
        let engine = test_engine().await;
        let err = engine.create_sale(create_request(Vec::new()), None).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(ValidationError::EmptyLineSet))
        ));
    }

    #[tokio::test]
    async fn test_create_sale_wholesale_margin_gate() {
        let engine = test_engine().await;
        let tiered = seed_product(&engine, "Caja Premium", 10000, 2000, 1000, 10).await;
        let flat = seed_product(&engine, "Caja Simple", 10000, 2000, 0, 10).await;

        let outcome = engine
            .create_sale(
                CreateSaleRequest {
                    lines: vec![line(&tiered, 1), line(&flat, 1)],
                    wholesale: true,
                    date: None,
                },
                None,
            )
            .await
            .unwrap();

        let tiered_line = &outcome.sale.lines[0];
        assert_eq!(tiered_line.unit_price_cents, 11000);
        assert_eq!(tiered_line.snapshot.wholesale_margin_bps, Some(1000));

        // No wholesale margin configured: falls back to the standard one
        let flat_line = &outcome.sale.lines[1];
        assert_eq!(flat_line.unit_price_cents, 12000);
        assert_eq!(flat_line.snapshot.wholesale_margin_bps, None);
    }

    #[tokio::test]
    async fn test_create_sale_explicit_price_override() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;

        let req = RequestedLine {
            product_id: blend.id.clone(),
            quantity: 2,
            unit_price_cents: Some(11111),
        };
        let outcome = engine.create_sale(create_request(vec![req]), None).await.unwrap();

        assert_eq!(outcome.sale.lines[0].unit_price_cents, 11111);
        assert_eq!(outcome.sale.lines[0].snapshot.unit_price_cents, 11111);
        assert_eq!(outcome.sale.total_cents, 22222);
    }

    // -------------------------------------------------------------------------
    // Edit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_edit_sale_applies_net_delta() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 3)]), None)
            .await
            .unwrap();
        assert_eq!(fetch(&engine, &blend.id).await.stock, 7);

        let edited = engine
            .edit_sale(
                &created.sale.id,
                EditSaleRequest {
                    lines: Some(vec![line(&blend, 5)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Net delta of +2 sold, never restore-3-then-take-5
        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 5);
        assert_eq!(blend.sold_count, 5);
        assert_eq!(edited.sale.total_cents, 60000);
    }

    #[tokio::test]
    async fn test_edit_sale_swaps_products() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;
        let gin = seed_product(&engine, "Gin Nativo 750ml", 20000, 3000, 0, 10).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 2)]), None)
            .await
            .unwrap();

        engine
            .edit_sale(
                &created.sale.id,
                EditSaleRequest {
                    lines: Some(vec![line(&gin, 2)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 10);
        assert_eq!(blend.sold_count, 0);
        let gin = fetch(&engine, &gin.id).await;
        assert_eq!(gin.stock, 8);
        assert_eq!(gin.sold_count, 2);
    }

    #[tokio::test]
    async fn test_edit_sale_can_reuse_its_own_quantity() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 5).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 5)]), None)
            .await
            .unwrap();
        assert_eq!(fetch(&engine, &blend.id).await.stock, 0);

        // Bare stock is 0, but this sale's own 5 units are restorable:
        // shrinking to 4 must succeed.
        engine
            .edit_sale(
                &created.sale.id,
                EditSaleRequest {
                    lines: Some(vec![line(&blend, 4)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 1);
        assert_eq!(blend.sold_count, 4);
    }

    #[tokio::test]
    async fn test_edit_sale_insufficient_beyond_restorable() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 5).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 5)]), None)
            .await
            .unwrap();

        let err = engine
            .edit_sale(
                &created.sale.id,
                EditSaleRequest {
                    lines: Some(vec![line(&blend, 6)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        match err {
            EngineError::Core(CoreError::InsufficientStock {
                available,
                restorable,
                requested,
                ..
            }) => {
                // Itemized: bare stock and what this edit would restore
                assert_eq!(available, 0);
                assert_eq!(restorable, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Sale and ledger both untouched
        let sale = engine.get_sale(&created.sale.id).await.unwrap();
        assert_eq!(sale.lines[0].quantity, 5);
        assert_eq!(fetch(&engine, &blend.id).await.stock, 0);
    }

    #[tokio::test]
    async fn test_edit_sale_scalars_only_leaves_stock() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 3)]), None)
            .await
            .unwrap();
        let new_date = Utc::now();

        let edited = engine
            .edit_sale(
                &created.sale.id,
                EditSaleRequest {
                    lines: None,
                    wholesale: Some(true),
                    date: Some(new_date),
                },
            )
            .await
            .unwrap();

        assert!(edited.sale.wholesale);
        assert_eq!(edited.sale.date, new_date);
        assert_eq!(edited.sale.total_cents, created.sale.total_cents);
        // Existing lines and their snapshots survive untouched
        assert_eq!(edited.sale.lines[0].quantity, 3);
        assert_eq!(edited.sale.lines[0].snapshot, created.sale.lines[0].snapshot);

        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 7);
        assert_eq!(blend.sold_count, 3);
    }

    #[tokio::test]
    async fn test_edit_sale_rebuilds_snapshots_from_current_attributes() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 2)]), None)
            .await
            .unwrap();

        // Product gets repriced after the sale
        let mut repriced = fetch(&engine, &blend.id).await;
        repriced.unit_cost_cents = 15000;
        engine.database().products().update(&repriced).await.unwrap();

        let edited = engine
            .edit_sale(
                &created.sale.id,
                EditSaleRequest {
                    lines: Some(vec![line(&blend, 2)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // New lines freeze the *current* cost; quantity delta is zero so
        // the ledger does not move.
        assert_eq!(edited.sale.lines[0].snapshot.unit_cost_cents, 15000);
        assert_eq!(edited.sale.lines[0].unit_price_cents, 18000);
        assert_eq!(fetch(&engine, &blend.id).await.stock, 8);
    }

    #[tokio::test]
    async fn test_edit_missing_sale() {
        let engine = test_engine().await;
        let err = engine
            .edit_sale("no-such-sale", EditSaleRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_delete_sale_restores_stock() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;
        let gin = seed_product(&engine, "Gin Nativo 750ml", 20000, 3000, 0, 5).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 4), line(&gin, 2)]), None)
            .await
            .unwrap();

        let outcome = engine.delete_sale(&created.sale.id).await.unwrap();
        assert!(outcome.skipped.is_empty());

        // Create followed by delete is a no-op on every counter
        let blend = fetch(&engine, &blend.id).await;
        assert_eq!(blend.stock, 10);
        assert_eq!(blend.sold_count, 0);
        let gin = fetch(&engine, &gin.id).await;
        assert_eq!(gin.stock, 5);
        assert_eq!(gin.sold_count, 0);

        let err = engine.get_sale(&created.sale.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_sale_skips_vanished_product() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 10).await;
        let gin = seed_product(&engine, "Gin Nativo 750ml", 20000, 3000, 0, 5).await;

        let created = engine
            .create_sale(create_request(vec![line(&blend, 2), line(&gin, 1)]), None)
            .await
            .unwrap();

        // The product is hard-deleted while its sale still exists
        engine.database().products().delete(&blend.id).await.unwrap();

        let outcome = engine.delete_sale(&created.sale.id).await.unwrap();

        // The vanished product's restore is skipped and reported; the
        // surviving product is still restored and the delete commits.
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].product_id, blend.id);
        assert_eq!(outcome.skipped[0].stock_delta, 2);
        assert_eq!(fetch(&engine, &gin.id).await.stock, 5);
        assert!(engine.list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_sale() {
        let engine = test_engine().await;
        let err = engine.delete_sale("no-such-sale").await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
    }

    // -------------------------------------------------------------------------
    // Snapshot Immutability
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_snapshots_survive_later_repricing() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 20).await;

        let first = engine
            .create_sale(create_request(vec![line(&blend, 1)]), None)
            .await
            .unwrap();

        let mut repriced = fetch(&engine, &blend.id).await;
        repriced.unit_cost_cents = 50000;
        repriced.margin_bps = 5000;
        engine.database().products().update(&repriced).await.unwrap();

        let second = engine
            .create_sale(create_request(vec![line(&blend, 1)]), None)
            .await
            .unwrap();

        // The earlier sale's economics are frozen forever
        let stored_first = engine.get_sale(&first.sale.id).await.unwrap();
        assert_eq!(stored_first.lines[0].snapshot.unit_cost_cents, 10000);
        assert_eq!(stored_first.lines[0].unit_price_cents, 12000);

        assert_eq!(second.sale.lines[0].snapshot.unit_cost_cents, 50000);
        assert_eq!(second.sale.lines[0].unit_price_cents, 75000);
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_sales_newest_first() {
        let engine = test_engine().await;
        let blend = seed_product(&engine, "Blend Roble 750ml", 10000, 2000, 0, 20).await;

        let older = Utc::now() - chrono::Duration::days(2);
        let newer = Utc::now();

        let first = engine
            .create_sale(
                CreateSaleRequest {
                    lines: vec![line(&blend, 1)],
                    wholesale: false,
                    date: Some(older),
                },
                None,
            )
            .await
            .unwrap();
        let second = engine
            .create_sale(
                CreateSaleRequest {
                    lines: vec![line(&blend, 1)],
                    wholesale: false,
                    date: Some(newer),
                },
                None,
            )
            .await
            .unwrap();

        let sales = engine.list_sales().await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].id, second.sale.id);
        assert_eq!(sales[1].id, first.sale.id);
    }
}
