//! # Domain Types
//!
//! Core domain types used throughout Bodega POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  product_id     │       │
//! │  │  name           │   │  date           │   │  product_name   │       │
//! │  │  unit_cost      │   │  wholesale      │   │  quantity       │       │
//! │  │  margin_bps     │   │  total_cents    │   │  unit_price     │       │
//! │  │  stock          │   │  lines[]        │   │  snapshot       │       │
//! │  │  sold_count     │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  Product is REFERENCED by SaleLine, never owned: the line carries a    │
//! │  frozen LineSnapshot so sales survive later catalog changes.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{MarginRate, Money};

// =============================================================================
// Product Category
// =============================================================================

/// The catalog categories carried by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    /// House whisky blends.
    Blend,
    /// Boxed assortments.
    Caja,
    /// Gins.
    Gin,
}

impl ProductCategory {
    /// Storage representation (lowercase, stable across versions).
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Blend => "blend",
            ProductCategory::Caja => "caja",
            ProductCategory::Gin => "gin",
        }
    }

    /// Parses the storage representation back into the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blend" => Some(ProductCategory::Blend),
            "caja" => Some(ProductCategory::Caja),
            "gin" => Some(ProductCategory::Gin),
            _ => None,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A priced product in the catalog, viewed through its ledger counters.
///
/// The `(stock, sold_count)` pair is only ever mutated through the
/// ledger's atomic `adjust` primitive, never written directly by the
/// sale layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, also captured into sale lines at sale time.
    pub name: String,

    /// Catalog category.
    pub category: ProductCategory,

    /// Unit cost in cents.
    pub unit_cost_cents: i64,

    /// Standard profit margin in basis points (2000 = 20%).
    pub margin_bps: u32,

    /// Wholesale profit margin in basis points. 0 means "no wholesale
    /// override configured" and standard margin applies regardless of
    /// the sale's wholesale flag.
    pub wholesale_margin_bps: u32,

    /// Units currently on hand. Invariant: never negative.
    pub stock: i64,

    /// Cumulative units sold over the product's lifetime.
    pub sold_count: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Returns the standard margin.
    #[inline]
    pub fn margin(&self) -> MarginRate {
        MarginRate::from_bps(self.margin_bps)
    }

    /// Returns the wholesale margin.
    #[inline]
    pub fn wholesale_margin(&self) -> MarginRate {
        MarginRate::from_bps(self.wholesale_margin_bps)
    }
}

// =============================================================================
// Line Snapshot
// =============================================================================

/// The frozen economic facts of one sale line.
///
/// ## Immutability
/// Once the owning sale is persisted, no field here is ever mutated.
/// An edit that changes quantities or the item set produces *new*
/// snapshot values computed from the product's attributes at edit time;
/// it never rewrites other lines or other sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Product unit cost at sale time.
    pub unit_cost_cents: i64,

    /// Itemized cost contribution for this line. Populated by an
    /// external pricing collaborator; this engine records 0.
    pub cost_extras_cents: i64,

    /// Standard margin at sale time.
    pub margin_bps: u32,

    /// Wholesale margin, present only if wholesale pricing was
    /// actually used for this line.
    pub wholesale_margin_bps: Option<u32>,

    /// The unit price actually charged (explicit override or computed).
    pub unit_price_cents: i64,
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale.
///
/// Carries a durable copy of the product name and a [`LineSnapshot`] so
/// the sale survives later price changes or catalog deletion of the
/// referenced product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    /// Reference only; the product may no longer exist.
    pub product_id: String,
    /// Product name at line-creation time, not re-derived.
    pub product_name: String,
    /// Units purchased. Always >= 1.
    pub quantity: i64,
    /// Price per unit actually charged.
    pub unit_price_cents: i64,
    /// Frozen economics.
    pub snapshot: LineSnapshot,
}

impl SaleLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total: `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction.
///
/// `total_cents` is derived: recomputed by the engine on every create
/// and edit as `Σ(line.unit_price × quantity)`, never trusted from
/// caller input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Business date of the sale (defaults to "now" at creation).
    pub date: DateTime<Utc>,
    /// Whether wholesale pricing applied to snapshot construction.
    pub wholesale: bool,
    /// Resolved caller identity, attached by the auth collaborator.
    pub seller_id: Option<String>,
    /// Derived total in cents.
    pub total_cents: i64,
    /// Ordered, non-empty line set. Exclusively owned by this sale.
    pub lines: Vec<SaleLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Requested Line
// =============================================================================

/// A line as requested by a caller, before products are resolved and
/// snapshots are frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedLine {
    /// Product to sell.
    pub product_id: String,
    /// Units requested. Must be >= 1.
    pub quantity: i64,
    /// Optional explicit unit price. When present it wins over the
    /// margin-computed price and is what the snapshot records.
    pub unit_price_cents: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in [
            ProductCategory::Blend,
            ProductCategory::Caja,
            ProductCategory::Gin,
        ] {
            assert_eq!(ProductCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(ProductCategory::parse("vermouth"), None);
    }

    #[test]
    fn test_line_total() {
        let line = SaleLine {
            id: "l1".to_string(),
            sale_id: "s1".to_string(),
            product_id: "p1".to_string(),
            product_name: "Gin Nativo".to_string(),
            quantity: 3,
            unit_price_cents: 12000,
            snapshot: LineSnapshot {
                unit_cost_cents: 10000,
                cost_extras_cents: 0,
                margin_bps: 2000,
                wholesale_margin_bps: None,
                unit_price_cents: 12000,
            },
        };
        assert_eq!(line.line_total().cents(), 36000);
    }
}
