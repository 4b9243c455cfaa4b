//! # Pricing Module
//!
//! The pure half of the snapshot builder: margin selection and unit
//! price computation over a product's *current* economic attributes.
//!
//! ## The Margin Gate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Which margin applies to a sale line?                       │
//! │                                                                         │
//! │  wholesale flag      wholesale_margin_bps      selected margin          │
//! │  ──────────────      ────────────────────      ───────────────          │
//! │  false               (any)                     margin_bps               │
//! │  true                0  (not configured)       margin_bps  ← fallback   │
//! │  true                > 0                       wholesale_margin_bps     │
//! │                                                                         │
//! │  Strict two-condition gate: a wholesale sale against a product with    │
//! │  no wholesale margin silently falls back to the standard margin.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product lookup and its `ProductNotFound` failure belong to the engine
//! layer; every function here is a pure function over resolved state and
//! never touches stock.

use crate::money::{MarginRate, Money};
use crate::types::{LineSnapshot, Product};

/// Selects the margin to apply for one line.
///
/// Returns the effective margin plus, when the wholesale tier was the
/// one selected, the wholesale rate for recording into the snapshot.
pub fn select_margin(product: &Product, wholesale: bool) -> (MarginRate, Option<MarginRate>) {
    if wholesale && !product.wholesale_margin().is_zero() {
        (product.wholesale_margin(), Some(product.wholesale_margin()))
    } else {
        (product.margin(), None)
    }
}

/// Computes the margin-derived unit price for a product.
///
/// `unit_cost × (1 + selected_margin / 100)` in integer math.
pub fn computed_unit_price(product: &Product, wholesale: bool) -> Money {
    let (margin, _) = select_margin(product, wholesale);
    product.unit_cost().apply_margin(margin)
}

/// Freezes the economics of one line.
///
/// The returned price is the one actually charged: the caller's explicit
/// price when supplied, otherwise the computed one. The snapshot's
/// `unit_price_cents` always reflects that final price, never the raw
/// computed value when overridden.
pub fn price_line(
    product: &Product,
    wholesale: bool,
    explicit_unit_price: Option<Money>,
) -> (Money, LineSnapshot) {
    let (margin, wholesale_margin) = select_margin(product, wholesale);
    let computed = product.unit_cost().apply_margin(margin);
    let unit_price = explicit_unit_price.unwrap_or(computed);

    let snapshot = LineSnapshot {
        unit_cost_cents: product.unit_cost_cents,
        // Itemized costs come from an external pricing collaborator;
        // the engine records a placeholder zero.
        cost_extras_cents: 0,
        margin_bps: product.margin_bps,
        wholesale_margin_bps: wholesale_margin.map(|m| m.bps()),
        unit_price_cents: unit_price.cents(),
    };

    (unit_price, snapshot)
}

// =============================================================================
// Unit Tests
// =============================================================================
