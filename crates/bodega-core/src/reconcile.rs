//! # Reconciliation Module
//!
//! The pure half of the stock reconciliation engine: converting an
//! item-set change into per-product net deltas.
//!
//! ## Diff-Based Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │           Edit is a DIFF, never delete-then-recreate                    │
//! │                                                                         │
//! │  old lines: [P qty 3]             new lines: [P qty 5, Q qty 1]        │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  old map: {P: 3}                  new map: {P: 5, Q: 1}                │
//! │                                                                         │
//! │  union(P, Q):  P: 5 - 3 = +2  → adjust(P, stock -2, sold +2)           │
//! │                Q: 1 - 0 = +1  → adjust(Q, stock -1, sold +1)           │
//! │                                                                         │
//! │  A product only in the old set gets delta = -old, fully restoring      │
//! │  its stock; one only in the new set is a fresh deduction.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure value-map math; the atomic application of the
//! deltas lives in the db layer's `adjust` primitive.

use std::collections::HashMap;

/// A per-product net quantity change between two item sets.
///
/// Sign convention is "units newly sold": a positive `quantity` means
/// stock goes down and sold_count goes up by that amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDelta {
    pub product_id: String,
    /// `new_qty - old_qty` for this product.
    pub quantity: i64,
}

impl ProductDelta {
    /// Stock adjustment to apply for this delta.
    #[inline]
    pub fn stock_delta(&self) -> i64 {
        -self.quantity
    }

    /// Sold-count adjustment to apply for this delta.
    #[inline]
    pub fn sold_count_delta(&self) -> i64 {
        self.quantity
    }
}

/// Aggregates `(product_id, quantity)` pairs into a per-product sum.
///
/// Duplicate lines for the same product are summed, so two lines of
/// quantity 2 and 3 reconcile identically to one line of quantity 5.
pub fn quantities_by_product<'a, I>(lines: I) -> HashMap<String, i64>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut map: HashMap<String, i64> = HashMap::new();
    for (product_id, quantity) in lines {
        *map.entry(product_id.to_string()).or_insert(0) += quantity;
    }
    map
}

/// Computes per-product net deltas between two quantity maps.
///
/// Walks the union of both key sets; products absent from one side
/// contribute 0 there. Zero deltas are dropped, and results are sorted
/// by product id so application order is deterministic.
pub fn stock_deltas(
    old: &HashMap<String, i64>,
    new: &HashMap<String, i64>,
) -> Vec<ProductDelta> {
    let mut deltas: Vec<ProductDelta> = old
        .keys()
        .chain(new.keys().filter(|k| !old.contains_key(*k)))
        .filter_map(|product_id| {
            let old_qty = old.get(product_id).copied().unwrap_or(0);
            let new_qty = new.get(product_id).copied().unwrap_or(0);
            let quantity = new_qty - old_qty;
            (quantity != 0).then(|| ProductDelta {
                product_id: product_id.clone(),
                quantity,
            })
        })
        .collect();

    deltas.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    deltas
}

/// Stock available to an edit of an existing sale.
///
/// The sale's own old quantity for the product will be restored by the
/// reconciliation, so it counts as available. This is what permits
/// raising the quantity of a product the sale already partially
/// consumed.
#[inline]
pub fn available_for_edit(current_stock: i64, restorable: i64) -> i64 {
    current_stock + restorable
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_quantities_sum_duplicates() {
        let q = quantities_by_product([("p1", 2), ("p2", 1), ("p1", 3)]);
        assert_eq!(q, map(&[("p1", 5), ("p2", 1)]));
    }

    #[test]
    fn test_identical_sets_produce_no_deltas() {
        let old = map(&[("p1", 3), ("p2", 1)]);
        let new = map(&[("p2", 1), ("p1", 3)]);
        assert!(stock_deltas(&old, &new).is_empty());
    }

    #[test]
    fn test_regrouped_lines_are_a_no_op() {
        // One line of 5 vs two lines of 2 + 3: same per-product quantity
        let old = quantities_by_product([("p1", 5)]);
        let new = quantities_by_product([("p1", 2), ("p1", 3)]);
        assert!(stock_deltas(&old, &new).is_empty());
    }

    #[test]
    fn test_union_covers_both_sides() {
        let old = map(&[("p1", 3), ("p2", 2)]);
        let new = map(&[("p1", 5), ("p3", 4)]);
        let deltas = stock_deltas(&old, &new);

        assert_eq!(
            deltas,
            vec![
                ProductDelta {
                    product_id: "p1".to_string(),
                    quantity: 2,
                },
                ProductDelta {
                    product_id: "p2".to_string(),
                    quantity: -2,
                },
                ProductDelta {
                    product_id: "p3".to_string(),
                    quantity: 4,
                },
            ]
        );
    }

    #[test]
    fn test_delta_sign_convention() {
        let delta = ProductDelta {
            product_id: "p1".to_string(),
            quantity: 2,
        };
        // 2 more units sold: stock down, sold_count up
        assert_eq!(delta.stock_delta(), -2);
        assert_eq!(delta.sold_count_delta(), 2);

        let restore = ProductDelta {
            product_id: "p2".to_string(),
            quantity: -3,
        };
        assert_eq!(restore.stock_delta(), 3);
        assert_eq!(restore.sold_count_delta(), -3);
    }

    #[test]
    fn test_available_for_edit() {
        // Scenario C shape: stock 7, the sale holds 3, so 10 are reachable
        assert_eq!(available_for_edit(7, 3), 10);
        assert_eq!(available_for_edit(7, 0), 7);
    }
}
