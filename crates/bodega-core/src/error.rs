//! # Error Types
//!
//! Domain-specific error types for bodega-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bodega-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input shape failures                           │
//! │                                                                         │
//! │  bodega-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bodega-engine errors (separate crate)                                 │
//! │  └── EngineError      - CoreError | DbError, per-operation outcome     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → transport layer     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, quantities)
//! 3. Errors are enum variants, never String
//! 4. No error here is process-fatal; all are per-operation outcomes

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors abort an operation before any stock mutation happens and
/// are surfaced to the caller verbatim.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product id doesn't resolve during sale validation
    /// - Product was deleted from the catalog
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Insufficient stock to cover a requested line.
    ///
    /// ## When This Occurs
    /// - Creating a sale with `quantity > product.stock`
    /// - Editing a sale with `quantity > product.stock + restorable`
    /// - The conditional stock decrement losing a post-validation race
    ///
    /// ## User Workflow
    /// ```text
    /// Edit request line (qty: 12)
    ///      │
    ///      ▼
    /// Ledger check: stock = 7, this sale restores 3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Gin Nativo", available: 7,
    ///                     restorable: 3, requested: 12 }
    /// ```
    #[error(
        "Insufficient stock for \"{name}\": available {available}, restorable {restorable}, requested {requested}"
    )]
    InsufficientStock {
        name: String,
        /// Stock currently on hand.
        available: i64,
        /// Units the operation itself would restore before deducting;
        /// 0 at create time.
        restorable: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request doesn't meet shape requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A sale must carry at least one line.
    #[error("a sale requires at least one line")]
    EmptyLineSet,

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            name: "Blend Roble".to_string(),
            available: 7,
            restorable: 3,
            requested: 12,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for \"Blend Roble\": available 7, restorable 3, requested 12"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(err.to_string(), "product_id is required");

        let err = ValidationError::EmptyLineSet;
        assert_eq!(err.to_string(), "a sale requires at least one line");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
