//! # Engine Error Types
//!
//! One per-operation outcome type over the domain and storage errors.
//!
//! ## Recoverability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InsufficientStock / ProductNotFound (validation)                       │
//! │      → operation aborted BEFORE any mutation, surfaced verbatim        │
//! │                                                                         │
//! │  WouldOverdraw at apply time (post-validation race)                     │
//! │      → transaction rolled back, surfaced as InsufficientStock          │
//! │                                                                         │
//! │  ProductMissing at apply time                                           │
//! │      → NOT an error: sale committed, line's stock effect skipped,      │
//! │        reported in SaleOutcome::skipped                                │
//! │                                                                         │
//! │  Nothing here is process-fatal.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use bodega_core::CoreError;
use bodega_db::DbError;

/// Errors surfaced by sale lifecycle operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation (unknown product, insufficient stock,
    /// missing sale, malformed request).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
