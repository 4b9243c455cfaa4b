//! # bodega-engine: Sale Lifecycle Orchestration
//!
//! Glues the pure logic in `bodega-core` to the persistence layer in
//! `bodega-db`: every sale lifecycle operation (create, edit, delete)
//! runs its validate → build → persist → apply pipeline here, inside a
//! single database transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Callers (HTTP controller, CLI, tests)                                  │
//! │                        │                                                │
//! │  ┌─────────────────────▼─────────────────────┐                          │
//! │  │       ★ bodega-engine (THIS CRATE) ★      │                          │
//! │  │                                           │                          │
//! │  │   SalesEngine                             │                          │
//! │  │     create_sale  ──┐                      │                          │
//! │  │     edit_sale    ──┼── validate/build in  │── bodega-core (pure)     │
//! │  │     delete_sale  ──┘   persist/apply in   │── bodega-db (SQLite)     │
//! │  └───────────────────────────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Model
//!
//! [`EngineError`] is a transparent union of the domain errors from
//! `bodega-core` and the storage errors from `bodega-db`; callers match
//! on the inner variants.

pub mod engine;
pub mod error;

pub use engine::{
    CreateSaleRequest, DeleteOutcome, EditSaleRequest, SaleOutcome, SalesEngine,
    SkippedAdjustment,
};
pub use error::{EngineError, EngineResult};
