//! # Repository Module
//!
//! Database repository implementations for Bodega POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Engine operation                                                       │
//! │       │                                                                 │
//! │       │  db.products().adjust(id, -3, 3)                               │
//! │       ▼                                                                 │
//! │  ProductRepository                  SaleRepository                      │
//! │  ├── get_by_id / list               ├── get_by_id / list                │
//! │  ├── insert / update / delete       ├── insert_with                     │
//! │  └── adjust (conditional UPDATE)    ├── replace_lines_with              │
//! │       │                             └── delete_with                     │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  The `*_with` variants take a &mut SqliteConnection so the engine      │
//! │  can span one transaction across the sale write and the stock          │
//! │  adjustments it implies.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and the ledger adjust primitive
//! - [`sale::SaleRepository`] - Sale header + line operations

pub mod product;
pub mod sale;
