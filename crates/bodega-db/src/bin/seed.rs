//! # Seed Data Generator
//!
//! Populates the database with a development catalog.
//!
//! ## Usage
//! ```bash
//! # Seed the default catalog
//! cargo run -p bodega-db --bin seed
//!
//! # Specify database path
//! cargo run -p bodega-db --bin seed -- --db ./data/bodega.db
//! ```
//!
//! ## Generated Products
//! One product per entry below, cycling categories:
//! - blend: house whisky blends
//! - caja:  boxed assortments
//! - gin:   gins
//!
//! Each product gets a unit cost, a standard margin, an optional
//! wholesale margin (0 = none configured), and an opening stock.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use bodega_core::{Product, ProductCategory};
use bodega_db::{Database, DbConfig};

/// name, category, unit_cost_cents, margin_bps, wholesale_margin_bps, stock
const CATALOG: &[(&str, ProductCategory, i64, u32, u32, i64)] = &[
    ("Blend Roble 750ml", ProductCategory::Blend, 10000, 2000, 1200, 40),
    ("Blend Turba 750ml", ProductCategory::Blend, 12500, 2000, 1200, 25),
    ("Blend Cereza 500ml", ProductCategory::Blend, 8000, 2500, 0, 30),
    ("Caja Degustación x3", ProductCategory::Caja, 28000, 1800, 1000, 12),
    ("Caja Regalo x6", ProductCategory::Caja, 52000, 1800, 1000, 8),
    ("Gin Nativo 750ml", ProductCategory::Gin, 9000, 3000, 1500, 60),
    ("Gin Cítrico 750ml", ProductCategory::Gin, 9500, 3000, 1500, 45),
    ("Gin Reserva 500ml", ProductCategory::Gin, 14000, 3500, 0, 15),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./bodega.db".to_string());

    println!("Seeding catalog into {db_path}");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let products = db.products();

    let now = Utc::now();
    for (name, category, unit_cost_cents, margin_bps, wholesale_margin_bps, stock) in CATALOG {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: *category,
            unit_cost_cents: *unit_cost_cents,
            margin_bps: *margin_bps,
            wholesale_margin_bps: *wholesale_margin_bps,
            stock: *stock,
            sold_count: 0,
            created_at: now,
            updated_at: now,
        };
        products.insert(&product).await?;
        println!("  + {} ({})", product.name, product.category.as_str());
    }

    let count = products.count().await?;
    println!("Done. Catalog now holds {count} products.");

    db.close().await;
    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
