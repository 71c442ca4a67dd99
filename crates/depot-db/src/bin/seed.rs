//! # Seed Data Generator
//!
//! Populates a database with warehouse stock by driving the real ledger:
//! every unit arrives through a receipt batch and leaves through a
//! shipment batch, so the resulting history is a genuine audit trail.
//!
//! ## Usage
//! ```bash
//! # 50 items at each of 3 warehouses (default)
//! cargo run -p depot-db --bin seed
//!
//! # Custom shape and database
//! cargo run -p depot-db --bin seed -- --items 200 --locations 5 --db ./data/depot.db
//!
//! # Use a config file (otherwise the platform config dir is tried)
//! cargo run -p depot-db --bin seed -- --config ./depot.toml
//! ```
//!
//! ## What It Does
//! 1. Receives 10 to 99 units of each item at each warehouse (one batch per warehouse)
//! 2. Ships roughly a third of every line back out (one batch per warehouse)
//! 3. Prints low-stock records and the value held at each warehouse
//! 4. Reconciles every stock record against its history

use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use depot_core::{Identity, LedgerEntry, ProductId, StockThresholds, Warehouse, WarehouseId};
use depot_db::{Database, DbConfig, DepotConfig, StockFilter};

const DEFAULT_ITEMS: usize = 50;
const DEFAULT_LOCATIONS: usize = 3;
const FALLBACK_LOW_STOCK: i64 = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,depot=debug,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut items = DEFAULT_ITEMS;
    let mut locations = DEFAULT_LOCATIONS;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--items" | "-n" => {
                if i + 1 < args.len() {
                    items = args[i + 1].parse().unwrap_or(DEFAULT_ITEMS);
                    i += 1;
                }
            }
            "--locations" | "-l" => {
                if i + 1 < args.len() {
                    locations = args[i + 1].parse().unwrap_or(DEFAULT_LOCATIONS);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Depot Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --items <N>        Items per warehouse (default: {DEFAULT_ITEMS})");
                println!("  -l, --locations <N>    Number of warehouses (default: {DEFAULT_LOCATIONS})");
                println!("  -d, --db <PATH>        Database file path (overrides config)");
                println!("  -c, --config <PATH>    depot.toml to load");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = DepotConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    let actor = config.stock.default_actor.clone();

    println!("Depot Seed Data Generator");
    println!("=========================");
    println!("Database:   {}", config.database.path.display());
    println!("Items:      {items}");
    println!("Warehouses: {locations}");
    println!();

    let db = Database::new(DbConfig::from_settings(&config.database)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.stock::<Warehouse>().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} stock records");
        println!("  Skipping seed to avoid double-receiving.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let batch = db.batch::<Warehouse>();

    for loc in 0..locations {
        let location = warehouse(loc);

        let receipt: Vec<_> = (0..items)
            .map(|item| {
                LedgerEntry::inbound(product(item), location.clone(), received_qty(item, loc))
                    .with_reference(format!("GRN-{:03}", loc + 1))
                    .with_lot(format!("LOT-{:02}", item % 7))
            })
            .collect();
        let received = batch.process_batch(receipt, &actor).await?;

        let shipment: Vec<_> = (0..items)
            .map(|item| {
                LedgerEntry::outbound(product(item), location.clone(), shipped_qty(item, loc))
                    .with_reference(format!("SO-{:03}", loc + 1))
            })
            .collect();
        let shipped = batch.process_batch(shipment, &actor).await?;

        println!("  {location}: {} received, {} shipped", received.len(), shipped.len());
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Applied {} entries in {:?}", items * locations * 2, elapsed);

    // Low stock
    let threshold = config
        .stock
        .low_stock_threshold
        .unwrap_or_else(|| Decimal::from(FALLBACK_LOW_STOCK));
    let low = db.views::<Warehouse>().low_stock(&StockThresholds::global(threshold)).await?;
    println!();
    println!("Low stock (≤ {threshold}): {} records", low.len());
    for record in low.iter().take(10) {
        println!("  {} @ {}: {}", record.item_id, record.location_id, record.quantity);
    }

    // Valuation
    println!();
    println!("Location value:");
    let prices = |item: &ProductId| unit_price(item);
    for loc in 0..locations {
        let valuation = db.views::<Warehouse>().location_value(&warehouse(loc), &prices).await?;
        println!(
            "  {}: {} across {} records ({} unpriced)",
            valuation.location_id,
            valuation.total_value,
            valuation.record_count,
            valuation.unpriced_items.len()
        );
    }

    // Audit
    println!();
    println!("Verifying history chains...");
    let records = db.stock::<Warehouse>().list(&StockFilter::default()).await?;
    let mut broken = 0;
    for record in &records {
        if !db.history().reconcile(&record.id).await?.is_consistent() {
            broken += 1;
        }
    }
    info!(records = records.len(), broken, "Reconciliation finished");
    println!("  {} records checked, {broken} inconsistent", records.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn product(index: usize) -> ProductId {
    ProductId::new(format!("P-{:04}", index + 1))
}

fn warehouse(index: usize) -> WarehouseId {
    WarehouseId::new(format!("WH-{:02}", index + 1))
}

fn received_qty(item: usize, loc: usize) -> Decimal {
    Decimal::from(((item * 31 + loc * 17) % 90 + 10) as i64)
}

/// A third of the receipt, rounded down; the odd line ships everything.
fn shipped_qty(item: usize, loc: usize) -> Decimal {
    let received = received_qty(item, loc);
    if (item + loc) % 13 == 0 {
        received
    } else {
        (received / Decimal::from(3)).floor().max(Decimal::ONE)
    }
}

/// Every fifth item has no price, the rest cost 1.00 to 19.95.
fn unit_price(item: &ProductId) -> Option<Decimal> {
    let n: u32 = item.as_str().trim_start_matches("P-").parse().ok()?;
    if n % 5 == 0 {
        return None;
    }
    Some(Decimal::new(i64::from(100 + (n * 37) % 1896), 2))
}
