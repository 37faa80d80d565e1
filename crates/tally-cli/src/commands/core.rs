//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Open the database, running migrations if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    Database::new(&db_path.to_string_lossy())
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let count = db.count_expenses().context("Failed to read expenses")?;

    println!("✅ Database initialized successfully!");
    if count > 0 {
        println!("   {} existing expenses", count);
    }
    println!();
    println!("Next steps:");
    println!("  1. Record an expense: tally add Lunch Food 12.50");
    println!("  2. Add a recurring one: tally add Rent Housing 900 --schedule monthly");
    println!("  3. Catch up recurring expenses: tally process-recurring");

    Ok(())
}
