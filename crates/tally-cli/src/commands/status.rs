//! Status-related command implementations (status, runs)

use anyhow::Result;
use tally_core::db::Database;
use tally_core::{Config, ExpenseFilter};

use super::{open_db, truncate};

pub fn cmd_status(config: &Config) -> Result<()> {
    let db_path = &config.database.path;

    println!();
    println!("📊 Tally Status");
    println!("   ─────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = std::fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    println!(
        "   Server: http://{}:{}",
        config.server.host, config.server.port
    );
    match config.scheduler.interval_hours {
        Some(hours) => println!("   Scheduler: every {} hours", hours),
        None => println!("   Scheduler: disabled"),
    }
    match config.budget.monthly {
        Some(budget) => println!("   Monthly budget: {}", budget),
        None => println!("   Monthly budget: (not set)"),
    }

    if db_path.exists() {
        match open_db(db_path) {
            Ok(db) => {
                let total = db.count_expenses()?;
                let recurring = db.list_recurring()?.len();
                println!();
                println!("   Expenses: {}", total);
                println!("   Recurring records: {}", recurring);

                let latest = db.list_expenses(&ExpenseFilter {
                    limit: Some(1),
                    ..Default::default()
                })?;
                if let Some(expense) = latest.first() {
                    println!("   Latest: {} on {}", expense.name, expense.date_added);
                }
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {:#}", e);
            }
        }
    }

    Ok(())
}

/// Show the audit log, newest first
pub fn cmd_runs(db: &Database, limit: i64) -> Result<()> {
    let entries = db.list_audit_log(limit)?;

    if entries.is_empty() {
        println!("No recorded runs yet. Try: tally process-recurring");
        return Ok(());
    }

    println!(
        "{:19}  {:10}  {:18}  {}",
        "Time (UTC)", "Actor", "Action", "Details"
    );
    println!("{}", "-".repeat(90));

    for entry in &entries {
        let details = match (&entry.details, entry.entity_id) {
            (Some(details), _) => truncate(details, 60),
            (None, Some(id)) => format!(
                "{} #{}",
                entry.entity_type.as_deref().unwrap_or("record"),
                id
            ),
            (None, None) => String::new(),
        };
        println!(
            "{:19}  {:10}  {:18}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            truncate(&entry.actor, 10),
            truncate(&entry.action, 18),
            details
        );
    }

    Ok(())
}
