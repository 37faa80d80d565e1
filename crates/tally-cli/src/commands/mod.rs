//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db)
//! - `expenses` - Add and list expenses
//! - `export` - CSV export
//! - `recurring` - Recurring expense processing
//! - `reports` - Summary and budget reports
//! - `serve` - Web server command
//! - `status` - Status and run history

pub mod core;
pub mod expenses;
pub mod export;
pub mod recurring;
pub mod reports;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use self::core::*;
pub use expenses::*;
pub use export::*;
pub use recurring::*;
pub use reports::*;
pub use serve::*;
pub use status::*;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::models::parse_date;
use tally_core::ExpenseFilter;

/// Actor recorded in the audit log for CLI writes
pub const AUDIT_ACTOR: &str = "cli";

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a `--flag YYYY-MM-DD` argument
pub fn parse_date_arg(value: &str, flag: &str) -> Result<NaiveDate> {
    parse_date(value).with_context(|| format!("Invalid {} date (use YYYY-MM-DD)", flag))
}

/// The given date, or today's local date
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(value) => parse_date_arg(value, "--today"),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Build a list/export filter from command-line flags
pub fn build_filter(
    recurring: bool,
    from: Option<&str>,
    to: Option<&str>,
    category: Option<String>,
    limit: Option<i64>,
) -> Result<ExpenseFilter> {
    Ok(ExpenseFilter {
        recurring: recurring.then_some(true),
        from: from.map(|s| parse_date_arg(s, "--from")).transpose()?,
        to: to.map(|s| parse_date_arg(s, "--to")).transpose()?,
        category,
        limit,
    })
}
