//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod expenses;
pub mod export;
pub mod health;
pub mod recurring;
pub mod reports;

// Re-export all handlers for use in router
pub use audit::*;
pub use expenses::*;
pub use export::*;
pub use health::*;
pub use recurring::*;
pub use reports::*;

use chrono::{Local, NaiveDate};
use tally_core::models::parse_date;

use crate::AppError;

/// Parse an optional `YYYY-MM-DD` query parameter
pub(crate) fn parse_date_param(
    value: Option<&str>,
    name: &str,
) -> Result<Option<NaiveDate>, AppError> {
    value.map(parse_date).transpose().map_err(|_| {
        AppError::bad_request(&format!("Invalid '{}' date format (use YYYY-MM-DD)", name))
    })
}

/// `today` query parameter, defaulting to the server's local date
pub(crate) fn resolve_today(value: Option<&str>) -> Result<NaiveDate, AppError> {
    Ok(parse_date_param(value, "today")?.unwrap_or_else(|| Local::now().date_naive()))
}
