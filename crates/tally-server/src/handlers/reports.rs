//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use super::{parse_date_param, resolve_today};
use crate::{AppError, AppState};
use tally_core::db::month_start;
use tally_core::models::{parse_amount, BudgetStatus, SpendingSummary};

/// Query parameters for the spending summary
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Start date (YYYY-MM-DD, default: first of the current month)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD, default: today)
    pub to: Option<String>,
}

/// Resolve a date range, defaulting to month-to-date
fn resolve_range(from: Option<&str>, to: Option<&str>) -> Result<(NaiveDate, NaiveDate), AppError> {
    let to = parse_date_param(to, "to")?.unwrap_or_else(|| Local::now().date_naive());
    let from = parse_date_param(from, "from")?.unwrap_or_else(|| month_start(to));

    if from > to {
        return Err(AppError::bad_request("'from' must not be after 'to'"));
    }

    Ok((from, to))
}

/// GET /api/summary - Spending totals and category breakdown
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<SpendingSummary>, AppError> {
    let (from, to) = resolve_range(params.from.as_deref(), params.to.as_deref())?;
    let summary = state.db.get_spending_summary(from, to)?;
    Ok(Json(summary))
}

/// Query parameters for budget status
#[derive(Debug, Deserialize)]
pub struct BudgetQuery {
    /// Monthly budget (default: configured budget)
    pub amount: Option<String>,
    /// Reference date (YYYY-MM-DD, default: today)
    pub today: Option<String>,
}

/// GET /api/budget - Month-to-date spending against a budget
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BudgetQuery>,
) -> Result<Json<BudgetStatus>, AppError> {
    let budget = match params.amount.as_deref() {
        Some(amount) => parse_amount(amount)?,
        None => state.config.default_budget.ok_or_else(|| {
            AppError::bad_request("No budget given. Pass ?amount= or configure a monthly budget")
        })?,
    };
    let today = resolve_today(params.today.as_deref())?;

    let status = state.db.get_budget_status(budget, today)?;
    Ok(Json(status))
}
