//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{parse_date_param, resolve_today};
use crate::{AppError, AppState, API_ACTOR, MAX_PAGE_LIMIT};
use tally_core::models::{parse_amount, Expense, NewExpense, Schedule};
use tally_core::ExpenseFilter;

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only recurring (true) or only one-off (false) records
    pub recurring: Option<bool>,
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
    pub category: Option<String>,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub limit: i64,
}

/// GET /api/expenses - List expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);

    let filter = ExpenseFilter {
        recurring: params.recurring,
        from: parse_date_param(params.from.as_deref(), "from")?,
        to: parse_date_param(params.to.as_deref(), "to")?,
        category: params.category,
        limit: Some(limit),
    };

    let expenses = state.db.list_expenses(&filter)?;

    Ok(Json(ExpenseListResponse { expenses, limit }))
}

/// GET /api/expenses/:id - Get a single expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    state
        .db
        .get_expense(id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Expense {} not found", id)))
}

/// Amount given as a JSON string or number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub name: String,
    pub category: String,
    pub amount: AmountInput,
    /// Transaction date, or the anchor of a recurring template (default: today)
    pub date: Option<String>,
    /// daily, weekly or monthly; makes the expense recurring
    pub schedule: Option<String>,
}

/// POST /api/expenses - Add an expense or recurring template
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let amount = parse_amount(&req.amount.as_text())?;
    let date = resolve_today(req.date.as_deref())?;

    let new_expense = match req.schedule.as_deref() {
        Some(schedule) => {
            let schedule: Schedule = schedule.parse()?;
            NewExpense::recurring(&req.name, &req.category, amount, date, schedule)
        }
        None => NewExpense::one_off(&req.name, &req.category, amount, date),
    };

    let id = state.db.insert_expense(&new_expense)?;

    if let Err(e) = state.db.log_audit(
        API_ACTOR,
        "add_expense",
        Some("expense"),
        Some(id),
        Some(&format!("name={}, amount={}", new_expense.name, new_expense.amount)),
    ) {
        warn!(id, error = %e, "Failed to audit added expense");
    }

    info!(id, name = %new_expense.name, "Expense added");

    let expense = state
        .db
        .get_expense(id)?
        .ok_or_else(|| AppError::internal("Inserted expense could not be read back"))?;

    Ok((StatusCode::CREATED, Json(expense)))
}
