//! Export handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Response, StatusCode},
};
use serde::Deserialize;
use tracing::info;

use super::parse_date_param;
use crate::{AppError, AppState, API_ACTOR};
use tally_core::ExpenseFilter;

/// Query parameters for expense export
#[derive(Debug, Deserialize)]
pub struct ExpenseExportQuery {
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
    /// Only recurring records
    #[serde(default)]
    pub recurring: bool,
}

/// GET /api/export/expenses - Export expenses to CSV
pub async fn export_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseExportQuery>,
) -> Result<Response<Body>, AppError> {
    let filter = ExpenseFilter {
        recurring: params.recurring.then_some(true),
        from: parse_date_param(params.from.as_deref(), "from")?,
        to: parse_date_param(params.to.as_deref(), "to")?,
        ..Default::default()
    };

    state.db.log_audit(
        API_ACTOR,
        "export_expenses",
        Some("expense"),
        None,
        Some(&format!(
            "from={:?}, to={:?}, recurring={}",
            filter.from, filter.to, params.recurring
        )),
    )?;

    let csv = state.db.export_expenses_csv(&filter)?;
    let lines = csv.lines().count().saturating_sub(1);
    info!("Exported {} expenses to CSV", lines);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"expenses.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}
