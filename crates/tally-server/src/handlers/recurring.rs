//! Recurring expense handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::resolve_today;
use crate::{run_recurring, AppError, AppState, API_ACTOR};
use tally_core::models::RunReport;
use tally_core::{recurrence, RecurrencePlan};

/// Query parameters for recurring runs
#[derive(Debug, Deserialize)]
pub struct RecurringQuery {
    /// Run date (YYYY-MM-DD, default: server's local date)
    pub today: Option<String>,
}

#[derive(Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: RunReport,
}

/// POST /api/recurring/process - Materialize due recurring expenses
///
/// Responds 500 with the full report when any template failed to apply.
pub async fn process_recurring(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecurringQuery>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    let today = resolve_today(params.today.as_deref())?;

    let report = run_recurring(&state, API_ACTOR, today).await?;
    let success = report.is_success();

    let status = if success {
        info!(
            inserted = report.inserted,
            anchors_updated = report.anchors_updated,
            "Recurring run completed"
        );
        StatusCode::OK
    } else {
        warn!(failed = report.failed.len(), "Recurring run completed with failures");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(ProcessResponse { success, report })))
}

/// GET /api/recurring/preview - Occurrences a run would insert, without writing
pub async fn preview_recurring(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecurringQuery>,
) -> Result<Json<RecurrencePlan>, AppError> {
    let today = resolve_today(params.today.as_deref())?;
    let rows = state.db.list_recurring()?;
    Ok(Json(recurrence::plan(today, &rows)))
}
