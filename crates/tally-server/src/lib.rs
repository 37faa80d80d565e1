//! Tally Web Server
//!
//! Axum-based REST API for the Tally expense ledger.
//!
//! - Expense add/list/get, summary, budget and CSV export endpoints
//! - Recurring processing on demand (`POST /api/recurring/process`) and on an
//!   optional interval
//! - A single run lock so in-process recurring runs never overlap
//! - Audit logging of writes and runs
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use tally_core::db::Database;
use tally_core::models::RunReport;
use tally_core::{Config, RecurringProcessor};

mod handlers;
mod scheduler;

pub use scheduler::{start_recurring_scheduler, RecurringScheduleConfig};

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Actor recorded in the audit log for API requests
pub const API_ACTOR: &str = "api";

/// Server configuration
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Hours between automatic recurring runs (None = disabled)
    pub scheduler_interval_hours: Option<u64>,
    /// Budget used by `GET /api/budget` when no amount is given
    pub default_budget: Option<Decimal>,
}

impl ServerConfig {
    /// Server settings from resolved configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            allowed_origins: vec![],
            scheduler_interval_hours: config.scheduler.interval_hours,
            default_budget: config.budget.monthly,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Held for the whole of a recurring run (HTTP trigger and scheduler)
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db,
            config,
            run_lock: Mutex::new(()),
        }
    }
}

/// Run recurring processing as of `today` under the run lock and audit it
///
/// Only a failure to read the recurring set is returned as `Err`; per-record
/// outcomes are in the report.
pub async fn run_recurring(
    state: &AppState,
    actor: &str,
    today: NaiveDate,
) -> anyhow::Result<RunReport> {
    let _guard = state.run_lock.lock().await;

    let db = state.db.clone();
    let report = tokio::task::spawn_blocking(move || RecurringProcessor::new(&db).run(today))
        .await??;

    if let Err(e) = state.db.log_run(actor, &report) {
        error!(error = %e, "Failed to audit recurring run");
    }

    Ok(report)
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState::new(db, config));
    create_router_with_state(state)
}

/// Create the application router around existing state (shared with the scheduler)
pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/:id", get(handlers::get_expense))
        // Recurring
        .route("/recurring/process", post(handlers::process_recurring))
        .route("/recurring/preview", get(handlers::preview_recurring))
        // Reports
        .route("/summary", get(handlers::get_summary))
        .route("/budget", get(handlers::get_budget))
        // Export
        .route("/export/expenses", get(handlers::export_expenses))
        // Audit
        .route("/audit", get(handlers::list_audit_log));

    // Build CORS layer
    let cors = if state.config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(db, config));

    // Start recurring scheduler if configured
    if let Some(schedule) = RecurringScheduleConfig::from_server_config(&state.config) {
        start_recurring_scheduler(state.clone(), schedule);
    }

    let app = create_router_with_state(state);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Caller-facing core errors keep their message and status
        if let Some(invalid) = err.downcast_ref::<tally_core::ValidationError>() {
            return Self::bad_request(&invalid.to_string());
        }
        if let Some(core) = err.downcast_ref::<tally_core::Error>() {
            match core {
                tally_core::Error::Validation(e) => return Self::bad_request(&e.to_string()),
                tally_core::Error::NotFound(msg) => return Self::not_found(msg),
                tally_core::Error::Conflict(msg) => return Self::conflict(msg),
                _ => {}
            }
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
