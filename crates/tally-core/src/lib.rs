//! Tally Core Library
//!
//! Shared functionality for the Tally expense tracker:
//! - Domain models and record validation
//! - Recurrence engine (catch-up scheduling of recurring expenses)
//! - Run processor that applies recurrence plans to a store
//! - SQLite database access, migrations, reports and audit log
//! - CSV export
//! - Layered configuration

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod processor;
pub mod recurrence;
pub mod store;

pub use config::Config;
pub use db::{Database, ExpenseFilter};
pub use error::{Error, Result, ValidationError};
pub use models::{
    AuditEntry, BudgetStatus, CategorySpending, Expense, ExpenseRow, FailedRecord, NewExpense,
    ReportPeriod, RunReport, Schedule, SkippedRecord, SpendingSummary,
};
pub use processor::RecurringProcessor;
pub use recurrence::{RecurrencePlan, TemplateAdvance};
pub use store::ExpenseStore;
