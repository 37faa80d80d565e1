//! Domain models for Tally

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Date format used for storage and for every user-facing date argument
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| ValidationError::MalformedDate {
        value: s.to_string(),
    })
}

/// Parse an exact decimal amount. Negative amounts are rejected.
pub fn parse_amount(s: &str) -> Result<Decimal, ValidationError> {
    let amount = Decimal::from_str(s.trim()).map_err(|_| ValidationError::MalformedAmount {
        value: s.to_string(),
    })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::NegativeAmount {
            value: amount.to_string(),
        });
    }
    Ok(amount)
}

/// How often a recurring expense repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Daily,
    Weekly,
    Monthly,
}

impl Schedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Schedule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ValidationError::UnknownSchedule {
                value: s.to_string(),
            }),
        }
    }
}

/// An expense row exactly as it is stored
///
/// Amount, date and schedule are kept as the stored text so that a single bad
/// row can be reported instead of failing the whole read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub amount: String,
    pub date_added: String,
    pub recurring: bool,
    pub recurring_schedule: Option<String>,
}

/// A validated expense record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    /// Transaction date, or for a recurring template the date of the last
    /// materialized occurrence
    pub date_added: NaiveDate,
    pub recurring: bool,
    /// Always `Some` when `recurring` is true, always `None` otherwise
    pub recurring_schedule: Option<Schedule>,
}

impl Expense {
    /// The schedule of a recurring record
    pub fn schedule(&self) -> Option<Schedule> {
        if self.recurring {
            self.recurring_schedule
        } else {
            None
        }
    }
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = ValidationError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let date_added = parse_date(&row.date_added)?;
        let amount = parse_amount(&row.amount)?;

        let recurring_schedule = if row.recurring {
            match row.recurring_schedule.as_deref().map(str::trim) {
                None | Some("") => return Err(ValidationError::MissingSchedule),
                Some(s) => Some(s.parse::<Schedule>()?),
            }
        } else {
            None
        };

        Ok(Self {
            id: row.id,
            name: row.name,
            category: row.category,
            amount,
            date_added,
            recurring: row.recurring,
            recurring_schedule,
        })
    }
}

/// Payload for inserting an expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub date_added: NaiveDate,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub recurring_schedule: Option<Schedule>,
}

impl NewExpense {
    /// A one-off expense
    pub fn one_off(name: &str, category: &str, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            amount,
            date_added: date,
            recurring: false,
            recurring_schedule: None,
        }
    }

    /// A recurring template anchored at `date`
    pub fn recurring(
        name: &str,
        category: &str,
        amount: Decimal,
        date: NaiveDate,
        schedule: Schedule,
    ) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            amount,
            date_added: date,
            recurring: true,
            recurring_schedule: Some(schedule),
        }
    }

    /// A materialized occurrence of `template` due on `date`
    ///
    /// Occurrences are full recurring records with the template's schedule.
    pub fn occurrence_of(template: &Expense, date: NaiveDate) -> Self {
        Self {
            name: template.name.clone(),
            category: template.category.clone(),
            amount: template.amount,
            date_added: date,
            recurring: true,
            recurring_schedule: template.recurring_schedule,
        }
    }

    /// Check creation-time invariants
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "name".to_string(),
            });
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "category".to_string(),
            });
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ValidationError::NegativeAmount {
                value: self.amount.to_string(),
            });
        }
        if self.recurring && self.recurring_schedule.is_none() {
            return Err(ValidationError::MissingSchedule);
        }
        Ok(())
    }
}

/// A record left out of a recurring run, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub id: i64,
    pub name: String,
    pub reason: ValidationError,
}

/// A template whose write-set could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRecord {
    pub id: i64,
    pub name: String,
    pub error: String,
}

/// Outcome of one recurring processing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_date: NaiveDate,
    /// Recurring records read from the store
    pub scanned: usize,
    /// Occurrence records inserted
    pub inserted: usize,
    /// Templates whose anchor date moved forward
    pub anchors_updated: usize,
    /// Ids of the inserted occurrences
    pub inserted_ids: Vec<i64>,
    pub skipped: Vec<SkippedRecord>,
    pub failed: Vec<FailedRecord>,
}

impl RunReport {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            scanned: 0,
            inserted: 0,
            anchors_updated: 0,
            inserted_ids: vec![],
            skipped: vec![],
            failed: vec![],
        }
    }

    /// True when no template failed to apply (skips are data warnings)
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Nothing was written
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.anchors_updated == 0
    }
}

/// Date range of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Spending in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpending {
    pub category: String,
    pub amount: Decimal,
    pub count: i64,
}

/// Dashboard summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpendingSummary {
    pub period: ReportPeriod,
    /// Total over `period`
    pub total: Decimal,
    /// Total for the Monday-start week containing `period.to`
    pub week_total: Decimal,
    /// Total for the calendar month containing `period.to`
    pub month_total: Decimal,
    pub categories: Vec<CategorySpending>,
    pub expense_count: i64,
}

/// Budget versus month-to-date spending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub period: ReportPeriod,
    pub budget: Decimal,
    pub spent: Decimal,
    /// Negative when over budget
    pub remaining: Decimal,
}

impl BudgetStatus {
    pub fn is_over_budget(&self) -> bool {
        self.remaining.is_sign_negative() && !self.remaining.is_zero()
    }
}

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}
