//! Recurrence engine
//!
//! Pure scheduling logic: given `today` and the recurring records, decide
//! which occurrences are owed and produce the write-set that materializes them.
//! Nothing here reads the clock or touches the store; see
//! [`crate::processor`] for the part that applies a plan.
//!
//! ## Catch-up
//!
//! A template's anchor (`date_added`) is the date of its last materialized
//! occurrence. The engine steps forward from the anchor one period at a time
//! and emits an occurrence for every step that lands on or before `today`,
//! each dated at its own due date. The anchor moves to the last emitted date,
//! so a second run on the same day finds nothing due.
//!
//! ## Month ends
//!
//! Monthly steps keep the anchor's day of month. When that day does not exist
//! in the target month the occurrence is clamped to the month's last day, and
//! the next step starts from the clamped date: `01-31 -> 02-28 -> 03-28`.
//! Chaining from the stored anchor keeps a catch-up run and a sequence of
//! daily runs in exact agreement.
//!
//! ## Streams
//!
//! Occurrences are stored as recurring records with the template's schedule,
//! so a later scan sees the template and every occurrence it spawned. Records
//! sharing name, category, amount and schedule form one stream, and a stream
//! advances once per run from its latest anchor. The record holding that
//! anchor (lowest id on a tie, which is the template itself after a run) is
//! the one whose date moves.

use std::collections::HashMap;

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{Expense, ExpenseRow, NewExpense, Schedule, SkippedRecord};

/// The date of the next occurrence after `anchor`
///
/// Returns `None` only when the result falls outside chrono's date range.
pub fn next_occurrence(anchor: NaiveDate, schedule: Schedule) -> Option<NaiveDate> {
    match schedule {
        Schedule::Daily => anchor.checked_add_days(Days::new(1)),
        Schedule::Weekly => anchor.checked_add_days(Days::new(7)),
        // chrono clamps to the last day of the target month
        Schedule::Monthly => anchor.checked_add_months(Months::new(1)),
    }
}

/// Every occurrence date after `anchor` up to and including `today`, in order
pub fn due_dates(
    anchor: NaiveDate,
    schedule: Schedule,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, ValidationError> {
    let mut dates = Vec::new();
    let mut cursor = anchor;

    loop {
        let next = next_occurrence(cursor, schedule).ok_or_else(|| {
            ValidationError::DateOutOfRange {
                anchor: cursor.to_string(),
            }
        })?;
        if next > today {
            break;
        }
        dates.push(next);
        cursor = next;
    }

    Ok(dates)
}

/// One template's write-set: the occurrences to insert and the anchor move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateAdvance {
    pub template_id: i64,
    pub template_name: String,
    /// Anchor read at the start of the run
    pub previous_anchor: NaiveDate,
    /// The anchor's stored text; the store update is conditional on it
    #[serde(skip)]
    pub previous_anchor_text: String,
    pub new_anchor: NaiveDate,
    pub occurrences: Vec<NewExpense>,
}

impl TemplateAdvance {
    pub fn occurrence_dates(&self) -> Vec<NaiveDate> {
        self.occurrences.iter().map(|o| o.date_added).collect()
    }
}

/// Everything one run should write, plus the records it had to skip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurrencePlan {
    pub run_date: NaiveDate,
    /// Recurring records considered
    pub scanned: usize,
    pub advances: Vec<TemplateAdvance>,
    pub skipped: Vec<SkippedRecord>,
}

impl RecurrencePlan {
    pub fn occurrence_count(&self) -> usize {
        self.advances.iter().map(|a| a.occurrences.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.advances.is_empty()
    }
}

/// Compute the advance for a single validated template
///
/// `Ok(None)` means nothing is due yet.
pub fn plan_template(
    template: &Expense,
    today: NaiveDate,
) -> Result<Option<TemplateAdvance>, ValidationError> {
    let schedule = template
        .schedule()
        .ok_or(ValidationError::MissingSchedule)?;

    let dates = due_dates(template.date_added, schedule, today)?;
    let Some(&new_anchor) = dates.last() else {
        return Ok(None);
    };

    Ok(Some(TemplateAdvance {
        template_id: template.id,
        template_name: template.name.clone(),
        previous_anchor: template.date_added,
        previous_anchor_text: template.date_added.to_string(),
        new_anchor,
        occurrences: dates
            .into_iter()
            .map(|date| NewExpense::occurrence_of(template, date))
            .collect(),
    }))
}

/// Identity shared by a template and the occurrences it spawned
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    name: String,
    category: String,
    amount: Decimal,
    schedule: Schedule,
}

impl StreamKey {
    fn of(expense: &Expense, schedule: Schedule) -> Self {
        Self {
            name: expense.name.clone(),
            category: expense.category.clone(),
            amount: expense.amount,
            schedule,
        }
    }
}

/// The record a stream advances from: latest anchor, then lowest id
fn is_better_cursor(candidate: &Expense, current: &Expense) -> bool {
    candidate.date_added > current.date_added
        || (candidate.date_added == current.date_added && candidate.id < current.id)
}

/// Plan a run over stored rows
///
/// Non-recurring rows are ignored. A row that fails validation is reported in
/// `skipped` and does not affect the others. Valid rows are grouped into
/// streams and each stream is planned from its cursor record.
pub fn plan(today: NaiveDate, rows: &[ExpenseRow]) -> RecurrencePlan {
    let mut plan = RecurrencePlan {
        run_date: today,
        scanned: 0,
        advances: vec![],
        skipped: vec![],
    };

    // Cursors in order of first appearance so plans are deterministic
    // Each cursor keeps its stored date text for the conditional update
    let mut cursors: Vec<(Expense, String)> = vec![];
    let mut index: HashMap<StreamKey, usize> = HashMap::new();

    for row in rows.iter().filter(|r| r.recurring) {
        plan.scanned += 1;

        let validated = Expense::try_from(row.clone()).and_then(|expense| {
            let schedule = expense
                .schedule()
                .ok_or(ValidationError::MissingSchedule)?;
            Ok((StreamKey::of(&expense, schedule), expense))
        });

        match validated {
            Ok((key, expense)) => match index.get(&key) {
                Some(&i) => {
                    if is_better_cursor(&expense, &cursors[i].0) {
                        cursors[i] = (expense, row.date_added.clone());
                    }
                }
                None => {
                    index.insert(key, cursors.len());
                    cursors.push((expense, row.date_added.clone()));
                }
            },
            Err(reason) => plan.skipped.push(SkippedRecord {
                id: row.id,
                name: row.name.clone(),
                reason,
            }),
        }
    }

    for (cursor, stored_date) in &cursors {
        match plan_template(cursor, today) {
            Ok(Some(mut advance)) => {
                advance.previous_anchor_text = stored_date.clone();
                debug!(
                    id = advance.template_id,
                    from = %advance.previous_anchor,
                    to = %advance.new_anchor,
                    occurrences = advance.occurrences.len(),
                    "Recurring expense due"
                );
                plan.advances.push(advance);
            }
            Ok(None) => {}
            Err(reason) => plan.skipped.push(SkippedRecord {
                id: cursor.id,
                name: cursor.name.clone(),
                reason,
            }),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn recurring_row(id: i64, anchor: &str, schedule: Option<&str>) -> ExpenseRow {
        ExpenseRow {
            id,
            name: format!("Expense {}", id),
            category: "Bills".to_string(),
            amount: "50.00".to_string(),
            date_added: anchor.to_string(),
            recurring: true,
            recurring_schedule: schedule.map(|s| s.to_string()),
        }
    }

    /// Apply a plan to in-memory rows the way a store would
    fn apply(rows: &mut Vec<ExpenseRow>, plan: &RecurrencePlan) {
        for advance in &plan.advances {
            let template = rows
                .iter_mut()
                .find(|r| r.id == advance.template_id)
                .unwrap();
            template.date_added = advance.new_anchor.to_string();
        }
        let mut next_id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        for occurrence in plan.advances.iter().flat_map(|a| &a.occurrences) {
            rows.push(ExpenseRow {
                id: next_id,
                name: occurrence.name.clone(),
                category: occurrence.category.clone(),
                amount: occurrence.amount.to_string(),
                date_added: occurrence.date_added.to_string(),
                recurring: occurrence.recurring,
                recurring_schedule: occurrence.recurring_schedule.map(|s| s.to_string()),
            });
            next_id += 1;
        }
    }

    #[test]
    fn test_next_occurrence_daily_weekly() {
        assert_eq!(
            next_occurrence(date("2025-01-01"), Schedule::Daily),
            Some(date("2025-01-02"))
        );
        assert_eq!(
            next_occurrence(date("2024-12-31"), Schedule::Daily),
            Some(date("2025-01-01"))
        );
        assert_eq!(
            next_occurrence(date("2025-01-01"), Schedule::Weekly),
            Some(date("2025-01-08"))
        );
    }

    #[test]
    fn test_next_occurrence_monthly() {
        assert_eq!(
            next_occurrence(date("2025-01-15"), Schedule::Monthly),
            Some(date("2025-02-15"))
        );
        // December wraps into the next year
        assert_eq!(
            next_occurrence(date("2025-12-10"), Schedule::Monthly),
            Some(date("2026-01-10"))
        );
    }

    #[test]
    fn test_next_occurrence_monthly_clamps() {
        assert_eq!(
            next_occurrence(date("2025-01-31"), Schedule::Monthly),
            Some(date("2025-02-28"))
        );
        assert_eq!(
            next_occurrence(date("2024-01-31"), Schedule::Monthly),
            Some(date("2024-02-29"))
        );
        assert_eq!(
            next_occurrence(date("2025-03-31"), Schedule::Monthly),
            Some(date("2025-04-30"))
        );
    }

    #[test]
    fn test_next_occurrence_out_of_range() {
        assert_eq!(next_occurrence(NaiveDate::MAX, Schedule::Daily), None);
        assert!(matches!(
            due_dates(NaiveDate::MAX, Schedule::Weekly, NaiveDate::MAX),
            Err(ValidationError::DateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_daily_catch_up() {
        let rows = vec![recurring_row(1, "2025-01-01", Some("daily"))];
        let plan = plan(date("2025-01-05"), &rows);

        assert_eq!(plan.advances.len(), 1);
        let advance = &plan.advances[0];
        assert_eq!(
            advance.occurrence_dates(),
            vec![
                date("2025-01-02"),
                date("2025-01-03"),
                date("2025-01-04"),
                date("2025-01-05"),
            ]
        );
        assert_eq!(advance.previous_anchor, date("2025-01-01"));
        assert_eq!(advance.new_anchor, date("2025-01-05"));
        assert_eq!(plan.occurrence_count(), 4);
    }

    #[test]
    fn test_occurrences_copy_template() {
        let rows = vec![recurring_row(1, "2025-01-01", Some("daily"))];
        let plan = plan(date("2025-01-02"), &rows);

        let occurrence = &plan.advances[0].occurrences[0];
        assert_eq!(occurrence.name, "Expense 1");
        assert_eq!(occurrence.category, "Bills");
        assert_eq!(occurrence.amount, dec!(50.00));
        assert_eq!(occurrence.amount.to_string(), "50.00");
        assert!(occurrence.recurring);
        assert_eq!(occurrence.recurring_schedule, Some(Schedule::Daily));
    }

    #[test]
    fn test_weekly_boundary() {
        let rows = vec![recurring_row(1, "2025-01-01", Some("weekly"))];

        let due = plan(date("2025-01-08"), &rows);
        assert_eq!(due.advances[0].occurrence_dates(), vec![date("2025-01-08")]);

        let not_due = plan(date("2025-01-07"), &rows);
        assert!(not_due.is_empty());
        assert_eq!(not_due.scanned, 1);
    }

    #[test]
    fn test_monthly_month_end_clamp() {
        let rows = vec![recurring_row(1, "2025-01-31", Some("monthly"))];

        let plan_march_first = plan(date("2025-03-01"), &rows);
        assert_eq!(
            plan_march_first.advances[0].occurrence_dates(),
            vec![date("2025-02-28")]
        );

        // The March occurrence chains from the clamped February anchor
        let plan_march_end = plan(date("2025-03-31"), &rows);
        assert_eq!(
            plan_march_end.advances[0].occurrence_dates(),
            vec![date("2025-02-28"), date("2025-03-28")]
        );
        assert_eq!(plan_march_end.advances[0].new_anchor, date("2025-03-28"));
    }

    #[test]
    fn test_catch_up_matches_incremental_runs() {
        let mut caught_up = vec![recurring_row(1, "2025-01-31", Some("monthly"))];
        let mut incremental = caught_up.clone();

        let plan_once = plan(date("2025-06-30"), &caught_up);
        apply(&mut caught_up, &plan_once);

        let mut day = date("2025-02-01");
        while day <= date("2025-06-30") {
            let p = plan(day, &incremental);
            apply(&mut incremental, &p);
            day = day.succ_opt().unwrap();
        }

        let dates = |rows: &Vec<ExpenseRow>| {
            let mut d: Vec<String> = rows.iter().map(|r| r.date_added.clone()).collect();
            d.sort();
            d
        };
        assert_eq!(dates(&caught_up), dates(&incremental));
    }

    #[test]
    fn test_idempotent_same_day() {
        let mut rows = vec![
            recurring_row(1, "2025-01-01", Some("daily")),
            recurring_row(2, "2024-12-01", Some("monthly")),
            recurring_row(3, "2024-12-25", Some("weekly")),
        ];
        let today = date("2025-01-05");

        let first = plan(today, &rows);
        assert!(!first.is_empty());
        apply(&mut rows, &first);

        let second = plan(today, &rows);
        assert!(second.is_empty());
        assert_eq!(second.occurrence_count(), 0);
        assert!(second.skipped.is_empty());
    }

    #[test]
    fn test_unknown_schedule_isolated() {
        let rows = vec![
            recurring_row(1, "2025-01-01", Some("daily")),
            recurring_row(2, "2025-01-01", None),
            recurring_row(3, "2025-01-01", Some("weekly")),
        ];
        let plan = plan(date("2025-01-08"), &rows);

        assert_eq!(plan.scanned, 3);
        assert_eq!(plan.advances.len(), 2);
        assert_eq!(plan.advances[0].occurrences.len(), 7);
        assert_eq!(plan.advances[1].occurrences.len(), 1);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].id, 2);
        assert_eq!(plan.skipped[0].reason, ValidationError::MissingSchedule);
    }

    #[test]
    fn test_malformed_anchor_isolated() {
        let rows = vec![
            recurring_row(1, "not-a-date", Some("daily")),
            recurring_row(2, "2025-01-01", Some("fortnightly")),
            recurring_row(3, "2025-01-01", Some("daily")),
        ];
        let plan = plan(date("2025-01-02"), &rows);

        assert_eq!(plan.advances.len(), 1);
        assert_eq!(plan.advances[0].template_id, 3);
        assert!(matches!(
            plan.skipped[0].reason,
            ValidationError::MalformedDate { .. }
        ));
        assert!(matches!(
            plan.skipped[1].reason,
            ValidationError::UnknownSchedule { .. }
        ));
    }

    #[test]
    fn test_non_recurring_ignored() {
        let mut one_off = recurring_row(1, "2025-01-01", Some("daily"));
        one_off.recurring = false;
        let mut broken_one_off = recurring_row(2, "garbage", None);
        broken_one_off.recurring = false;

        let plan = plan(date("2025-02-01"), &[one_off, broken_one_off]);
        assert_eq!(plan.scanned, 0);
        assert!(plan.is_empty());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_stream_advances_from_latest_anchor() {
        // A template caught up to 01-05 plus the occurrences it spawned
        let mut rows = vec![recurring_row(1, "2025-01-05", Some("daily"))];
        for (id, day) in [(2, "2025-01-02"), (3, "2025-01-03"), (4, "2025-01-05")] {
            let mut occurrence = recurring_row(id, day, Some("daily"));
            occurrence.name = "Expense 1".to_string();
            rows.push(occurrence);
        }

        let same_day = plan(date("2025-01-05"), &rows);
        assert_eq!(same_day.scanned, 4);
        assert!(same_day.is_empty());

        let next_day = plan(date("2025-01-06"), &rows);
        assert_eq!(next_day.advances.len(), 1);
        assert_eq!(next_day.advances[0].template_id, 1);
        assert_eq!(next_day.advances[0].occurrence_dates(), vec![date("2025-01-06")]);
    }

    #[test]
    fn test_plan_keeps_stored_anchor_text() {
        let rows = vec![
            recurring_row(1, "2025-1-1", Some("daily")),
            recurring_row(2, " 2025-01-01", Some("weekly")),
        ];

        let plan = plan(date("2025-01-08"), &rows);
        assert_eq!(plan.advances.len(), 2);
        assert_eq!(plan.advances[0].previous_anchor, date("2025-01-01"));
        assert_eq!(plan.advances[0].previous_anchor_text, "2025-1-1");
        assert_eq!(plan.advances[1].previous_anchor_text, " 2025-01-01");
    }

    #[test]
    fn test_stream_survives_template_removal() {
        let mut occurrence = recurring_row(7, "2025-01-08", Some("weekly"));
        occurrence.name = "Expense 1".to_string();
        let mut older = recurring_row(5, "2025-01-01", Some("weekly"));
        older.name = "Expense 1".to_string();

        let plan = plan(date("2025-01-15"), &[older, occurrence]);
        assert_eq!(plan.advances.len(), 1);
        assert_eq!(plan.advances[0].template_id, 7);
        assert_eq!(plan.advances[0].occurrence_dates(), vec![date("2025-01-15")]);
    }

    #[test]
    fn test_different_amounts_are_separate_streams() {
        let mut raised = recurring_row(2, "2025-01-01", Some("monthly"));
        raised.name = "Expense 1".to_string();
        raised.amount = "55.00".to_string();
        let rows = vec![recurring_row(1, "2025-01-01", Some("monthly")), raised];

        let plan = plan(date("2025-02-01"), &rows);
        assert_eq!(plan.advances.len(), 2);
    }

    #[test]
    fn test_future_anchor_not_due() {
        let rows = vec![recurring_row(1, "2025-03-01", Some("daily"))];
        assert!(plan(date("2025-01-01"), &rows).is_empty());
    }
}
