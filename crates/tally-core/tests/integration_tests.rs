//! Integration tests for tally-core
//!
//! These tests exercise the full add → process recurring → report workflow
//! against a real SQLite file.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tally_core::{
    db::Database, Error, ExpenseFilter, ExpenseStore, NewExpense, RecurringProcessor, Schedule,
    ValidationError,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn raw_insert(db: &Database, name: &str, anchor: &str, schedule: Option<&str>) {
    let conn = db.conn().unwrap();
    conn.execute(
        "INSERT INTO expenses (name, category, amount, date_added, recurring, recurring_schedule) VALUES (?, 'Bills', '10.00', ?, 1, ?)",
        rusqlite::params![name, anchor, schedule],
    )
    .unwrap();
}

fn sorted_dates(db: &Database) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = db
        .list_expenses(&ExpenseFilter::default())
        .unwrap()
        .into_iter()
        .map(|e| e.date_added)
        .collect();
    dates.sort();
    dates
}

// =============================================================================
// Recurring Processing
// =============================================================================

#[test]
fn test_daily_expense_first_run() {
    let db = Database::in_memory().expect("Failed to create database");
    db.insert_expense(&NewExpense::recurring(
        "Gym Membership",
        "Health",
        dec!(50),
        date("2025-01-01"),
        Schedule::Daily,
    ))
    .unwrap();

    let report = RecurringProcessor::new(&db).run(date("2025-01-02")).unwrap();
    assert_eq!(report.inserted, 1);

    let expenses = db.list_expenses(&ExpenseFilter::default()).unwrap();
    assert_eq!(expenses.len(), 2);
    // Newest first: the occurrence, then the template which now shares its date
    assert!(expenses.iter().all(|e| e.date_added == date("2025-01-02")));
    assert!(expenses.iter().all(|e| e.name == "Gym Membership"));
}

#[test]
fn test_catch_up_matches_daily_runs() {
    let catch_up = Database::in_memory().unwrap();
    let daily = Database::in_memory().unwrap();

    for db in [&catch_up, &daily] {
        db.insert_expense(&NewExpense::recurring(
            "Rent",
            "Housing",
            dec!(900),
            date("2025-01-31"),
            Schedule::Monthly,
        ))
        .unwrap();
    }

    RecurringProcessor::new(&catch_up)
        .run(date("2025-04-30"))
        .unwrap();

    let mut day = date("2025-02-01");
    while day <= date("2025-04-30") {
        RecurringProcessor::new(&daily).run(day).unwrap();
        day = day.succ_opt().unwrap();
    }

    let template = catch_up.get_expense(1).unwrap().unwrap();
    assert_eq!(template.date_added, date("2025-04-28"));

    // Template plus 02-28, 03-28, 04-28 either way
    assert_eq!(
        sorted_dates(&catch_up),
        vec![
            date("2025-02-28"),
            date("2025-03-28"),
            date("2025-04-28"),
            date("2025-04-28"),
        ]
    );
    assert_eq!(sorted_dates(&daily), sorted_dates(&catch_up));
}

#[test]
fn test_second_run_same_day_is_noop() {
    let db = Database::in_memory().unwrap();
    db.insert_expense(&NewExpense::recurring(
        "Gym Membership",
        "Health",
        dec!(50),
        date("2025-01-01"),
        Schedule::Daily,
    ))
    .unwrap();

    let processor = RecurringProcessor::new(&db);
    assert_eq!(processor.run(date("2025-01-05")).unwrap().inserted, 4);

    let again = processor.run(date("2025-01-05")).unwrap();
    assert!(again.is_noop());
    assert_eq!(db.count_expenses().unwrap(), 5);

    // The stream continues from the latest anchor the next day
    let next = processor.run(date("2025-01-06")).unwrap();
    assert_eq!(next.inserted, 1);
    assert_eq!(db.count_expenses().unwrap(), 6);
}

#[test]
fn test_isolates_invalid_records() {
    let db = Database::in_memory().unwrap();
    raw_insert(&db, "Weekly A", "2025-01-01", Some("weekly"));
    raw_insert(&db, "No Schedule", "2025-01-01", None);
    raw_insert(&db, "Weekly B", "2025-01-01", Some("Weekly"));

    let report = RecurringProcessor::new(&db).run(date("2025-01-08")).unwrap();

    assert!(report.is_success());
    assert_eq!(report.scanned, 3);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.anchors_updated, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "No Schedule");
    assert_eq!(report.skipped[0].reason, ValidationError::MissingSchedule);
}

#[test]
fn test_non_recurring_untouched() {
    let db = Database::in_memory().unwrap();
    let id = db
        .insert_expense(&NewExpense::one_off(
            "Laptop",
            "Electronics",
            dec!(1299.99),
            date("2024-06-01"),
        ))
        .unwrap();

    let report = RecurringProcessor::new(&db).run(date("2025-01-01")).unwrap();
    assert_eq!(report.scanned, 0);
    assert!(report.is_noop());

    let laptop = db.get_expense(id).unwrap().unwrap();
    assert_eq!(laptop.date_added, date("2024-06-01"));
    assert_eq!(db.count_expenses().unwrap(), 1);
}

#[test]
fn test_concurrent_runs_do_not_double_insert() {
    let db = Database::in_memory().unwrap();
    db.insert_expense(&NewExpense::recurring(
        "Coffee",
        "Food",
        dec!(3.50),
        date("2025-01-01"),
        Schedule::Daily,
    ))
    .unwrap();

    // Two runs plan from the same snapshot; only the first may apply
    let rows = ExpenseStore::list_recurring(&db).unwrap();
    let first = tally_core::recurrence::plan(date("2025-01-03"), &rows);
    let second = tally_core::recurrence::plan(date("2025-01-03"), &rows);

    let ids = db.apply_advance(&first.advances[0]).unwrap();
    assert_eq!(ids.len(), 2);

    let stale = db.apply_advance(&second.advances[0]);
    assert!(matches!(stale, Err(Error::Conflict(_))));
    assert_eq!(db.count_expenses().unwrap(), 3);
}

#[test]
fn test_threaded_runs_same_day() {
    let db = Database::in_memory().unwrap();
    db.insert_expense(&NewExpense::recurring(
        "Parking",
        "Transport",
        dec!(5),
        date("2025-01-01"),
        Schedule::Daily,
    ))
    .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            std::thread::spawn(move || RecurringProcessor::new(&db).run(date("2025-01-05")))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    // One template, four days owed, whoever won wrote them exactly once
    let template = db.get_expense(1).unwrap().unwrap();
    assert_eq!(template.date_added, date("2025-01-05"));
    let on_fifth = db
        .list_expenses(&ExpenseFilter {
            from: Some(date("2025-01-05")),
            to: Some(date("2025-01-05")),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(on_fifth.len(), 2);
    assert_eq!(db.count_expenses().unwrap(), 5);
}

// =============================================================================
// Reports
// =============================================================================

#[test]
fn test_reports_after_processing() {
    let db = Database::in_memory().unwrap();
    db.insert_expense(&NewExpense::recurring(
        "Gym",
        "Health",
        dec!(12.50),
        date("2025-01-01"),
        Schedule::Weekly,
    ))
    .unwrap();
    db.insert_expense(&NewExpense::one_off(
        "Groceries",
        "Food",
        dec!(80.25),
        date("2025-01-20"),
    ))
    .unwrap();

    let report = RecurringProcessor::new(&db).run(date("2025-01-22")).unwrap();
    assert_eq!(report.inserted, 3);
    db.log_run("test", &report).unwrap();

    // Occurrences 01-08, 01-15, 01-22 plus the template, now dated 01-22
    let summary = db
        .get_spending_summary(date("2025-01-01"), date("2025-01-22"))
        .unwrap();
    assert_eq!(summary.total, dec!(130.25));
    assert_eq!(summary.week_total, dec!(105.25));

    let budget = db.get_budget_status(dec!(200), date("2025-01-22")).unwrap();
    assert_eq!(budget.remaining, dec!(69.75));

    let audit = db.list_audit_log(5).unwrap();
    assert_eq!(audit[0].action, "process_recurring");
    assert!(audit[0].details.as_deref().unwrap().contains("\"inserted\":3"));
}
