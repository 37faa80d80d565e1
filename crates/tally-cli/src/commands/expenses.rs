//! Expense command implementations (add, list)

use anyhow::{Context, Result};
use tally_core::db::Database;
use tally_core::models::{parse_amount, NewExpense, Schedule};
use tally_core::ExpenseFilter;
use tracing::warn;

use super::{parse_date_arg, resolve_today, truncate, AUDIT_ACTOR};

/// Record an expense, returning its id
///
/// Passing a schedule makes the expense a recurring template anchored at `date`.
pub fn cmd_add(
    db: &Database,
    name: &str,
    category: &str,
    amount: &str,
    date: Option<&str>,
    schedule: Option<&str>,
) -> Result<i64> {
    let amount = parse_amount(amount).context("Invalid amount")?;
    let date = match date {
        Some(d) => parse_date_arg(d, "--date")?,
        None => resolve_today(None)?,
    };

    let expense = match schedule {
        Some(s) => {
            let schedule: Schedule = s.parse().context("Invalid --schedule")?;
            NewExpense::recurring(name, category, amount, date, schedule)
        }
        None => NewExpense::one_off(name, category, amount, date),
    };

    let id = db.insert_expense(&expense).context("Failed to add expense")?;
    if let Err(e) = db.log_audit(AUDIT_ACTOR, "add_expense", Some("expense"), Some(id), None) {
        warn!(id, error = %e, "Failed to audit added expense");
    }

    match expense.recurring_schedule {
        Some(schedule) => println!(
            "✅ Added recurring expense #{}: {} {} ({}, {}) from {}",
            id, expense.name, expense.amount, expense.category, schedule, expense.date_added
        ),
        None => println!(
            "✅ Added expense #{}: {} {} ({}) on {}",
            id, expense.name, expense.amount, expense.category, expense.date_added
        ),
    }

    Ok(id)
}

pub fn cmd_list(db: &Database, filter: &ExpenseFilter) -> Result<()> {
    let expenses = db.list_expenses(filter)?;

    if expenses.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    println!(
        "{:>6}  {:10}  {:30}  {:16}  {:>12}  {}",
        "ID", "Date", "Name", "Category", "Amount", "Schedule"
    );
    println!("{}", "-".repeat(90));

    for expense in &expenses {
        let schedule = expense
            .schedule()
            .map(|s| s.to_string())
            .unwrap_or_default();
        println!(
            "{:>6}  {:10}  {:30}  {:16}  {:>12}  {}",
            expense.id,
            expense.date_added.to_string(),
            truncate(&expense.name, 30),
            truncate(&expense.category, 16),
            expense.amount.to_string(),
            schedule
        );
    }

    println!();
    println!("{} expenses", expenses.len());

    Ok(())
}
