//! Report command implementations (summary, budget)

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use tally_core::db::{month_start, Database};
use tally_core::models::parse_amount;
use tally_core::Config;

use super::parse_date_arg;

/// Resolve a named period (or explicit --from/--to) relative to `today`
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    // If custom dates provided, use those
    match (custom_from, custom_to) {
        (Some(from), Some(to)) => {
            let from_date = parse_date_arg(from, "--from")?;
            let to_date = parse_date_arg(to, "--to")?;
            if from_date > to_date {
                bail!("--from {} is after --to {}", from_date, to_date);
            }
            return Ok((from_date, to_date));
        }
        (None, None) => {}
        _ => bail!("--from and --to must be given together"),
    }

    match period.to_lowercase().as_str() {
        "this-month" => Ok((month_start(today), today)),
        "last-month" => {
            let last_day = month_start(today)
                .pred_opt()
                .context("Date out of range")?;
            Ok((month_start(last_day), last_day))
        }
        "this-year" => {
            let from = NaiveDate::from_ymd_opt(today.year(), 1, 1)
                .context("Date out of range")?;
            Ok((from, today))
        }
        "last-30-days" => {
            let from = today
                .checked_sub_days(Days::new(30))
                .context("Date out of range")?;
            Ok((from, today))
        }
        "all" => Ok((NaiveDate::MIN, today)),
        other => bail!(
            "Unknown period '{}'. Use this-month, last-month, this-year, last-30-days or all",
            other
        ),
    }
}

/// The budget from --amount, else from config
pub fn resolve_budget(amount: Option<&str>, config: &Config) -> Result<Decimal> {
    match amount {
        Some(value) => parse_amount(value).context("Invalid --amount"),
        None => config.budget.monthly.context(
            "No budget given. Pass --amount or set [budget] monthly in tally.toml",
        ),
    }
}

pub fn cmd_summary(db: &Database, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let summary = db.get_spending_summary(from, to)?;

    println!();
    if from == NaiveDate::MIN {
        println!("📊 Spending through {}", to);
    } else {
        println!("📊 Spending {} to {}", from, to);
    }
    println!("   ─────────────────────────────────────────────");
    println!("   Total:       {:>12}", summary.total.to_string());
    println!("   This week:   {:>12}", summary.week_total.to_string());
    println!("   This month:  {:>12}", summary.month_total.to_string());
    println!("   Expenses:    {:>12}", summary.expense_count);

    if !summary.categories.is_empty() {
        println!();
        println!("   {:20} {:>12} {:>6}", "Category", "Amount", "Count");
        for category in &summary.categories {
            println!(
                "   {:20} {:>12} {:>6}",
                super::truncate(&category.category, 20),
                category.amount.to_string(),
                category.count
            );
        }
    }

    print_template_note(db)?;

    Ok(())
}

/// Totals count each recurring template at its latest occurrence date
fn print_template_note(db: &Database) -> Result<()> {
    if !db.list_recurring()?.is_empty() {
        println!();
        println!("   ℹ️  Recurring templates are counted at their latest occurrence date");
    }
    Ok(())
}

pub fn cmd_budget(db: &Database, budget: Decimal, today: NaiveDate) -> Result<()> {
    let status = db.get_budget_status(budget, today)?;

    println!();
    println!(
        "💰 Budget {} to {}",
        status.period.from, status.period.to
    );
    println!("   Budget:     {:>12}", status.budget.to_string());
    println!("   Spent:      {:>12}", status.spent.to_string());
    println!("   Remaining:  {:>12}", status.remaining.to_string());

    if status.is_over_budget() {
        println!();
        println!("   ⚠️  Over budget by {}", -status.remaining);
    }

    print_template_note(db)?;

    Ok(())
}
