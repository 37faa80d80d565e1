//! Spending reports and budget status

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use rusqlite::params;
use tracing::warn;

use super::expenses::column_text;
use super::{Database, DbConn};
use crate::error::Result;
use crate::models::{parse_amount, BudgetStatus, CategorySpending, ReportPeriod, SpendingSummary};

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Totals accumulated over one date range
#[derive(Debug, Default)]
struct RangeTotals {
    total: Decimal,
    count: i64,
    categories: BTreeMap<String, (Decimal, i64)>,
}

impl Database {
    /// Sum the stored amounts dated within `[from, to]`
    ///
    /// A recurring template is counted at its current anchor, the date of its
    /// latest occurrence. After a run its own charge moves forward with the
    /// anchor, so the anchor's period holds the template and the occurrence.
    ///
    /// Amounts are exact decimal text, so they are summed here rather than
    /// with SQLite's floating point `SUM`. Rows with an unreadable amount are
    /// logged and left out.
    fn range_totals(&self, conn: &DbConn, from: NaiveDate, to: NaiveDate) -> Result<RangeTotals> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, category, amount
            FROM expenses
            WHERE date_added BETWEEN ?1 AND ?2
            "#,
        )?;

        let rows = stmt
            .query_map(params![from.to_string(), to.to_string()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    column_text(row, 2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut totals = RangeTotals::default();
        for (id, category, amount) in rows {
            let amount = match parse_amount(&amount) {
                Ok(amount) => amount,
                Err(e) => {
                    warn!(id, error = %e, "Leaving unreadable amount out of totals");
                    continue;
                }
            };

            totals.total += amount;
            totals.count += 1;
            let entry = totals
                .categories
                .entry(category)
                .or_insert((Decimal::ZERO, 0));
            entry.0 += amount;
            entry.1 += 1;
        }

        Ok(totals)
    }

    /// Total spent within `[from, to]`
    pub fn get_total_spent(&self, from: NaiveDate, to: NaiveDate) -> Result<Decimal> {
        let conn = self.conn()?;
        Ok(self.range_totals(&conn, from, to)?.total)
    }

    /// Dashboard summary for `[from, to]`
    ///
    /// Week and month totals are for the periods containing `to`, whatever
    /// `from` is. Categories are sorted by amount, largest first. Recurring
    /// templates count at their anchor date (see `range_totals`).
    pub fn get_spending_summary(&self, from: NaiveDate, to: NaiveDate) -> Result<SpendingSummary> {
        let conn = self.conn()?;

        let period = self.range_totals(&conn, from, to)?;
        let week = self.range_totals(&conn, week_start(to), to)?;
        let month = self.range_totals(&conn, month_start(to), to)?;

        let mut categories: Vec<CategorySpending> = period
            .categories
            .into_iter()
            .map(|(category, (amount, count))| CategorySpending {
                category,
                amount,
                count,
            })
            .collect();
        categories.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));

        Ok(SpendingSummary {
            period: ReportPeriod { from, to },
            total: period.total,
            week_total: week.total,
            month_total: month.total,
            categories,
            expense_count: period.count,
        })
    }

    /// Monthly budget against month-to-date spending as of `today`
    ///
    /// Templates anchored this month count in `spent` alongside their
    /// occurrences.
    pub fn get_budget_status(&self, budget: Decimal, today: NaiveDate) -> Result<BudgetStatus> {
        let from = month_start(today);
        let spent = self.get_total_spent(from, today)?;

        Ok(BudgetStatus {
            period: ReportPeriod { from, to: today },
            budget,
            spent,
            remaining: budget - spent,
        })
    }
}
