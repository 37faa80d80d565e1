//! Expense operations and the recurring store contract

use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, warn};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Expense, ExpenseRow, NewExpense};
use crate::recurrence::TemplateAdvance;
use crate::store::ExpenseStore;

const EXPENSE_COLUMNS: &str =
    "id, name, category, amount, date_added, recurring, recurring_schedule";

/// Filters for listing expenses
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only recurring (`Some(true)`) or only one-off (`Some(false)`) records
    pub recurring: Option<bool>,
    /// Start date (inclusive)
    pub from: Option<NaiveDate>,
    /// End date (inclusive)
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

/// Read a column as text whatever its storage class
///
/// Rows written by older tools may hold numbers where text is expected; those
/// are surfaced as text and validated later instead of failing the read.
pub(super) fn column_text(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Null => String::new(),
    })
}

fn map_expense_row(row: &Row) -> rusqlite::Result<ExpenseRow> {
    Ok(ExpenseRow {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        amount: column_text(row, 3)?,
        date_added: column_text(row, 4)?,
        recurring: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
        recurring_schedule: row.get(6)?,
    })
}

/// Insert on an existing connection or transaction
fn insert_on(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO expenses (name, category, amount, date_added, recurring, recurring_schedule)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            expense.name,
            expense.category,
            expense.amount.to_string(),
            expense.date_added.to_string(),
            expense.recurring,
            expense.recurring_schedule.map(|s| s.as_str()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Conditionally move a template's anchor; explains a miss as NotFound or Conflict
///
/// `expected` is matched against the stored text as-is. The new anchor is
/// always written as `YYYY-MM-DD`.
fn advance_anchor_on(
    conn: &Connection,
    id: i64,
    expected: &str,
    new_date: NaiveDate,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE expenses SET date_added = ? WHERE id = ? AND date_added = ?",
        params![new_date.to_string(), id, expected],
    )?;
    if updated == 1 {
        return Ok(());
    }

    let current: Option<String> = conn
        .query_row(
            "SELECT date_added FROM expenses WHERE id = ?",
            params![id],
            |row| column_text(row, 0),
        )
        .optional()?;

    Err(match current {
        None => Error::NotFound(format!("Expense {} not found", id)),
        Some(current) => Error::Conflict(format!(
            "Expense {} anchor is {} (expected {}); already advanced by another run",
            id, current, expected
        )),
    })
}

impl Database {
    /// Insert a validated expense
    pub fn insert_expense(&self, expense: &NewExpense) -> Result<i64> {
        expense.validate()?;
        let conn = self.conn()?;
        let id = insert_on(&conn, expense)?;
        debug!(id, name = %expense.name, "Expense inserted");
        Ok(id)
    }

    /// Get an expense by id
    ///
    /// A stored row that fails validation is returned as `Error::Validation`.
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
                params![id],
                map_expense_row,
            )
            .optional()?;

        row.map(|r| Expense::try_from(r).map_err(Error::from))
            .transpose()
    }

    /// List raw rows matching a filter, newest first
    pub fn list_expense_rows(&self, filter: &ExpenseFilter) -> Result<Vec<ExpenseRow>> {
        let conn = self.conn()?;

        let mut conditions: Vec<&str> = vec![];
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(recurring) = filter.recurring {
            conditions.push("recurring = ?");
            params_vec.push(Box::new(recurring));
        }
        if let Some(from) = filter.from {
            conditions.push("date_added >= ?");
            params_vec.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            conditions.push("date_added <= ?");
            params_vec.push(Box::new(to.to_string()));
        }
        if let Some(ref category) = filter.category {
            conditions.push("category = ?");
            params_vec.push(Box::new(category.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit_clause = match filter.limit {
            Some(limit) => {
                params_vec.push(Box::new(limit));
                "LIMIT ?"
            }
            None => "",
        };

        let query = format!(
            "SELECT {} FROM expenses {} ORDER BY date_added DESC, id DESC {}",
            EXPENSE_COLUMNS, where_clause, limit_clause
        );

        let mut stmt = conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), map_expense_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// List validated expenses matching a filter, newest first
    ///
    /// Rows that fail validation are logged and left out.
    pub fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let rows = self.list_expense_rows(filter)?;
        let mut expenses = Vec::with_capacity(rows.len());

        for row in rows {
            let id = row.id;
            match Expense::try_from(row) {
                Ok(expense) => expenses.push(expense),
                Err(e) => warn!(id, error = %e, "Skipping invalid expense row"),
            }
        }

        Ok(expenses)
    }

    /// Count all expenses
    pub fn count_expenses(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All rows flagged recurring, as stored
    pub fn list_recurring(&self) -> Result<Vec<ExpenseRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE recurring = 1 ORDER BY id",
            EXPENSE_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], map_expense_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Move a record's anchor date, conditional on its current value
    pub fn update_anchor_date(
        &self,
        id: i64,
        expected: NaiveDate,
        new_date: NaiveDate,
    ) -> Result<()> {
        let conn = self.conn()?;
        advance_anchor_on(&conn, id, &expected.to_string(), new_date)
    }

    /// Apply one template's write-set in a single transaction
    ///
    /// The anchor is moved first, conditional on the value read at the start of
    /// the run. If another run got there first nothing is inserted.
    pub fn apply_advance(&self, advance: &TemplateAdvance) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        advance_anchor_on(
            &tx,
            advance.template_id,
            &advance.previous_anchor_text,
            advance.new_anchor,
        )?;

        let mut ids = Vec::with_capacity(advance.occurrences.len());
        for occurrence in &advance.occurrences {
            ids.push(insert_on(&tx, occurrence)?);
        }

        tx.commit()?;

        debug!(
            id = advance.template_id,
            anchor = %advance.new_anchor,
            inserted = ids.len(),
            "Recurring expense advanced"
        );
        Ok(ids)
    }
}

impl ExpenseStore for Database {
    fn list_recurring(&self) -> Result<Vec<ExpenseRow>> {
        Database::list_recurring(self)
    }

    fn insert(&self, expense: &NewExpense) -> Result<i64> {
        self.insert_expense(expense)
    }

    fn update_anchor_date(&self, id: i64, expected: NaiveDate, new_date: NaiveDate) -> Result<()> {
        Database::update_anchor_date(self, id, expected, new_date)
    }

    fn apply_advance(&self, advance: &TemplateAdvance) -> Result<Vec<i64>> {
        Database::apply_advance(self, advance)
    }
}
