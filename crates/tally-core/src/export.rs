//! CSV export of expenses

use std::io::Write;

use serde::Serialize;

use crate::db::{Database, ExpenseFilter};
use crate::error::{Error, Result};
use crate::models::Expense;

/// One CSV line
#[derive(Debug, Serialize)]
struct ExpenseCsvRow<'a> {
    id: i64,
    date: String,
    name: &'a str,
    category: &'a str,
    amount: String,
    recurring: bool,
    schedule: &'a str,
}

impl<'a> From<&'a Expense> for ExpenseCsvRow<'a> {
    fn from(expense: &'a Expense) -> Self {
        Self {
            id: expense.id,
            date: expense.date_added.to_string(),
            name: &expense.name,
            category: &expense.category,
            amount: expense.amount.to_string(),
            recurring: expense.recurring,
            schedule: expense.schedule().map(|s| s.as_str()).unwrap_or(""),
        }
    }
}

impl Database {
    /// Write expenses matching `filter` as CSV, returning the row count
    pub fn write_expenses_csv<W: Write>(&self, filter: &ExpenseFilter, writer: W) -> Result<usize> {
        let expenses = self.list_expenses(filter)?;
        let mut csv = csv::Writer::from_writer(writer);

        for expense in &expenses {
            csv.serialize(ExpenseCsvRow::from(expense))?;
        }
        csv.flush()?;

        Ok(expenses.len())
    }

    /// Export expenses matching `filter` as a CSV string
    pub fn export_expenses_csv(&self, filter: &ExpenseFilter) -> Result<String> {
        let mut buf = Vec::new();
        self.write_expenses_csv(filter, &mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}
