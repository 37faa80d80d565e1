//! Store contract consumed by the recurring processor

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{ExpenseRow, NewExpense};
use crate::recurrence::TemplateAdvance;

/// Durable expense storage as seen by a recurring run
///
/// Implemented by [`crate::db::Database`]. Kept as a trait so runs can be
/// exercised against wrapped or failing stores.
pub trait ExpenseStore {
    /// All rows with `recurring = true`, in no particular order
    fn list_recurring(&self) -> Result<Vec<ExpenseRow>>;

    /// Insert an expense and return its id
    fn insert(&self, expense: &NewExpense) -> Result<i64>;

    /// Move a record's `date_added` from `expected` to `new_date`
    ///
    /// Fails with `Error::NotFound` when the id does not exist and with
    /// `Error::Conflict` when the stored date is no longer `expected`.
    fn update_anchor_date(&self, id: i64, expected: NaiveDate, new_date: NaiveDate) -> Result<()>;

    /// Apply one template's write-set as a single unit of work
    ///
    /// Either the anchor moves and every occurrence is inserted, or nothing
    /// is written. Returns the ids of the inserted occurrences.
    fn apply_advance(&self, advance: &TemplateAdvance) -> Result<Vec<i64>>;
}
