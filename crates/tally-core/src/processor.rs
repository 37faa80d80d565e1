//! Recurring run processor - applies recurrence plans to a store

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{FailedRecord, RunReport};
use crate::recurrence;
use crate::store::ExpenseStore;

/// Drives one recurring run against a store
pub struct RecurringProcessor<'a, S: ExpenseStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ExpenseStore + ?Sized> RecurringProcessor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Run using the local calendar date
    pub fn run_today(&self) -> Result<RunReport> {
        self.run(chrono::Local::now().date_naive())
    }

    /// Materialize every occurrence due on or before `today`
    ///
    /// Only a failure to read the recurring set is returned as `Err`. Records
    /// that fail validation are reported in `skipped`; templates whose
    /// write-set cannot be applied are reported in `failed` and the run
    /// continues with the rest.
    pub fn run(&self, today: NaiveDate) -> Result<RunReport> {
        let rows = self.store.list_recurring()?;
        let plan = recurrence::plan(today, &rows);

        let mut report = RunReport::new(today);
        report.scanned = plan.scanned;

        for skipped in &plan.skipped {
            warn!(
                id = skipped.id,
                name = %skipped.name,
                reason = %skipped.reason,
                "Skipping recurring expense"
            );
        }
        report.skipped = plan.skipped;

        for advance in &plan.advances {
            match self.store.apply_advance(advance) {
                Ok(ids) => {
                    report.inserted += ids.len();
                    report.anchors_updated += 1;
                    report.inserted_ids.extend(ids);
                }
                Err(e) => {
                    warn!(
                        id = advance.template_id,
                        error = %e,
                        "Failed to apply recurring expense"
                    );
                    report.failed.push(FailedRecord {
                        id: advance.template_id,
                        name: advance.template_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            date = %today,
            scanned = report.scanned,
            inserted = report.inserted,
            anchors_updated = report.anchors_updated,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Recurring run complete"
        );

        Ok(report)
    }
}
