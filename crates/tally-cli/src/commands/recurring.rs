//! Recurring expense processing commands

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::warn;
use tally_core::db::Database;
use tally_core::models::RunReport;
use tally_core::{recurrence, RecurringProcessor};

use super::AUDIT_ACTOR;

/// Run recurring processing as of `today` and print the report
///
/// Returns an error after printing when any template failed to apply.
pub fn cmd_process_recurring(db: &Database, today: NaiveDate, json: bool) -> Result<()> {
    let report = RecurringProcessor::new(db)
        .run(today)
        .context("Failed to read recurring expenses")?;

    // The run has already committed
    if let Err(e) = db.log_run(AUDIT_ACTOR, &report) {
        warn!(error = %e, "Failed to audit recurring run");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        bail!(
            "{} recurring expense(s) could not be processed",
            report.failed.len()
        );
    }

    Ok(())
}

/// Show what a run would write without touching the database
pub fn cmd_process_recurring_dry_run(db: &Database, today: NaiveDate) -> Result<()> {
    let rows = db
        .list_recurring()
        .context("Failed to read recurring expenses")?;
    let plan = recurrence::plan(today, &rows);

    println!("🔍 Recurring expenses due as of {} (dry run)", today);
    println!("   Scanned: {}", plan.scanned);

    if plan.is_empty() {
        println!("   Nothing due.");
    }
    for advance in &plan.advances {
        let dates: Vec<String> = advance
            .occurrence_dates()
            .iter()
            .map(|d| d.to_string())
            .collect();
        println!(
            "   #{} {}: {} → {} ({})",
            advance.template_id,
            advance.template_name,
            advance.previous_anchor,
            advance.new_anchor,
            dates.join(", ")
        );
    }
    for skipped in &plan.skipped {
        println!("   ⚠️  Skip #{} {}: {}", skipped.id, skipped.name, skipped.reason);
    }

    println!();
    println!("Would insert {} occurrences.", plan.occurrence_count());
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("🔁 Recurring expenses processed for {}", report.run_date);
    println!("   Scanned:         {}", report.scanned);
    println!("   Inserted:        {}", report.inserted);
    println!("   Anchors updated: {}", report.anchors_updated);

    if !report.skipped.is_empty() {
        println!();
        println!("   Skipped ({}):", report.skipped.len());
        for skipped in &report.skipped {
            println!("   ⚠️  #{} {}: {}", skipped.id, skipped.name, skipped.reason);
        }
    }

    if !report.failed.is_empty() {
        println!();
        println!("   Failed ({}):", report.failed.len());
        for failed in &report.failed {
            println!("   ❌ #{} {}: {}", failed.id, failed.name, failed.error);
        }
    }

    if report.is_noop() && report.failed.is_empty() {
        println!();
        println!("✅ Everything is up to date.");
    }
}
