//! Background task scheduler for recurring expense processing
//!
//! Enabled by `[scheduler] interval_hours` in `tally.toml` or the
//! `TALLY_RECURRING_SCHEDULE` environment variable (hours, 0 = disabled).
//!
//! Each tick runs the recurring processor as of the local date under the
//! shared run lock, so a scheduled run never overlaps one triggered over HTTP.
//! The first tick fires at startup to catch up after downtime.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::{run_recurring, AppState, ServerConfig};

/// Actor recorded in the audit log for scheduled runs
const SCHEDULER_ACTOR: &str = "scheduler";

/// Configuration for scheduled recurring runs
#[derive(Debug, Clone)]
pub struct RecurringScheduleConfig {
    /// Interval between runs in hours
    pub interval_hours: u64,
}

impl RecurringScheduleConfig {
    /// Returns None if scheduling is not configured
    pub fn from_server_config(config: &ServerConfig) -> Option<Self> {
        let interval_hours = config.scheduler_interval_hours?;

        if interval_hours == 0 {
            warn!("Scheduler interval is 0, automatic recurring runs disabled");
            return None;
        }

        Some(Self { interval_hours })
    }
}

/// Start the recurring scheduler as a background task
pub fn start_recurring_scheduler(state: Arc<AppState>, config: RecurringScheduleConfig) {
    info!(
        "Starting recurring scheduler: every {} hours",
        config.interval_hours
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.interval_hours * 3600));

        loop {
            ticker.tick().await;

            let today = Local::now().date_naive();
            info!("Running scheduled recurring processing for {}", today);

            match run_recurring(&state, SCHEDULER_ACTOR, today).await {
                Ok(report) => {
                    info!(
                        inserted = report.inserted,
                        anchors_updated = report.anchors_updated,
                        skipped = report.skipped.len(),
                        failed = report.failed.len(),
                        "Scheduled recurring run completed"
                    );
                    for failed in &report.failed {
                        error!(id = failed.id, error = %failed.error, "Recurring expense failed");
                    }
                }
                Err(e) => {
                    error!("Scheduled recurring run failed: {:#}", e);
                }
            }
        }
    });
}
