//! Tally CLI - Expense ledger with recurring expenses
//!
//! Usage:
//!   tally init                               Initialize database
//!   tally add Rent Housing 900 -s monthly    Record a recurring expense
//!   tally process-recurring                  Catch up every due recurring expense
//!   tally serve --port 3000                  Start web server

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use tally_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    let db_path = config.database.path.clone();

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path),
        Commands::Add {
            name,
            category,
            amount,
            date,
            schedule,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_add(
                &db,
                &name,
                &category,
                &amount,
                date.as_deref(),
                schedule.as_deref(),
            )
            .map(|_| ())
        }
        Commands::List {
            recurring,
            from,
            to,
            category,
            limit,
        } => {
            let db = commands::open_db(&db_path)?;
            let filter = commands::build_filter(
                recurring,
                from.as_deref(),
                to.as_deref(),
                category,
                Some(limit),
            )?;
            commands::cmd_list(&db, &filter)
        }
        Commands::ProcessRecurring {
            today,
            dry_run,
            json,
        } => {
            let db = commands::open_db(&db_path)?;
            let today = commands::resolve_today(today.as_deref())?;
            if dry_run {
                commands::cmd_process_recurring_dry_run(&db, today)
            } else {
                commands::cmd_process_recurring(&db, today, json)
            }
        }
        Commands::Summary { period, from, to } => {
            let db = commands::open_db(&db_path)?;
            let today = commands::resolve_today(None)?;
            let (from_date, to_date) =
                commands::resolve_period(&period, from.as_deref(), to.as_deref(), today)?;
            commands::cmd_summary(&db, from_date, to_date)
        }
        Commands::Budget { amount, today } => {
            let db = commands::open_db(&db_path)?;
            let budget = commands::resolve_budget(amount.as_deref(), &config)?;
            let today = commands::resolve_today(today.as_deref())?;
            commands::cmd_budget(&db, budget, today)
        }
        Commands::Export {
            output,
            from,
            to,
            recurring,
        } => {
            let db = commands::open_db(&db_path)?;
            let filter =
                commands::build_filter(recurring, from.as_deref(), to.as_deref(), None, None)?;
            commands::cmd_export(&db, output.as_deref(), &filter)
        }
        Commands::Runs { limit } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_runs(&db, limit)
        }
        Commands::Status => commands::cmd_status(&config),
        Commands::Serve {
            port,
            host,
            schedule_hours,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(hours) = schedule_hours {
                config.scheduler.interval_hours = (hours > 0).then_some(hours);
            }
            commands::cmd_serve(config).await
        }
    }
}
