//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Track expenses and keep recurring ones up to date
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Expense ledger with recurring expense processing", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides config and TALLY_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to ~/.config/tally/tally.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Record an expense
    Add {
        /// What the money was spent on
        name: String,

        /// Category (e.g. Food, Housing)
        category: String,

        /// Amount, e.g. 12.50
        amount: String,

        /// Date (YYYY-MM-DD, default: today). For a recurring expense this is
        /// the first occurrence.
        #[arg(short, long)]
        date: Option<String>,

        /// Make the expense recurring: daily, weekly or monthly
        #[arg(short, long)]
        schedule: Option<String>,
    },

    /// List expenses, newest first
    List {
        /// Only recurring expenses
        #[arg(long)]
        recurring: bool,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Number of expenses to show
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },

    /// Materialize every recurring expense due up to today
    ProcessRecurring {
        /// Process as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,

        /// Show what would be written without writing it
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spending summary: totals, this week, this month, by category
    Summary {
        /// Period: this-month, last-month, this-year, last-30-days, all
        #[arg(short, long, default_value = "this-month")]
        period: String,

        /// Custom start date (YYYY-MM-DD), requires --to
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD), requires --from
        #[arg(long)]
        to: Option<String>,
    },

    /// Remaining monthly budget
    Budget {
        /// Monthly budget (default: [budget] monthly from config)
        #[arg(short, long)]
        amount: Option<String>,

        /// Compute as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Export expenses to CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only recurring expenses
        #[arg(long)]
        recurring: bool,
    },

    /// Show recent recurring runs and other audited changes
    Runs {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show configuration and database status
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on (default: config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default: config)
        #[arg(long)]
        host: Option<String>,

        /// Hours between automatic recurring runs (0 disables)
        #[arg(long)]
        schedule_hours: Option<u64>,
    },
}
