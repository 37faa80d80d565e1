//! Export command implementation

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;
use tally_core::ExpenseFilter;

/// Write expenses as CSV to `output`, or stdout when not given
pub fn cmd_export(db: &Database, output: Option<&Path>, filter: &ExpenseFilter) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let count = db.write_expenses_csv(filter, &mut writer)?;
            writer.flush()?;
            eprintln!("✅ Exported {} expenses to {}", count, path.display());
        }
        None => {
            let stdout = io::stdout();
            db.write_expenses_csv(filter, stdout.lock())?;
        }
    }

    Ok(())
}
