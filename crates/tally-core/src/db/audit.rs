//! Audit log

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{AuditEntry, RunReport};

impl Database {
    /// Log an audit entry
    pub fn log_audit(
        &self,
        actor: &str,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (actor, action, entity_type, entity_id, details)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![actor, action, entity_type, entity_id, details],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Record a recurring run
    ///
    /// Details hold the counts plus any skipped or failed records as JSON.
    pub fn log_run(&self, actor: &str, report: &RunReport) -> Result<i64> {
        let details = serde_json::json!({
            "run_date": report.run_date,
            "scanned": report.scanned,
            "inserted": report.inserted,
            "anchors_updated": report.anchors_updated,
            "skipped": report.skipped,
            "failed": report.failed,
        });
        self.log_audit(
            actor,
            "process_recurring",
            None,
            None,
            Some(&serde_json::to_string(&details)?),
        )
    }

    /// List audit log entries, newest first
    pub fn list_audit_log(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp, actor, action, entity_type, entity_id, details
            FROM audit_log
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let entries = stmt
            .query_map(params![limit], |row| {
                let timestamp: String = row.get(1)?;
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: parse_datetime(&timestamp),
                    actor: row.get(2)?,
                    action: row.get(3)?,
                    entity_type: row.get(4)?,
                    entity_id: row.get(5)?,
                    details: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
