// src/persistence.rs
use crate::errors::{AppError, AppResult};
use crate::types::{Incident, SlaOutcome, StoredIncident};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::Path;

/// Label reported for incidents whose SLA was never calculated.
pub const NOT_CALCULATED: &str = "Not Calculated";

// Opens the database, creating its parent directory first if needed.
pub fn open_connection_ensure_path(path: &Path) -> AppResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
        }
    }
    Ok(Connection::open(path)?)
}

pub fn initialize_db(conn: &mut Connection) -> SqlResult<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS incidents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            application TEXT,
            application_criticality TEXT,
            severity TEXT,
            block TEXT,
            resolver_group TEXT,
            closure_code TEXT,
            assigned_user TEXT,
            opened_at TEXT,          -- Local date-time, NULLable
            resolved_at TEXT,        -- Local date-time, NULLable
            work_log TEXT NOT NULL DEFAULT '',
            sla_verdict TEXT,        -- Label of the last computed verdict
            sla_seconds INTEGER      -- Management time of the last computation
        )", [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_incidents_resolved_at ON incidents (resolved_at);", [])?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_incidents_sla_verdict ON incidents (sla_verdict);", [])?;

    tx.commit()
}

// Inserts new incidents and refreshes existing ones (matched by code); stored verdicts are kept.
pub fn import_incidents(conn: &mut Connection, incidents: &[Incident]) -> SqlResult<usize> {
    let tx = conn.transaction()?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO incidents (code, application, application_criticality, severity, block,
                                    resolver_group, closure_code, assigned_user, opened_at,
                                    resolved_at, work_log)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(code) DO UPDATE SET
                 application = excluded.application,
                 application_criticality = excluded.application_criticality,
                 severity = excluded.severity,
                 block = excluded.block,
                 resolver_group = excluded.resolver_group,
                 closure_code = excluded.closure_code,
                 assigned_user = excluded.assigned_user,
                 opened_at = excluded.opened_at,
                 resolved_at = excluded.resolved_at,
                 work_log = excluded.work_log",
        )?;
        for inc in incidents {
            written += stmt.execute(params![
                inc.code,
                inc.application,
                inc.application_criticality,
                inc.severity,
                inc.block,
                inc.resolver_group,
                inc.closure_code,
                inc.assigned_user,
                inc.opened_at,
                inc.resolved_at,
                inc.work_log,
            ])?;
        }
    }
    tx.commit()?;
    Ok(written)
}

const INCIDENT_COLUMNS: &str = "code, application, application_criticality, severity, block,
     resolver_group, closure_code, assigned_user, opened_at, resolved_at, work_log";

fn incident_from_row(row: &Row<'_>) -> SqlResult<Incident> {
    Ok(Incident {
        code: row.get(0)?,
        application: row.get(1)?,
        application_criticality: row.get(2)?,
        severity: row.get(3)?,
        block: row.get(4)?,
        resolver_group: row.get(5)?,
        closure_code: row.get(6)?,
        assigned_user: row.get(7)?,
        opened_at: row.get(8)?,
        resolved_at: row.get(9)?,
        work_log: row.get(10)?,
    })
}

pub fn load_all_incidents(conn: &Connection) -> SqlResult<Vec<Incident>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM incidents ORDER BY opened_at DESC, code",
        INCIDENT_COLUMNS
    ))?;
    let rows = stmt.query_map([], incident_from_row)?;
    rows.collect()
}

/// Every incident with the verdict and time saved by its last calculation.
pub fn load_stored_incidents(conn: &Connection) -> SqlResult<Vec<StoredIncident>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, sla_verdict, sla_seconds FROM incidents ORDER BY opened_at DESC, code",
        INCIDENT_COLUMNS
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(StoredIncident {
            incident: incident_from_row(row)?,
            sla_verdict: row.get(11)?,
            sla_seconds: row.get(12)?,
        })
    })?;
    rows.collect()
}

pub fn find_incident(conn: &Connection, code: &str) -> SqlResult<Option<Incident>> {
    conn.query_row(
        &format!("SELECT {} FROM incidents WHERE code = ?1", INCIDENT_COLUMNS),
        params![code],
        incident_from_row,
    )
    .optional()
}

pub fn count_incidents(conn: &Connection) -> SqlResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))
}

pub fn save_outcome(conn: &Connection, code: &str, outcome: &SlaOutcome) -> SqlResult<usize> {
    conn.execute(
        "UPDATE incidents SET sla_verdict = ?1, sla_seconds = ?2 WHERE code = ?3",
        params![outcome.verdict.label(), outcome.management_secs, code],
    )
}

/// Stored verdict labels with their counts, most frequent first.
pub fn count_verdicts(conn: &Connection) -> SqlResult<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(sla_verdict, ?1), COUNT(*) AS total
         FROM incidents
         GROUP BY 1
         ORDER BY total DESC, 1",
    )?;
    let rows = stmt.query_map(params![NOT_CALCULATED], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    rows.collect()
}
