// src/commands/list.rs

use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::persistence::{self, load_stored_incidents, NOT_CALCULATED};
use crate::types::{non_blank, IncidentFilter, StoredIncident};
use crate::utils::{sla_time_text, NOT_APPLICABLE};

const COLUMNS: [&str; 5] = ["Incident", "Application", "Severity", "SLA Verdict", "SLA Time"];

// Table cells for one stored incident. The SLA time is shown through the duration formatter.
fn list_row(stored: &StoredIncident) -> [String; 5] {
    let text = |value: &Option<String>| non_blank(value).unwrap_or(NOT_APPLICABLE).to_string();
    [
        stored.incident.code.clone(),
        text(&stored.incident.application),
        text(&stored.incident.severity),
        stored.sla_verdict.clone().unwrap_or_else(|| NOT_CALCULATED.to_string()),
        sla_time_text(stored.sla_seconds),
    ]
}

fn print_row(cells: &[impl AsRef<str>]) {
    println!(
        "  {:<16} {:<24} {:<12} {:<32} {:>12}",
        cells[0].as_ref(),
        cells[1].as_ref(),
        cells[2].as_ref(),
        cells[3].as_ref(),
        cells[4].as_ref()
    );
}

pub fn execute(app_config: &AppConfig, filter: &IncidentFilter) -> AppResult<()> {
    let mut conn = persistence::open_connection_ensure_path(&app_config.database_path)?;
    persistence::initialize_db(&mut conn)?;

    let stored: Vec<StoredIncident> = load_stored_incidents(&conn)?
        .into_iter()
        .filter(|s| filter.matches(&s.incident))
        .collect();
    log::debug!("{} incident(s) match the list filter.", stored.len());

    if stored.is_empty() {
        println!("No incidents match.");
        return Ok(());
    }

    print_row(&COLUMNS);
    for row in stored.iter().map(list_row) {
        print_row(&row);
    }
    println!("\n  {} incident(s).", stored.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{import_incidents, initialize_db, save_outcome};
    use crate::types::{Incident, SlaOutcome, SlaVerdict};
    use rusqlite::Connection;

    fn stored(sla_verdict: Option<&str>, sla_seconds: Option<i64>) -> StoredIncident {
        StoredIncident {
            incident: Incident {
                code: "INC7".into(),
                application: Some("Portal".into()),
                severity: Some("Alta".into()),
                ..Default::default()
            },
            sla_verdict: sla_verdict.map(String::from),
            sla_seconds,
        }
    }

    #[test]
    fn test_multi_day_time_renders_unbounded_hours() {
        let row = list_row(&stored(Some("Breached"), Some(5 * 86_400 + 3 * 3600 + 4 * 60 + 5)));
        assert_eq!(row, ["INC7", "Portal", "Alta", "Breached", "123:04:05"].map(String::from));
    }

    #[test]
    fn test_uncalculated_incident_shows_na() {
        let row = list_row(&stored(None, None));
        assert_eq!(row[3], NOT_CALCULATED);
        assert_eq!(row[4], NOT_APPLICABLE);
    }

    #[test]
    fn test_execute_lists_stored_incidents() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            app_name: "test".into(),
            database_path: dir.path().join("db.sqlite"),
            settings_path: dir.path().join("absent.toml"),
        };
        let mut conn = Connection::open(&config.database_path).unwrap();
        initialize_db(&mut conn).unwrap();
        import_incidents(&mut conn, &[stored(None, None).incident]).unwrap();
        let outcome = SlaOutcome {
            verdict: SlaVerdict::Met,
            management_secs: Some(1_200),
            target_secs: None,
            last_manager: None,
        };
        save_outcome(&conn, "INC7", &outcome).unwrap();
        drop(conn);

        execute(&config, &IncidentFilter::default()).unwrap();
        let none = IncidentFilter { code_contains: Some("REQ".into()), ..Default::default() };
        execute(&config, &none).unwrap();
    }
}
