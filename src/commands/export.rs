// src/commands/export.rs

use crate::config::{AppConfig, SlaSettings};
use crate::errors::{AppError, AppResult};
use crate::persistence::{self, load_all_incidents};
use crate::sla::SlaPolicy;
use crate::types::{non_blank, Incident, IncidentFilter, SlaOutcome};
use crate::utils::{sla_time_text, NOT_APPLICABLE};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const HEADER: [&str; 9] = [
    "Incident",
    "Resolved At",
    "Last Manager",
    "Application",
    "Application Criticality",
    "Severity",
    "SLA Target (Hours)",
    "Management Time (Hours)",
    "SLA Met",
];

// Quotes a field when it holds a separator, a quote or a line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn write_record<W: Write, S: AsRef<str>>(out: &mut W, fields: &[S]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    write!(out, "{}\r\n", line)
}

fn report_row(incident: &Incident, outcome: &SlaOutcome) -> [String; 9] {
    let or_na = |value: &Option<String>| non_blank(value).unwrap_or(NOT_APPLICABLE).to_string();
    [
        incident.code.clone(),
        incident
            .resolved_at
            .map_or_else(|| NOT_APPLICABLE.to_string(), |at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
        or_na(&outcome.last_manager),
        or_na(&incident.application),
        or_na(&incident.application_criticality),
        or_na(&incident.severity),
        sla_time_text(outcome.target_secs),
        sla_time_text(outcome.management_secs),
        outcome.verdict.label().to_string(),
    ]
}

/// Writes the SLA report (UTF-8 with BOM, for spreadsheet tools) and returns the row count.
pub fn write_report<W: Write>(out: &mut W, policy: &SlaPolicy, incidents: &[Incident]) -> io::Result<usize> {
    out.write_all("\u{feff}".as_bytes())?;
    write_record(out, &HEADER)?;
    for incident in incidents {
        let outcome = policy.evaluate(incident);
        write_record(out, &report_row(incident, &outcome))?;
    }
    Ok(incidents.len())
}

pub fn execute(app_config: &AppConfig, output: &Path, filter: &IncidentFilter) -> AppResult<()> {
    let settings = SlaSettings::load(&app_config.settings_path)?;
    let policy = SlaPolicy::from_settings(&settings)?;

    let mut conn = persistence::open_connection_ensure_path(&app_config.database_path)?;
    persistence::initialize_db(&mut conn)?;
    let incidents: Vec<Incident> = load_all_incidents(&conn)?
        .into_iter()
        .filter(|inc| filter.matches(inc))
        .collect();
    log::debug!("{} incident(s) match the export filter.", incidents.len());

    let file = File::create(output).map_err(|e| AppError::io(output, e))?;
    let mut writer = BufWriter::new(file);
    let rows = write_report(&mut writer, &policy, &incidents)
        .and_then(|rows| writer.flush().map(|_| rows))
        .map_err(|e| AppError::io(output, e))?;

    println!("Exported {} incident(s) to {:?}.", rows, output);
    Ok(())
}
