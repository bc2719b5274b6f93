// src/commands/calculate.rs

use crate::config::{AppConfig, SlaSettings};
use crate::errors::{AppError, AppResult};
use crate::persistence::{self, find_incident, load_all_incidents, save_outcome};
use crate::sla::SlaPolicy;
use crate::types::{Incident, SlaOutcome};
use crate::utils::sla_time_text;
use rusqlite::Connection;
use std::collections::HashMap;

const NOT_FOUND: &str = "Not Found";

// Result line for one requested incident.
#[derive(Debug)]
struct Evaluated {
    code: String,
    outcome: Option<SlaOutcome>,
}

impl Evaluated {
    fn label(&self) -> &str {
        self.outcome.as_ref().map_or(NOT_FOUND, |o| o.verdict.label())
    }
}

fn evaluate_and_store(
    conn: &Connection,
    policy: &SlaPolicy,
    incidents: Vec<(String, Option<Incident>)>,
) -> AppResult<Vec<Evaluated>> {
    let mut results = Vec::with_capacity(incidents.len());
    for (code, incident) in incidents {
        let outcome = match incident {
            Some(incident) => {
                let outcome = policy.evaluate(&incident);
                save_outcome(conn, &incident.code, &outcome)?;
                Some(outcome)
            }
            None => {
                log::warn!("Incident '{}' not found in the database.", code);
                None
            }
        };
        results.push(Evaluated { code, outcome });
    }
    Ok(results)
}

// Helper function to summarize verdicts by label
fn summarize(results: &[Evaluated]) -> Vec<(String, usize)> {
    let mut summary: HashMap<String, usize> = HashMap::new();
    for result in results {
        *summary.entry(result.label().to_string()).or_insert(0) += 1;
    }
    let mut sorted: Vec<_> = summary.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

pub fn execute(app_config: &AppConfig, codes: &[String], all: bool) -> AppResult<()> {
    if codes.is_empty() && !all {
        return Err(AppError::InvalidInput(
            "Give at least one incident code, or --all.".to_string(),
        ));
    }

    let settings = SlaSettings::load(&app_config.settings_path)?;
    let policy = SlaPolicy::from_settings(&settings)?;

    let mut conn = persistence::open_connection_ensure_path(&app_config.database_path)?;
    persistence::initialize_db(&mut conn)?;

    let incidents: Vec<(String, Option<Incident>)> = if all {
        load_all_incidents(&conn)?
            .into_iter()
            .map(|inc| (inc.code.clone(), Some(inc)))
            .collect()
    } else {
        codes
            .iter()
            .map(|code| Ok((code.clone(), find_incident(&conn, code)?)))
            .collect::<AppResult<Vec<_>>>()?
    };
    if incidents.is_empty() {
        println!("No incidents to evaluate.");
        return Ok(());
    }

    let results = evaluate_and_store(&conn, &policy, incidents)?;

    println!("\n--- SLA Results ---");
    for result in &results {
        let time = sla_time_text(result.outcome.as_ref().and_then(|o| o.management_secs));
        let verdict = result
            .outcome
            .as_ref()
            .map_or_else(|| NOT_FOUND.to_string(), |o| o.verdict.to_string());
        println!("  {:<20} {:<32} {}", result.code, verdict, time);
    }

    println!("\n--- SLA Summary ---");
    for (label, count) in summarize(&results) {
        println!("  {:<40}: {}", label, count);
    }
    println!("  {:<40}: {}", "Total incidents processed", results.len());
    println!("---------------------------------------------");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{count_verdicts, import_incidents, initialize_db};
    use crate::types::SlaVerdict;

    fn setup() -> (Connection, SlaPolicy) {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize_db(&mut conn).unwrap();
        let incident = Incident {
            code: "INC1".into(),
            application: Some("Portal".into()),
            application_criticality: Some("Alta".into()),
            severity: Some("Alta".into()),
            work_log: "10-03-2025 10:00:00, ana, abre".into(),
            ..Default::default()
        };
        import_incidents(&mut conn, &[incident]).unwrap();
        let settings = SlaSettings::from_toml(
            "[[rules]]\nseverity = \"alta\"\ncriticality = \"alta\"\ntarget = \"1:00:00\"\n",
        )
        .unwrap();
        (conn, SlaPolicy::from_settings(&settings).unwrap())
    }

    #[test]
    fn test_evaluate_and_store_persists_verdicts() {
        let (conn, policy) = setup();
        let requested = vec![
            ("INC1".to_string(), find_incident(&conn, "INC1").unwrap()),
            ("INC404".to_string(), None),
        ];
        let results = evaluate_and_store(&conn, &policy, requested).unwrap();

        let first = results[0].outcome.as_ref().unwrap();
        assert_eq!(first.verdict, SlaVerdict::Met);
        assert_eq!(first.management_secs, Some(20 * 60));
        assert_eq!(results[1].label(), NOT_FOUND);
        assert_eq!(count_verdicts(&conn).unwrap(), vec![("Met".to_string(), 1)]);
    }

    #[test]
    fn test_summarize_counts_labels() {
        let results = vec![
            Evaluated { code: "A".into(), outcome: None },
            Evaluated { code: "B".into(), outcome: Some(SlaOutcome::unmeasured(SlaVerdict::NotApplicable)) },
            Evaluated { code: "C".into(), outcome: None },
        ];
        assert_eq!(
            summarize(&results),
            vec![(NOT_FOUND.to_string(), 2), ("Not Applicable".to_string(), 1)]
        );
    }

    #[test]
    fn test_execute_requires_codes_or_all() {
        let config = AppConfig {
            app_name: "test".into(),
            database_path: ":memory:".into(),
            settings_path: "missing.toml".into(),
        };
        assert!(matches!(execute(&config, &[], false), Err(AppError::InvalidInput(_))));
    }
}
