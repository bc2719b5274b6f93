// src/commands/report.rs
//! Chart data for the reporting dashboard.
//!
//! Every chart is a `{labels, values}` pair so the front end can hand it
//! straight to the charting library.

use crate::config::{AppConfig, SlaSettings, MONTH_NAMES, REPORT_TOP_N};
use crate::errors::{AppError, AppResult};
use crate::persistence::{self, load_all_incidents};
use crate::types::{non_blank, Incident, IncidentFilter};
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

const UNASSIGNED: &str = "Unassigned";
const NO_SEVERITY: &str = "No Severity";
const OTHER_GROUPS: &str = "Other Groups";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

impl ChartSeries {
    fn push(&mut self, label: impl Into<String>, value: usize) {
        self.labels.push(label.into());
        self.values.push(value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub total_general: usize,
    pub total_filtered: usize,
    pub by_application: ChartSeries,
    pub by_month: ChartSeries,
    pub by_severity: ChartSeries,
    pub by_closure_code: ChartSeries,
    pub by_special_group: ChartSeries,
}

// Counts per label, highest first (ties by label), optionally truncated.
fn count_by<'a>(
    incidents: &[&'a Incident],
    key: impl Fn(&'a Incident) -> Option<&'a str>,
    missing: &str,
    limit: Option<usize>,
) -> ChartSeries {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for incident in incidents {
        *counts.entry(key(*incident).unwrap_or(missing)).or_insert(0) += 1;
    }
    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted.truncate(limit.unwrap_or(usize::MAX));

    let mut series = ChartSeries::default();
    for (label, value) in sorted {
        series.push(label, value);
    }
    series
}

fn count_by_month(incidents: &[&Incident]) -> ChartSeries {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for resolved in incidents.iter().filter_map(|inc| inc.resolved_at) {
        *months.entry((resolved.year(), resolved.month())).or_insert(0) += 1;
    }
    let mut series = ChartSeries::default();
    for ((year, month), value) in months {
        series.push(format!("{} {}", MONTH_NAMES[month as usize - 1], year), value);
    }
    series
}

pub fn build_chart_data(
    incidents: &[Incident],
    filter: &IncidentFilter,
    special_group: Option<&str>,
) -> ChartData {
    let filtered: Vec<&Incident> = incidents.iter().filter(|inc| filter.matches(inc)).collect();

    let mut by_special_group = ChartSeries::default();
    if let Some(group) = special_group {
        let special = filtered
            .iter()
            .filter(|inc| {
                inc.resolver_group
                    .as_deref()
                    .is_some_and(|g| g.eq_ignore_ascii_case(group))
            })
            .count();
        by_special_group.push(group, special);
        by_special_group.push(OTHER_GROUPS, filtered.len() - special);
    }

    ChartData {
        total_general: incidents.len(),
        total_filtered: filtered.len(),
        by_application: count_by(&filtered, |inc| non_blank(&inc.application), UNASSIGNED, Some(REPORT_TOP_N)),
        by_month: count_by_month(&filtered),
        by_severity: count_by(&filtered, |inc| non_blank(&inc.severity), NO_SEVERITY, None),
        by_closure_code: count_by(&filtered, |inc| non_blank(&inc.closure_code), UNASSIGNED, Some(REPORT_TOP_N)),
        by_special_group,
    }
}

pub fn execute(app_config: &AppConfig, output: Option<&Path>, filter: &IncidentFilter) -> AppResult<()> {
    let settings = SlaSettings::load(&app_config.settings_path)?;

    let mut conn = persistence::open_connection_ensure_path(&app_config.database_path)?;
    persistence::initialize_db(&mut conn)?;
    let incidents = load_all_incidents(&conn)?;

    let data = build_chart_data(&incidents, filter, settings.special_resolver_group.as_deref());
    let json = serde_json::to_string_pretty(&data)?;
    match output {
        Some(path) => {
            fs::write(path, json).map_err(|e| AppError::io(path, e))?;
            log::info!("Chart data for {} incident(s) written to {:?}.", data.total_filtered, path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn inc(code: &str, app: Option<&str>, severity: &str, group: &str, resolved: (i32, u32, u32)) -> Incident {
        Incident {
            code: code.into(),
            application: app.map(String::from),
            severity: Some(severity.into()),
            resolver_group: Some(group.into()),
            closure_code: Some("CC-01".into()),
            resolved_at: NaiveDate::from_ymd_opt(resolved.0, resolved.1, resolved.2)
                .unwrap()
                .and_hms_opt(10, 0, 0),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Incident> {
        vec![
            inc("INC1", Some("Portal"), "Alta", "INDRA_D", (2025, 2, 3)),
            inc("INC2", Some("Portal"), "Baja", "N2", (2025, 1, 15)),
            inc("INC3", None, "Alta", "N2", (2024, 12, 31)),
        ]
    }

    #[test]
    fn test_chart_buckets() {
        let data = build_chart_data(&sample(), &IncidentFilter::default(), Some("indra_d"));
        assert_eq!(data.total_general, 3);
        assert_eq!(data.total_filtered, 3);
        assert_eq!(data.by_application.labels, vec!["Portal", UNASSIGNED]);
        assert_eq!(data.by_application.values, vec![2, 1]);
        assert_eq!(
            data.by_month.labels,
            vec!["Diciembre 2024", "Enero 2025", "Febrero 2025"]
        );
        assert_eq!(data.by_severity.labels, vec!["Alta", "Baja"]);
        assert_eq!(data.by_closure_code.values, vec![3]);
        assert_eq!(data.by_special_group.labels, vec!["indra_d", OTHER_GROUPS]);
        assert_eq!(data.by_special_group.values, vec![1, 2]);
    }

    #[test]
    fn test_blank_values_use_missing_labels() {
        let mut blank = inc("INC9", Some(" "), "", "N2", (2025, 1, 1));
        blank.closure_code = Some(String::new());
        let data = build_chart_data(&[blank], &IncidentFilter::default(), None);
        assert_eq!(data.by_application.labels, vec![UNASSIGNED]);
        assert_eq!(data.by_severity.labels, vec![NO_SEVERITY]);
        assert_eq!(data.by_closure_code.labels, vec![UNASSIGNED]);
    }

    #[test]
    fn test_filter_keeps_general_total() {
        let filter = IncidentFilter { year: Some(2025), ..Default::default() };
        let data = build_chart_data(&sample(), &filter, None);
        assert_eq!(data.total_general, 3);
        assert_eq!(data.total_filtered, 2);
        assert!(data.by_special_group.labels.is_empty());
    }

    #[test]
    fn test_top_n_limit() {
        let many: Vec<Incident> = (0..20)
            .map(|i| inc(&format!("INC{i}"), Some(&format!("App{i:02}")), "Alta", "N2", (2025, 1, 1)))
            .collect();
        let data = build_chart_data(&many, &IncidentFilter::default(), None);
        assert_eq!(data.by_application.labels.len(), REPORT_TOP_N);
        assert_eq!(data.by_application.labels[0], "App00");
    }

    #[test]
    fn test_serializes_as_labels_and_values() {
        let data = build_chart_data(&sample(), &IncidentFilter::default(), None);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["by_severity"]["values"], serde_json::json!([2, 1]));
    }
}
