use crate::utils::{format_duration_secs, parse_hms};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// --- Structs for Data Representation ---

/// An incident as imported from the ticketing system export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Incident {
    pub code: String,
    #[serde(deserialize_with = "blank_as_none")]
    pub application: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub application_criticality: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub severity: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub block: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub resolver_group: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub closure_code: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub assigned_user: Option<String>,
    pub opened_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub work_log: String,
}

// Exports write empty cells for unset fields; read them as absent.
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// The value of an optional text field, treating blank text as missing.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// An incident together with the SLA result stored by the last calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIncident {
    pub incident: Incident,
    pub sla_verdict: Option<String>,
    pub sla_seconds: Option<i64>,
}

/// One timestamped line of an incident work log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: NaiveDateTime,
    /// Normalized user name.
    pub user: String,
    pub message: String,
}

/// A `H:MM:SS` span, used for SLA targets in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hms(pub i64);

impl FromStr for Hms {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hms(s)
            .map(Hms)
            .ok_or_else(|| format!("expected H:MM:SS, got '{}'", s))
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration_secs(self.0))
    }
}

/// Outcome of an SLA evaluation. The label is what gets stored and exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlaVerdict {
    Met,
    Breached,
    /// Block or resolver group is excluded from SLA accounting.
    NotApplicable,
    /// No rule for the severity / criticality pair.
    RuleUndefined,
    MissingData(Vec<&'static str>),
    EmptyLog,
}

impl SlaVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            SlaVerdict::Met => "Met",
            SlaVerdict::Breached => "Breached",
            SlaVerdict::NotApplicable => "Not Applicable",
            SlaVerdict::RuleUndefined => "SLA Not Defined",
            SlaVerdict::MissingData(_) => "Not Calculated (Missing Data)",
            SlaVerdict::EmptyLog => "Not Calculated (Empty Log)",
        }
    }
}

impl fmt::Display for SlaVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlaVerdict::MissingData(fields) => {
                write!(f, "{} [{}]", self.label(), fields.join(", "))
            }
            _ => f.write_str(self.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaOutcome {
    pub verdict: SlaVerdict,
    /// Effective management time; `None` when the incident was never measured.
    pub management_secs: Option<i64>,
    pub target_secs: Option<i64>,
    pub last_manager: Option<String>,
}

impl SlaOutcome {
    pub fn unmeasured(verdict: SlaVerdict) -> Self {
        SlaOutcome { verdict, management_secs: None, target_secs: None, last_manager: None }
    }
}

/// Filters shared by the list, export and report commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct IncidentFilter {
    /// Only incidents whose code contains this text (case-insensitive)
    #[arg(long = "incident")]
    pub code_contains: Option<String>,
    /// Resolved on or after this date (YYYY-MM-DD)
    #[arg(long = "from")]
    pub resolved_from: Option<NaiveDate>,
    /// Resolved on or before this date, whole day included (YYYY-MM-DD)
    #[arg(long = "to")]
    pub resolved_to: Option<NaiveDate>,
    #[arg(long)]
    pub application: Option<String>,
    #[arg(long)]
    pub block: Option<String>,
    #[arg(long)]
    pub severity: Option<String>,
    #[arg(long)]
    pub closure_code: Option<String>,
    /// Assigned user
    #[arg(long)]
    pub user: Option<String>,
    /// Year of resolution
    #[arg(long)]
    pub year: Option<i32>,
    /// Month of resolution (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        if let Some(needle) = &self.code_contains {
            if !incident.code.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        let same = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            Some(w) => actual.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(w)),
            None => true,
        };
        if !(same(&self.application, &incident.application)
            && same(&self.block, &incident.block)
            && same(&self.severity, &incident.severity)
            && same(&self.closure_code, &incident.closure_code)
            && same(&self.user, &incident.assigned_user))
        {
            return false;
        }

        let needs_date = self.resolved_from.is_some()
            || self.resolved_to.is_some()
            || self.year.is_some()
            || self.month.is_some();
        if !needs_date {
            return true;
        }
        let Some(resolved) = incident.resolved_at else {
            return false;
        };
        let day = resolved.date();
        self.resolved_from.is_none_or(|from| day >= from)
            && self.resolved_to.is_none_or(|to| day <= to)
            && self.year.is_none_or(|year| resolved.year() == year)
            && self.month.is_none_or(|month| resolved.month() == month)
    }
}

// --- CLI Subcommands ---

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Normalize SLA duration text ("1 día, 4:05:10") to HH:MM:SS; reads stdin when no value is given
    Format {
        durations: Vec<String>,
    },
    /// Import (or update) incidents from a JSON array file
    Import {
        file: PathBuf,
    },
    /// List stored incidents with their last computed SLA verdict and time
    List {
        #[command(flatten)]
        filter: IncidentFilter,
    },
    /// Compute SLA compliance for stored incidents and save the verdicts
    Calculate {
        /// Incident codes to evaluate
        codes: Vec<String>,
        /// Evaluate every stored incident
        #[arg(long, conflicts_with = "codes")]
        all: bool,
    },
    /// Export an SLA report for the matching incidents as CSV
    Export {
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        filter: IncidentFilter,
    },
    /// Show stored SLA verdict counts
    Stats,
    /// Print chart data (JSON) for the reporting dashboard
    Report {
        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: IncidentFilter,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(date: &str) -> Incident {
        Incident {
            code: "INC0001".into(),
            application: Some("Portal".into()),
            resolved_at: Some(
                NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_hms_from_str_and_display() {
        let hms: Hms = "4:00:00".parse().unwrap();
        assert_eq!(hms, Hms(14_400));
        assert_eq!(hms.to_string(), "04:00:00");
        assert!("four hours".parse::<Hms>().is_err());
    }

    #[test]
    fn test_blank_fields_deserialize_as_missing() {
        let json = r#"{"code": "INC1", "severity": "  ", "application": "", "block": null, "closure_code": "CC-01"}"#;
        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.severity, None);
        assert_eq!(incident.application, None);
        assert_eq!(incident.block, None);
        assert_eq!(incident.closure_code.as_deref(), Some("CC-01"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some(" \t".into())), None);
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some("Alta".into())), Some("Alta"));
    }

    #[test]
    fn test_missing_data_display_lists_fields() {
        let verdict = SlaVerdict::MissingData(vec!["Severity", "Application"]);
        assert_eq!(verdict.label(), "Not Calculated (Missing Data)");
        assert_eq!(
            verdict.to_string(),
            "Not Calculated (Missing Data) [Severity, Application]"
        );
    }

    #[test]
    fn test_filter_to_date_includes_whole_day() {
        let filter = IncidentFilter {
            resolved_to: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..Default::default()
        };
        assert!(filter.matches(&resolved("2025-03-10 23:59:59")));
        assert!(!filter.matches(&resolved("2025-03-11 00:00:00")));
    }

    #[test]
    fn test_filter_date_excludes_unresolved() {
        let filter = IncidentFilter { year: Some(2025), ..Default::default() };
        let mut incident = resolved("2025-01-01 00:00:00");
        assert!(filter.matches(&incident));
        incident.resolved_at = None;
        assert!(!filter.matches(&incident));
    }

    #[test]
    fn test_filter_code_and_application() {
        let filter = IncidentFilter {
            code_contains: Some("inc00".into()),
            application: Some("portal".into()),
            ..Default::default()
        };
        assert!(filter.matches(&resolved("2025-01-01 00:00:00")));
        let other = IncidentFilter { application: Some("Billing".into()), ..Default::default() };
        assert!(!other.matches(&resolved("2025-01-01 00:00:00")));
    }
}
