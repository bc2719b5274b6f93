// src/config.rs

use crate::errors::{AppError, AppResult};
use crate::types::Hms;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// === Application Info ===
pub const APP_NAME: &str = "sla_tracker";
// Subdirectory of the user data directory holding the database and settings.
pub const DATA_DIR_NAME: &str = "SlaTracker";

// === Persistence Settings ===
pub const DATABASE_FILENAME: &str = "sla_tracker.sqlite";
pub const SETTINGS_FILENAME: &str = "sla_settings.toml";

// === SLA Defaults ===
pub const DEFAULT_FALLBACK_MINUTES: i64 = 20;
pub const DEFAULT_ROUND_THE_CLOCK_SEVERITY: &str = "critica";
// A work-log note containing this word pauses the SLA clock.
pub const PENDING_MARKER: &str = "pendiente";

// === Report Settings ===
pub const REPORT_TOP_N: usize = 15;
pub const MONTH_NAMES: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio",
    "Julio", "Agosto", "Septiembre", "Octubre", "Noviembre", "Diciembre",
];

/// Paths resolved for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub database_path: PathBuf,
    pub settings_path: PathBuf,
}

impl AppConfig {
    /// Explicit paths win; anything else lives under the user data directory.
    pub fn resolve(database: Option<PathBuf>, settings: Option<PathBuf>) -> AppResult<Self> {
        let (database_path, settings_path) = match (database, settings) {
            (Some(db), Some(settings)) => (db, settings),
            (database, settings) => {
                let dir = data_dir()?;
                (
                    database.unwrap_or_else(|| dir.join(DATABASE_FILENAME)),
                    settings.unwrap_or_else(|| dir.join(SETTINGS_FILENAME)),
                )
            }
        };
        Ok(AppConfig {
            app_name: APP_NAME.to_string(),
            database_path,
            settings_path,
        })
    }
}

fn data_dir() -> AppResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or_else(|| AppError::DataDir("Could not find user data directory.".to_string()))
}

// === SLA settings file ===

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlaRuleSetting {
    pub severity: String,
    pub criticality: String,
    #[serde_as(as = "DisplayFromStr")]
    pub target: Hms,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Exclusions {
    pub blocks: Vec<String>,
    pub resolver_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlaSettings {
    /// Users whose replies count as management time.
    pub managers: Vec<String>,
    /// Severity measured on wall-clock time instead of business hours.
    pub round_the_clock_severity: String,
    pub fallback_minutes: i64,
    /// Resolver group reported separately in the chart data.
    pub special_resolver_group: Option<String>,
    pub holidays: Vec<NaiveDate>,
    pub exclusions: Exclusions,
    pub rules: Vec<SlaRuleSetting>,
    /// Weekday name -> "HH:MM-HH:MM" or "closed".
    pub working_hours: BTreeMap<String, String>,
}

impl Default for SlaSettings {
    fn default() -> Self {
        SlaSettings {
            managers: Vec::new(),
            round_the_clock_severity: DEFAULT_ROUND_THE_CLOCK_SEVERITY.to_string(),
            fallback_minutes: DEFAULT_FALLBACK_MINUTES,
            special_resolver_group: None,
            holidays: Vec::new(),
            exclusions: Exclusions::default(),
            rules: Vec::new(),
            working_hours: BTreeMap::new(),
        }
    }
}

impl SlaSettings {
    pub fn from_toml(text: &str) -> AppResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::warn!("Settings file {:?} not found. Using defaults (no rules, no working hours).", path);
            return Ok(SlaSettings::default());
        }
        let text = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let settings = Self::from_toml(&text)?;
        log::info!(
            "Loaded settings from {:?}: {} manager(s), {} rule(s), {} holiday(s).",
            path,
            settings.managers.len(),
            settings.rules.len(),
            settings.holidays.len()
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
managers = ["jperez", "María López"]
fallback_minutes = 15
holidays = ["2025-09-18"]

[exclusions]
blocks = ["Sin Bloque"]

[[rules]]
severity = "Alta"
criticality = "Crítica"
target = "4:00:00"

[working_hours]
monday = "08:30-18:00"
saturday = "closed"
"#;

    #[test]
    fn test_parse_sample_settings() {
        let settings = SlaSettings::from_toml(SAMPLE).unwrap();
        assert_eq!(settings.managers.len(), 2);
        assert_eq!(settings.fallback_minutes, 15);
        assert_eq!(settings.round_the_clock_severity, DEFAULT_ROUND_THE_CLOCK_SEVERITY);
        assert_eq!(settings.holidays, vec![NaiveDate::from_ymd_opt(2025, 9, 18).unwrap()]);
        assert_eq!(settings.exclusions.blocks, vec!["Sin Bloque".to_string()]);
        assert!(settings.exclusions.resolver_groups.is_empty());
        assert_eq!(settings.rules[0].target, Hms(4 * 3600));
        assert_eq!(settings.working_hours["saturday"], "closed");
    }

    #[test]
    fn test_bundled_demo_settings_parse() {
        let settings = SlaSettings::from_toml(include_str!("../demos/sla_settings.toml")).unwrap();
        assert_eq!(settings.rules.len(), 4);
        assert_eq!(settings.special_resolver_group.as_deref(), Some("INDRA_D"));
        assert_eq!(settings.working_hours.len(), 7);
    }

    #[test]
    fn test_bad_rule_target_is_rejected() {
        let text = "[[rules]]\nseverity = \"Alta\"\ncriticality = \"Alta\"\ntarget = \"4h\"\n";
        assert!(matches!(SlaSettings::from_toml(text), Err(AppError::Toml(_))));
    }

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SlaSettings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, SlaSettings::default());
    }

    #[test]
    fn test_resolve_with_explicit_paths() {
        let config = AppConfig::resolve(
            Some(PathBuf::from("/tmp/db.sqlite")),
            Some(PathBuf::from("/tmp/settings.toml")),
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/db.sqlite"));
        assert_eq!(config.app_name, APP_NAME);
    }
}
