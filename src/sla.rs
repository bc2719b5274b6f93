// src/sla.rs
use crate::config::{SlaSettings, PENDING_MARKER};
use crate::errors::{AppError, AppResult};
use crate::schedule::WorkSchedule;
use crate::types::{non_blank, Incident, SlaOutcome, SlaVerdict};
use crate::utils::{format_duration_secs, normalize_text};
use crate::worklog::parse_work_log;
use std::collections::{HashMap, HashSet};

/// SLA settings compiled for evaluation: every name is pre-normalized.
#[derive(Debug, Clone)]
pub struct SlaPolicy {
    managers: HashSet<String>,
    rules: HashMap<(String, String), i64>,
    excluded_blocks: HashSet<String>,
    excluded_groups: HashSet<String>,
    round_the_clock_severity: String,
    fallback_secs: i64,
    schedule: WorkSchedule,
}

impl SlaPolicy {
    pub fn from_settings(settings: &SlaSettings) -> AppResult<Self> {
        let normalized = |names: &[String]| -> HashSet<String> {
            names.iter().map(|n| normalize_text(n)).collect()
        };
        let rules: HashMap<(String, String), i64> = settings
            .rules
            .iter()
            .map(|rule| {
                (
                    (normalize_text(&rule.severity), normalize_text(&rule.criticality)),
                    rule.target.0,
                )
            })
            .collect();
        let fallback_secs = settings
            .fallback_minutes
            .checked_mul(60)
            .filter(|secs| *secs >= 0)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "fallback_minutes must be a non-negative number of minutes, got {}",
                    settings.fallback_minutes
                ))
            })?;
        Ok(SlaPolicy {
            managers: normalized(&settings.managers),
            rules,
            excluded_blocks: normalized(&settings.exclusions.blocks),
            excluded_groups: normalized(&settings.exclusions.resolver_groups),
            round_the_clock_severity: normalize_text(&settings.round_the_clock_severity),
            fallback_secs,
            schedule: WorkSchedule::from_settings(settings)?,
        })
    }

    pub fn is_manager(&self, user: &str) -> bool {
        self.managers.contains(user)
    }

    pub fn evaluate(&self, incident: &Incident) -> SlaOutcome {
        let excluded = |set: &HashSet<String>, value: &Option<String>| {
            non_blank(value).is_some_and(|v| set.contains(&normalize_text(v)))
        };
        if excluded(&self.excluded_blocks, &incident.block)
            || excluded(&self.excluded_groups, &incident.resolver_group)
        {
            log::info!(
                "Incident {}: excluded from SLA (block {:?}, resolver group {:?}).",
                incident.code,
                incident.block,
                incident.resolver_group
            );
            return SlaOutcome::unmeasured(SlaVerdict::NotApplicable);
        }

        let (severity, criticality) = match (
            non_blank(&incident.severity),
            non_blank(&incident.application),
            non_blank(&incident.application_criticality),
        ) {
            (Some(severity), Some(_), Some(criticality)) => (severity, criticality),
            (severity, application, criticality) => {
                let mut missing = Vec::new();
                if severity.is_none() {
                    missing.push("Severity");
                }
                if application.is_none() {
                    missing.push("Application");
                } else if criticality.is_none() {
                    missing.push("Application Criticality");
                }
                log::warn!("Incident {}: SLA skipped, missing {}.", incident.code, missing.join(", "));
                return SlaOutcome::unmeasured(SlaVerdict::MissingData(missing));
            }
        };

        log::debug!("--- Analyzing segments for incident {} ---", incident.code);
        let entries = parse_work_log(&incident.work_log, &incident.code);
        let severity = normalize_text(severity);
        let round_the_clock = severity == self.round_the_clock_severity;

        let mut total = 0;
        for pair in entries.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            log::debug!(
                "{} -> {}: from '{}' to '{}' (opened in business hours: {})",
                current.at,
                next.at,
                current.user,
                next.user,
                self.schedule.is_working_time(current.at)
            );
            let manager_replied = self.is_manager(&next.user);
            let paused = normalize_text(&current.message).contains(PENDING_MARKER);
            if manager_replied && !paused {
                let segment = self.schedule.effective_seconds(current.at, next.at, round_the_clock);
                total += segment;
                log::debug!("counted: manager '{}' replied, +{}", next.user, format_duration_secs(segment));
            } else if !manager_replied {
                log::debug!("not counted: '{}' is not a manager", next.user);
            } else {
                log::debug!("not counted: clock paused by pending note from '{}'", current.user);
            }
        }

        if total == 0 && !round_the_clock && !entries.is_empty() {
            total = self.fallback_secs;
            log::debug!("zero management time, applying fallback of {}", format_duration_secs(total));
        }
        log::info!("Incident {}: management time {}", incident.code, format_duration_secs(total));

        let target = self
            .rules
            .get(&(severity, normalize_text(criticality)))
            .copied();
        let verdict = match target {
            Some(target) if total <= target => SlaVerdict::Met,
            Some(_) => SlaVerdict::Breached,
            None if entries.is_empty() => SlaVerdict::EmptyLog,
            None => SlaVerdict::RuleUndefined,
        };

        let last_manager = entries
            .iter()
            .rev()
            .find(|entry| self.is_manager(&entry.user))
            .map(|entry| entry.user.clone());

        SlaOutcome {
            verdict,
            management_secs: Some(total),
            target_secs: target,
            last_manager,
        }
    }
}
