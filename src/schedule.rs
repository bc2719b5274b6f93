// src/schedule.rs
use crate::config::SlaSettings;
use crate::errors::{AppError, AppResult};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::collections::HashSet;

/// Business hours per weekday plus holidays.
///
/// Opening and closing times are both inclusive, so a day open `08:00-18:00`
/// counts the second starting at 18:00:00.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkSchedule {
    // Indexed by days from Monday.
    hours: [Option<(NaiveTime, NaiveTime)>; 7],
    holidays: HashSet<NaiveDate>,
}

impl WorkSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hours(mut self, day: Weekday, open: NaiveTime, close: NaiveTime) -> Self {
        self.hours[day.num_days_from_monday() as usize] = Some((open, close));
        self
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    pub fn from_settings(settings: &SlaSettings) -> AppResult<Self> {
        let mut schedule = WorkSchedule::new();
        for (day_name, spec) in &settings.working_hours {
            let day: Weekday = day_name.parse().map_err(|_| {
                AppError::Config(format!("Unknown weekday '{}' in working_hours", day_name))
            })?;
            if spec.trim().eq_ignore_ascii_case("closed") {
                continue;
            }
            let (open, close) = parse_opening_hours(spec).ok_or_else(|| {
                AppError::Config(format!(
                    "Working hours for {} must look like 'HH:MM-HH:MM' or 'closed', got '{}'",
                    day_name, spec
                ))
            })?;
            schedule = schedule.with_hours(day, open, close);
        }
        for holiday in &settings.holidays {
            schedule = schedule.with_holiday(*holiday);
        }
        Ok(schedule)
    }

    pub fn is_working_time(&self, at: NaiveDateTime) -> bool {
        match self.window_for(at.date()) {
            Some((open, close)) => open <= at.time() && at.time() <= close,
            None => false,
        }
    }

    /// Seconds of `[start, end)` that fall within business hours.
    /// Round-the-clock measurement ignores the schedule entirely.
    pub fn effective_seconds(&self, start: NaiveDateTime, end: NaiveDateTime, round_the_clock: bool) -> i64 {
        if start >= end {
            return 0;
        }
        if round_the_clock {
            return (end - start).num_seconds();
        }

        let mut total = 0;
        let mut day = start.date();
        while day <= end.date() {
            if let Some((open, close)) = self.window_for(day) {
                let window_start = day.and_time(open).max(start);
                // Closing second is inclusive.
                let window_end = (day.and_time(close) + Duration::seconds(1)).min(end);
                if window_end > window_start {
                    total += (window_end - window_start).num_seconds();
                }
            }
            let Some(next) = day.succ_opt() else { break };
            day = next;
        }
        total
    }

    fn window_for(&self, day: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        if self.holidays.contains(&day) {
            return None;
        }
        self.hours[day.weekday().num_days_from_monday() as usize]
            .filter(|(open, close)| open <= close)
    }
}

fn parse_opening_hours(spec: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (open, close) = spec.split_once('-')?;
    let open = NaiveTime::parse_from_str(open.trim(), "%H:%M").ok()?;
    let close = NaiveTime::parse_from_str(close.trim(), "%H:%M").ok()?;
    Some((open, close))
}
