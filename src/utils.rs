// src/utils.rs

/// Display value for durations that do not apply to a record.
pub const NOT_APPLICABLE: &str = "N/A";

// Day markers recognised in localized duration text ("1 día, 4:05:10", "2 days, 0:10:00").
const DAY_MARKERS: [&str; 2] = ["día", "day"];

/// Normalizes a localized SLA duration ("1 día, 4:05:10", "8:30:00") into `HH:MM:SS`.
///
/// Hours are unbounded, so multi-day spans render as `28:05:10` or `240:00:00`.
/// Input outside the accepted shapes is returned unchanged so callers can display it as-is.
pub fn format_duration(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case(NOT_APPLICABLE) {
        return NOT_APPLICABLE.to_string();
    }

    let mut days: i64 = 0;
    let mut time_part = trimmed;

    if DAY_MARKERS.iter().any(|marker| trimmed.contains(marker)) {
        let mut segments = trimmed.split(',');
        let day_segment = segments.next().unwrap_or_default();
        time_part = segments.next().map(str::trim).unwrap_or("0:0:0");
        days = leading_int(day_segment).unwrap_or(0);
    }

    let components: Vec<&str> = time_part.split(':').collect();
    let [hours, minutes, seconds] = components.as_slice() else {
        return input.to_string();
    };

    let total_hours = days
        .saturating_mul(24)
        .saturating_add(leading_int(hours).unwrap_or(0));
    format!("{:02}:{:0>2}:{:0>2}", total_hours, minutes, seconds)
}

// Lenient integer read: optional sign followed by the leading digit run, trailing text ignored.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }
    // Only overflow can fail here; keep the magnitude instead of dropping it.
    let saturated = if sign < 0 { i64::MIN } else { i64::MAX };
    Some(digits.parse::<i64>().map_or(saturated, |value| sign * value))
}

// Formats total seconds (i64)
pub fn format_duration_secs(total_seconds: i64) -> String {
    if total_seconds < 0 { return "Invalid".to_string(); }
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Renders seconds the way the incident tracker stores elapsed SLA time:
/// `4:05:10`, `1 day, 4:05:10`, `2 days, 0:00:00`.
pub fn day_style_duration(total_seconds: i64) -> String {
    if total_seconds < 0 { return "Invalid".to_string(); }
    let days = total_seconds / 86_400;
    let rest = total_seconds % 86_400;
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        _ => format!("{} days, {}", days, clock),
    }
}

/// SLA time as shown to users: stored seconds through the duration formatter, `N/A` when unmeasured.
pub fn sla_time_text(seconds: Option<i64>) -> String {
    let raw = seconds.map_or_else(|| NOT_APPLICABLE.to_string(), day_style_duration);
    format_duration(&raw)
}

/// Parses a strict `H:MM:SS` string (hours unbounded) into total seconds.
pub fn parse_hms(text: &str) -> Option<i64> {
    let mut parts = text.trim().split(':');
    let (hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let field = |value: &str| -> Option<i64> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok()
    };
    if minutes.len() > 2 || seconds.len() > 2 {
        return None;
    }
    let (hours, minutes, seconds) = (field(hours)?, field(minutes)?, field(seconds)?);
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)
}

/// True for `N/A` or a `HH:MM:SS` string with at least two hour digits.
pub fn is_normalized(text: &str) -> bool {
    if text == NOT_APPLICABLE {
        return true;
    }
    let parts: Vec<&str> = text.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return false;
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    hours.len() >= 2
        && minutes.len() == 2
        && seconds.len() == 2
        && all_digits(hours)
        && all_digits(minutes)
        && all_digits(seconds)
}

/// Folds text for comparisons: collapsed whitespace, lower case, no diacritics.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .filter(|c| !('\u{0300}'..='\u{036F}').contains(c))
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
