// src/worklog.rs
//! Parsing of free-text incident work logs.
//!
//! A log is a sequence of entries of the form
//! `DD-MM-YYYY H:MM:SS , user , message`, each starting on its own line.
//! Messages may span several lines. Exports from the ticketing tool use `¶`
//! in place of line breaks.

use crate::types::LogEntry;
use crate::utils::normalize_text;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

static ENTRY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t\u{a0}]*(\d{2}[-/]\d{2}[-/]\d{4} \d{1,2}:\d{2}:\d{2})\s*,\s*([^,]+?)\s*,",
    )
    .expect("work log header pattern is valid")
});

// Any line opening with a date closes the running message, header or not.
static MESSAGE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\r\n]+[ \t\u{a0}]*\d{2}[-/]\d{2}[-/]\d{4}")
        .expect("work log message boundary pattern is valid")
});

const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

pub fn parse_work_log(text: &str, incident: &str) -> Vec<LogEntry> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let text = text.replace('¶', "\n");

    let headers: Vec<_> = ENTRY_HEADER.captures_iter(&text).collect();
    let mut entries = Vec::with_capacity(headers.len());

    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(stamp), Some(user)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let next_header = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());
        let rest = &text[whole.end()..next_header];
        let message_len = MESSAGE_END.find(rest).map_or(rest.len(), |m| m.start());
        let message = rest[..message_len].trim();

        match NaiveDateTime::parse_from_str(&stamp.as_str().replace('/', "-"), TIMESTAMP_FORMAT) {
            Ok(at) => entries.push(LogEntry {
                at,
                user: normalize_text(user.as_str()),
                message: message.to_string(),
            }),
            Err(e) => log::warn!(
                "Incident {}: cannot parse work log timestamp '{}' ({}). Skipping entry.",
                incident,
                stamp.as_str(),
                e
            ),
        }
    }

    entries.sort_by_key(|entry| entry.at);
    entries
}
