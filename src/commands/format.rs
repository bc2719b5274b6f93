// src/commands/format.rs

use crate::errors::AppResult;
use crate::utils::{format_duration, is_normalized};
use std::io::{self, BufRead, Write};

/// Prints one normalized duration per argument, or per stdin line when none are given.
pub fn execute(durations: &[String]) -> AppResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if durations.is_empty() {
        log::debug!("No durations given, reading stdin.");
        format_lines(io::stdin().lock(), &mut out)?;
    } else {
        for duration in durations {
            writeln!(out, "{}", format_one(duration))?;
        }
    }
    Ok(())
}

fn format_one(duration: &str) -> String {
    let formatted = format_duration(duration);
    if !is_normalized(&formatted) {
        log::debug!("Unrecognized duration '{}' left as-is.", duration);
    }
    formatted
}

fn format_lines<R: BufRead, W: Write>(input: R, out: &mut W) -> io::Result<()> {
    for line in input.lines() {
        writeln!(out, "{}", format_one(&line?))?;
    }
    Ok(())
}
