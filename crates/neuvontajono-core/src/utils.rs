//! Utility functions for the help queue

use crate::Result;
use chrono::{NaiveDate, NaiveTime, Timelike};

/// Clean a call link submitted with a queue entry
///
/// Only `http://` and `https://` links are accepted. The link is trimmed and
/// its host converted to ASCII (punycode). Anything else becomes an empty string.
#[must_use]
pub fn sanitize_call_url(input: &str) -> String {
    if !(input.starts_with("https://") || input.starts_with("http://")) {
        return String::new();
    }

    url::Url::parse(input.trim())
        .map(|url| url.as_str().to_string())
        .unwrap_or_default()
}

/// Minutes elapsed since midnight
#[must_use]
pub fn minutes_after_midnight(time: NaiveTime) -> u16 {
    // hour < 24 and minute < 60, so the result always fits
    #[allow(clippy::cast_possible_truncation)]
    let minutes = (time.hour() * 60 + time.minute()) as u16;
    minutes
}

/// Format minutes after midnight as `H:MM`
#[must_use]
pub fn format_clock(minutes: u16) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Encode one queue length sample as `"M|L"`
#[must_use]
pub fn format_sample(minutes: u16, length: usize) -> String {
    format!("{minutes}|{length}")
}

/// Decode a `"M|L"` queue length sample
///
/// Returns `None` for anything that is not two non-negative integers separated by `|`.
#[must_use]
pub fn parse_sample(sample: &str) -> Option<(u16, u32)> {
    let (minutes, length) = sample.split_once('|')?;
    let minutes = minutes.trim().parse::<u16>().ok()?;
    let length = length.trim().parse::<u32>().ok()?;
    (minutes < 24 * 60).then_some((minutes, length))
}

/// Translate a moment-style date pattern (`D.M.YYYY`) into a chrono format string
///
/// Supported tokens are `D`, `DD`, `M`, `MM`, `YY` and `YYYY`. Everything else
/// is copied literally.
#[must_use]
pub fn moment_to_chrono(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        match (c, run) {
            ('D', 1) => out.push_str("%-d"),
            ('D', 2) => out.push_str("%d"),
            ('M', 1) => out.push_str("%-m"),
            ('M', 2) => out.push_str("%m"),
            ('Y', 2) => out.push_str("%y"),
            ('Y', 4) => out.push_str("%Y"),
            ('%', _) => {
                for _ in 0..run {
                    out.push_str("%%");
                }
            }
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
            }
        }
    }

    out
}

/// Parse a date typed in the given moment-style pattern
///
/// # Errors
///
/// Returns a validation error if the input does not match the pattern.
pub fn parse_localized_date(input: &str, pattern: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), &moment_to_chrono(pattern))
        .map_err(|e| crate::Error::validation("date", format!("Invalid date '{input}': {e}")))
}

/// Format a date with the given moment-style pattern
#[must_use]
pub fn format_localized_date(date: NaiveDate, pattern: &str) -> String {
    date.format(&moment_to_chrono(pattern)).to_string()
}
