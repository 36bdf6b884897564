//! Free-text date and time input for the deadline screens.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M",
    "%H:%M:%S",
    "%H%M",
    "%H.%M",
    "%I:%M %p",
    "%I:%M%p",
    "%I:%M:%S %p",
];

/// Parse a calendar date typed by the user.
///
/// Slash and dot forms are day-first (`31/12/2025`). `today` and `tomorrow`
/// are relative to `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.checked_add_days(Days::new(1)),
        _ => {}
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// A wall-clock time, optionally pinned to an explicit UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTime {
    pub time: NaiveTime,
    pub offset: Option<FixedOffset>,
}

/// Parse a time such as `18:30`, `1830`, `6:30 pm` or `18:30+03:00`.
pub fn parse_time(input: &str) -> Option<ParsedTime> {
    let upper = input.trim().to_uppercase();
    let (clock, offset) = split_offset(&upper)?;
    let clock = expand_bare_hour(clock.trim());

    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&clock, fmt).ok())?;
    Some(ParsedTime { time, offset })
}

/// Combine a date and a parsed time into a UTC instant.
///
/// Without an explicit offset the time is read in `tz`. Returns `None` for a
/// local time skipped by a DST transition; an ambiguous one resolves to the
/// earlier instant.
pub fn resolve_due(date: NaiveDate, time: &ParsedTime, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = date.and_time(time.time);
    match time.offset {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Split a trailing `Z`, `+HH`, `+HHMM` or `+HH:MM` off the input.
///
/// Returns `None` when a suffix is present but malformed.
fn split_offset(s: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = s.strip_suffix('Z') {
        if clock.ends_with(|c: char| c.is_ascii_digit()) {
            return Some((clock, FixedOffset::east_opt(0)));
        }
    }

    let Some(idx) = s.rfind(['+', '-']) else {
        return Some((s, None));
    };
    if idx == 0 {
        return None;
    }

    let (clock, suffix) = s.split_at(idx);
    let sign = if suffix.starts_with('-') { -1 } else { 1 };
    let digits: String = suffix[1..].chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
    Some((clock, Some(offset)))
}

/// `6 PM` -> `6:00 PM`; everything else unchanged.
fn expand_bare_hour(clock: &str) -> String {
    for suffix in ["AM", "PM"] {
        if let Some(hour) = clock.strip_suffix(suffix) {
            let hour = hour.trim();
            if !hour.is_empty() && hour.len() <= 2 && hour.chars().all(|c| c.is_ascii_digit()) {
                return format!("{hour}:00 {suffix}");
            }
        }
    }
    clock.to_string()
}
