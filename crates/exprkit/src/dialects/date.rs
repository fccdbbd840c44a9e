//! The `date(text)` function.

use crate::error::EvalError;
use crate::language::Language;
use crate::value::Value;
use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};

/// Formats carrying their own offset. A trailing `Z` is rewritten to
/// `+0000` before these are tried.
const ZONED: &[&str] = &[
    "%a %b %d %H:%M:%S %z %Y",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Formats interpreted in local time.
const LOCAL: &[&str] = &["%a %b %e %H:%M:%S %Y", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

fn local(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    let t = Local.from_local_datetime(&naive).earliest()?;
    Some(t.with_timezone(&t.offset().fix()))
}

// `%H%z` alone leaves the minute unset, which chrono refuses.
fn hour_only(s: &str) -> Option<DateTime<FixedOffset>> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, s, StrftimeItems::new("%Y-%m-%dT%H%z")).ok()?;
    parsed.set_minute(0).ok()?;
    parsed.to_datetime().ok()
}

/// Parses the date formats `date()` accepts, trying each in turn.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }

    let zoned = match s.strip_suffix('Z') {
        Some(rest) => format!("{rest}+0000"),
        None => s.to_string(),
    };
    if let Some(t) = ZONED
        .iter()
        .find_map(|format| DateTime::parse_from_str(&zoned, format).ok())
    {
        return Some(t);
    }
    if let Some(t) = hour_only(&zoned) {
        return Some(t);
    }

    if let Some(naive) = LOCAL
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return local(naive);
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return local(day.and_hms_opt(0, 0, 0)?);
    }
    if let Ok(time) = NaiveTime::parse_from_str(s, "%I:%M%p") {
        return local(NaiveDate::from_ymd_opt(0, 1, 1)?.and_time(time));
    }
    None
}

/// `date(text)` parses RFC 3339, ISO 8601 and a few common layouts into a
/// date-time value:
///
/// | layout                            | example                           |
/// |-----------------------------------|-----------------------------------|
/// | RFC 3339                          | `2006-01-02T15:04:05.5+07:00`     |
/// | date                              | `2006-01-02`                      |
/// | date and minutes                  | `2006-01-02 15:04`                |
/// | date and seconds                  | `2006-01-02 15:04:05`             |
/// | date, seconds and offset          | `2006-01-02 15:04:05-07:00`       |
/// | ISO 8601, hour to nanoseconds     | `2006-01-02T15Z`                  |
/// | ISO 8601 with a numeric offset    | `2006-01-02T15:04-0700`           |
/// | ANSI C                            | `Mon Jan  2 15:04:05 2006`        |
/// | Ruby                              | `Mon Jan 02 15:04:05 -0700 2006`  |
/// | kitchen                           | `3:04PM`                          |
///
/// Layouts without an offset are read in local time.
pub fn date() -> Language {
    Language::function("date", |args| match args {
        [Value::String(s)] => parse_date(s)
            .map(Value::DateTime)
            .ok_or_else(|| EvalError::function("date", format!("could not parse {s}"))),
        _ => Err(EvalError::function("date", "expects exactly one string argument")),
    })
}
