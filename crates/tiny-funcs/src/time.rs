//! Date and duration functions.

use std::fmt::Write;

use chrono::{DateTime, Local, TimeZone, Utc};
use chrono_tz::Tz;
use minijinja::value::{Value, ValueKind};
use minijinja::{Error, ErrorKind};

use crate::FuncMap;
use crate::args;

impl FuncMap {
    /// Time functions: `date` and `duration`.
    #[must_use]
    pub fn time() -> Self {
        let mut map = Self::new();
        map.put("date", true, |a| {
            let a = args::exact("date", a, 3)?;
            let format = args::string("date", &a[0])?;
            let zone = args::string("date", &a[1])?;
            format_date(format, zone, &a[2]).map(Value::from)
        });
        map.put("duration", true, |a| {
            let a = args::exact("duration", a, 1)?;
            Ok(Value::from(format_duration(&a[0])))
        });
        map
    }
}

/// Format a date in the given zone.
///
/// `date` is unix seconds or an RFC 3339 string; anything else means now.
/// An empty zone or `Local` selects the local zone, unknown zones use UTC.
fn format_date(format: &str, zone: &str, date: &Value) -> Result<String, Error> {
    let instant = parse_instant(date);
    let mut out = String::new();
    let written = if zone.is_empty() || zone == "Local" {
        write!(out, "{}", instant.with_timezone(&Local).format(format))
    } else {
        let tz = zone.parse::<Tz>().unwrap_or(Tz::UTC);
        write!(out, "{}", instant.with_timezone(&tz).format(format))
    };
    written.map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid date format {format:?}"),
        )
    })?;
    Ok(out)
}

fn parse_instant(date: &Value) -> DateTime<Utc> {
    match date.kind() {
        ValueKind::Number => i64::try_from(date.clone())
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        ValueKind::String => date
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc)),
        _ => None,
    }
    .unwrap_or_else(Utc::now)
}

/// Spell out a number of seconds, e.g. `2 hours 1 minute 5 seconds`.
fn format_duration(value: &Value) -> String {
    let secs = if value.kind() == ValueKind::Number {
        f64::try_from(value.clone()).unwrap_or(0.0)
    } else {
        0.0
    };
    if secs < 1.0 {
        return String::new();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut remaining = secs as u64;

    let mut parts = Vec::new();
    for (unit, size) in [("hour", 3600), ("minute", 60), ("second", 1)] {
        let amount = remaining / size;
        remaining %= size;
        match amount {
            0 => {}
            1 => parts.push(format!("1 {unit}")),
            n => parts.push(format!("{n} {unit}s")),
        }
    }
    parts.join(" ")
}
