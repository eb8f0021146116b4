//! `--since` / `--end` parsing.
//!
//! A bound is either a relative duration counted back from now
//! (`30s`, `5m`, `1h30m`, `1.5h`, `0`) or an absolute RFC 3339 timestamp.

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::ConfigError;

const UNITS: &[(&str, f64)] = &[
    ("ns", 1e-6),
    ("us", 1e-3),
    ("µs", 1e-3),
    ("μs", 1e-3),
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

/// Parse a relative duration such as `1h30m` into a signed delta.
/// Returns `None` when `s` is not a duration.
pub fn parse_duration(s: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total_ms = 0f64;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let (_, scale) = UNITS.iter().find(|(name, _)| *name == unit)?;
        total_ms += value * scale;
        rest = &rest[unit_len..];
    }

    if !total_ms.is_finite() || total_ms.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(total_ms.round() as i64)?;
    Some(if negative { -delta } else { delta })
}

/// Resolve one bound against `now`.
pub fn parse_time_bound(
    field: &'static str,
    value: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();
    let at = match parse_duration(value) {
        Some(delta) => now
            .checked_sub_signed(delta)
            .ok_or(ConfigError::BeforeEpoch { field })?,
        None => DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ConfigError::InvalidTime {
                field,
                value: value.to_string(),
            })?,
    };
    if at.timestamp() < 0 {
        return Err(ConfigError::BeforeEpoch { field });
    }
    Ok(at)
}

/// Resolve `--since` and optional `--end` into epoch milliseconds.
pub fn resolve_window(
    since: &str,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(i64, Option<i64>), ConfigError> {
    let start = parse_time_bound("since", since, now)?;
    let end = match end.map(str::trim).filter(|e| !e.is_empty()) {
        Some(e) => Some(parse_time_bound("end", e, now)?),
        None => None,
    };
    if let Some(end) = end
        && end < start
    {
        return Err(ConfigError::EndBeforeStart {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }
    Ok((
        start.timestamp_millis(),
        end.map(|e| e.timestamp_millis()),
    ))
}
