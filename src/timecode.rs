//! # Time Markers
//!
//! Parsing for the two kinds of time values found in hymn page data:
//!
//! - **Start attributes** on transcript rows: a millisecond integer encoded as a
//!   string. These are read with [`parse_start_attr`], which never fails; any
//!   missing or malformed value becomes [`DEFAULT_START_MS`].
//! - **Authored cue times** such as `0:06.5` or `1:02:03`. These are read with
//!   [`parse_timecode`], which reports malformed input as
//!   [`HymnalError::Timecode`].
//!
//! ## Example
//! ```rust
//! use hymnal::{parse_start_attr, parse_timecode};
//!
//! assert_eq!(parse_start_attr(Some("2500")), 2500);
//! assert_eq!(parse_start_attr(Some("soon")), 0);
//! assert_eq!(parse_timecode("0:06.5").unwrap(), 6500);
//! assert_eq!(parse_timecode("1:02:03").unwrap(), 3_723_000);
//! ```

use crate::error::HymnalError;

/// Start time used for a row whose start attribute is absent or unreadable.
///
/// Zero makes such a row count as "already started", so it is highlighted as
/// soon as playback reaches it in document order.
pub const DEFAULT_START_MS: u64 = 0;

/// Read a row's start attribute (milliseconds, decimal).
///
/// Leading whitespace and a leading `+` are accepted, and trailing garbage after
/// the digits is ignored (`"1500ms"` reads as 1500). Absent, empty, negative,
/// non-numeric or overflowing values all yield [`DEFAULT_START_MS`].
pub fn parse_start_attr(raw: Option<&str>) -> u64 {
    raw.and_then(parse_leading_int)
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(DEFAULT_START_MS)
}

/// Read the leading decimal integer of `s`, the way a lenient page script
/// would: leading whitespace and one sign are allowed, and parsing stops at
/// the first non-digit. `None` when there are no digits or the value
/// overflows.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse an authored cue time into milliseconds.
///
/// Accepted forms:
/// - `s` / `s.f` - seconds only (`6`, `6.5`)
/// - `m:ss` / `m:ss.s` / `mm:ss` - minutes and seconds (`0:06`, `02:15`)
/// - `h:mm:ss` - hours, minutes, seconds (`1:02:03`)
///
/// Only the last field may carry a fraction. The result is rounded to the
/// nearest millisecond. An empty string is `0`, and so is anything with more
/// than three fields.
pub fn parse_timecode(t: &str) -> Result<u64, HymnalError> {
    let t = t.trim();
    if t.is_empty() {
        return Ok(0);
    }

    let parts: Vec<&str> = t.split(':').collect();
    if parts.len() > 3 {
        return Ok(0);
    }

    let (last, leading) = match parts.split_last() {
        Some(split) => split,
        None => return Ok(0),
    };
    let seconds = parse_seconds_field(t, last)?;
    let mut whole = Vec::with_capacity(leading.len());
    for field in leading {
        whole.push(parse_whole_field(t, field)?);
    }

    let total = match whole.as_slice() {
        [] => seconds,
        [m] => (*m as f64) * 60.0 + seconds,
        [h, m] => (*h as f64) * 3600.0 + (*m as f64) * 60.0 + seconds,
        _ => return Ok(0),
    };
    Ok((total * 1000.0).round() as u64)
}

fn parse_seconds_field(input: &str, field: &str) -> Result<f64, HymnalError> {
    let value: f64 = field.trim().parse().map_err(|_| HymnalError::Timecode {
        input: input.to_string(),
        message: format!("invalid seconds field '{}'", field),
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(HymnalError::Timecode {
            input: input.to_string(),
            message: format!("seconds out of range '{}'", field),
        });
    }
    Ok(value)
}

fn parse_whole_field(input: &str, field: &str) -> Result<u64, HymnalError> {
    field.trim().parse().map_err(|_| HymnalError::Timecode {
        input: input.to_string(),
        message: format!("invalid field '{}'", field),
    })
}

/// Format milliseconds as `m:ss.mmm`.
pub fn format_timecode(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// Read a yes/no flag from page data.
///
/// `1`, `true`, `yes`, `y`, `on` are true and `0`, `false`, `no`, `n`, `off`
/// are false (case-insensitive, surrounding whitespace ignored). Anything else,
/// including an absent value, yields `default`.
pub fn parse_flag(v: Option<&str>, default: bool) -> bool {
    let Some(v) = v else {
        return default;
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => default,
    }
}
