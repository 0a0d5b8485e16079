//! Display helpers for time dimensions: format selection, UTC date/time parts,
//! endpoint ordering and zone offsets.
//!
//! Locale-specific date formats are never looked up here. Callers pass either
//! a resolved format string to [`date_time_format`] or a [`DateFormatSource`]
//! to [`resolve_date_time_format`].

use std::str::FromStr;

use chrono::{Offset, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimeDomainError};
use crate::instant::{coerce, Instant, TimeValue};

/// Time-of-day display format (moment.js tokens), shared by every locale.
pub const TIME_FORMAT: &str = "HH:mm:ss";

/// What part of a datetime a dimension attribute carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DimensionKind {
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "time")]
    Time,
    #[default]
    #[serde(rename = "date-time")]
    DateTime,
}

impl FromStr for DimensionKind {
    type Err = TimeDomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "date" => Ok(DimensionKind::Date),
            "time" => Ok(DimensionKind::Time),
            "date-time" => Ok(DimensionKind::DateTime),
            other => Err(TimeDomainError::UnknownOption(format!(
                "unknown dimension kind '{other}'"
            ))),
        }
    }
}

/// Resolves the date display format of a locale.
pub trait DateFormatSource {
    fn date_format(&self, locale: &str) -> String;
}

impl<F> DateFormatSource for F
where
    F: Fn(&str) -> String,
{
    fn date_format(&self, locale: &str) -> String {
        self(locale)
    }
}

/// Pick the display format for `kind` given an already resolved date format.
///
/// ```
/// use time_domain_engine::format::{date_time_format, DimensionKind};
///
/// assert_eq!(date_time_format("DD/MM/YYYY", DimensionKind::Date), "DD/MM/YYYY");
/// assert_eq!(date_time_format("DD/MM/YYYY", DimensionKind::Time), "HH:mm:ss");
/// assert_eq!(date_time_format("DD/MM/YYYY", DimensionKind::DateTime), "DD/MM/YYYY HH:mm:ss");
/// ```
pub fn date_time_format(date_format: &str, kind: DimensionKind) -> String {
    match kind {
        DimensionKind::Date => date_format.to_string(),
        DimensionKind::Time => TIME_FORMAT.to_string(),
        DimensionKind::DateTime => format!("{date_format} {TIME_FORMAT}"),
    }
}

/// Like [`date_time_format`], asking `source` for the date format of `locale`.
/// The source is not consulted for time-only dimensions.
pub fn resolve_date_time_format(
    source: &impl DateFormatSource,
    locale: &str,
    kind: DimensionKind,
) -> String {
    match kind {
        DimensionKind::Time => TIME_FORMAT.to_string(),
        _ => date_time_format(&source.date_format(locale), kind),
    }
}

/// `YYYY-MM-DD` in UTC, or `None` if `value` is not a valid instant.
pub fn utc_date_part<'a>(value: impl Into<TimeValue<'a>>) -> Option<String> {
    let dt = coerce(value).valid()?.to_datetime()?;
    Some(dt.format("%Y-%m-%d").to_string())
}

/// `HH:MM:SS` in UTC, or `None` if `value` is not a valid instant.
pub fn utc_time_part<'a>(value: impl Into<TimeValue<'a>>) -> Option<String> {
    let dt = coerce(value).valid()?.to_datetime()?;
    Some(dt.format("%H:%M:%S").to_string())
}

/// The two instants as `(start, end)`, earliest first.
pub fn order_pair(a: Instant, b: Instant) -> (Instant, Instant) {
    if a >= b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Offset of `timezone` from UTC at `instant`, in milliseconds (east positive).
///
/// # Errors
///
/// Returns [`TimeDomainError::InvalidTimezone`] for an unknown IANA name, or
/// [`TimeDomainError::InvalidDatetime`] if the instant is out of range.
pub fn utc_offset_millis(instant: Instant, timezone: &str) -> Result<i64> {
    let tz = parse_timezone(timezone)?;
    let dt = instant.to_datetime().ok_or_else(|| {
        TimeDomainError::InvalidDatetime(format!("{} ms is out of range", instant.millis()))
    })?;
    let offset_secs = tz.offset_from_utc_datetime(&dt.naive_utc()).fix().local_minus_utc();
    Ok(i64::from(offset_secs) * 1_000)
}

fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| TimeDomainError::InvalidTimezone(format!("'{}'", s)))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::MILLIS_PER_HOUR;
    use crate::instant::parse_instant;
    use std::collections::HashMap;

    // ── format selection ────────────────────────────────────────────────

    #[test]
    fn test_format_by_kind() {
        assert_eq!(date_time_format("MM/DD/YYYY", DimensionKind::Date), "MM/DD/YYYY");
        assert_eq!(date_time_format("MM/DD/YYYY", DimensionKind::Time), TIME_FORMAT);
        assert_eq!(
            date_time_format("MM/DD/YYYY", DimensionKind::DateTime),
            "MM/DD/YYYY HH:mm:ss"
        );
    }

    #[test]
    fn test_resolve_with_closure_source() {
        let formats: HashMap<&str, &str> =
            [("it-IT", "DD/MM/YYYY"), ("en-US", "MM/DD/YYYY")].into_iter().collect();
        let source = |locale: &str| formats.get(locale).copied().unwrap_or("YYYY-MM-DD").to_string();

        assert_eq!(
            resolve_date_time_format(&source, "it-IT", DimensionKind::Date),
            "DD/MM/YYYY"
        );
        assert_eq!(
            resolve_date_time_format(&source, "de-DE", DimensionKind::DateTime),
            "YYYY-MM-DD HH:mm:ss"
        );
    }

    #[test]
    fn test_time_only_does_not_consult_source() {
        let source = |_: &str| -> String { panic!("date format requested for time-only dimension") };
        assert_eq!(
            resolve_date_time_format(&source, "en-US", DimensionKind::Time),
            TIME_FORMAT
        );
    }

    #[test]
    fn test_dimension_kind_parse_and_serde() {
        assert_eq!("date-time".parse::<DimensionKind>().unwrap(), DimensionKind::DateTime);
        let err = "datetime".parse::<DimensionKind>().unwrap_err();
        assert!(matches!(err, TimeDomainError::UnknownOption(_)), "got: {err}");
        let kind: DimensionKind = serde_json::from_str("\"time\"").unwrap();
        assert_eq!(kind, DimensionKind::Time);
        assert_eq!(DimensionKind::default(), DimensionKind::DateTime);
    }

    // ── UTC parts ───────────────────────────────────────────────────────

    #[test]
    fn test_utc_parts() {
        let value = "2020-03-05T07:08:09+02:00";
        assert_eq!(utc_date_part(value).as_deref(), Some("2020-03-05"));
        assert_eq!(utc_time_part(value).as_deref(), Some("05:08:09"));
    }

    #[test]
    fn test_utc_parts_cross_midnight() {
        let value = "2020-03-05T01:00:00+02:00";
        assert_eq!(utc_date_part(value).as_deref(), Some("2020-03-04"));
        assert_eq!(utc_time_part(value).as_deref(), Some("23:00:00"));
    }

    #[test]
    fn test_utc_parts_invalid() {
        assert_eq!(utc_date_part("nope"), None);
        assert_eq!(utc_time_part(""), None);
    }

    // ── order_pair ──────────────────────────────────────────────────────

    #[test]
    fn test_order_pair() {
        let early = Instant::from_millis(1);
        let late = Instant::from_millis(2);
        assert_eq!(order_pair(early, late), (early, late));
        assert_eq!(order_pair(late, early), (early, late));
        assert_eq!(order_pair(late, late), (late, late));
    }

    // ── utc_offset_millis ───────────────────────────────────────────────

    #[test]
    fn test_offset_changes_with_dst() {
        let winter = parse_instant("2020-01-15T12:00:00Z").unwrap();
        let summer = parse_instant("2020-07-15T12:00:00Z").unwrap();
        assert_eq!(utc_offset_millis(winter, "Europe/Rome").unwrap(), MILLIS_PER_HOUR);
        assert_eq!(utc_offset_millis(summer, "Europe/Rome").unwrap(), 2 * MILLIS_PER_HOUR);
        assert_eq!(
            utc_offset_millis(winter, "America/New_York").unwrap(),
            -5 * MILLIS_PER_HOUR
        );
    }

    #[test]
    fn test_offset_utc_is_zero() {
        assert_eq!(utc_offset_millis(Instant::from_millis(0), "UTC").unwrap(), 0);
    }

    #[test]
    fn test_offset_invalid_timezone() {
        let err = utc_offset_millis(Instant::from_millis(0), "Mars/Olympus").unwrap_err();
        assert!(err.to_string().contains("Invalid timezone"), "got: {err}");
    }
}
