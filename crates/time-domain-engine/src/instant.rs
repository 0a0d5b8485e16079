//! Canonical instants and coercion from heterogeneous date inputs.
//!
//! Every point in time handled by the engine is an [`Instant`]: milliseconds
//! since the Unix epoch, possibly negative. Inputs arrive as ISO 8601 strings,
//! `chrono` datetimes, or raw epoch milliseconds; [`coerce`] maps all three to
//! the same instant for the same real time.
//!
//! Coercion never fails. Empty input becomes [`CoercedInstant::Null`] and
//! unparseable strings become [`CoercedInstant::Invalid`]; neither takes part
//! in comparisons. Use [`parse_instant`] at boundaries where garbage must be
//! rejected instead of absorbed.
//!
//! Datetimes without an offset (`2020-01-01T06:00`) and partial dates
//! (`2020-01-01`, `2020-01`, `2020`) are read as UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimeDomainError};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"];

/// A point in time as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instant(i64);

impl Instant {
    pub const fn from_millis(ms: i64) -> Self {
        Instant(ms)
    }

    pub const fn millis(self) -> i64 {
        self.0
    }

    /// `None` when the instant lies outside the range `chrono` can represent.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    pub fn checked_add_millis(self, ms: i64) -> Option<Self> {
        self.0.checked_add(ms).map(Instant)
    }

    /// Absolute distance to `other` in milliseconds.
    pub fn distance(self, other: Instant) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Instant {
    fn from(dt: DateTime<Tz>) -> Self {
        Instant(dt.timestamp_millis())
    }
}

impl fmt::Display for Instant {
    /// ISO 8601 with millisecond precision in UTC, e.g. `2020-01-01T00:00:00.000Z`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl FromStr for Instant {
    type Err = TimeDomainError;

    /// Accepts everything [`parse_instant`] does, plus the `<n>ms` form that
    /// `Display` writes for instants outside `chrono`'s range.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().strip_suffix("ms").map(str::parse::<i64>) {
            Some(Ok(ms)) => Ok(Instant(ms)),
            _ => parse_instant(s),
        }
    }
}

impl TryFrom<String> for Instant {
    type Error = TimeDomainError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Instant> for String {
    fn from(value: Instant) -> Self {
        value.to_string()
    }
}

/// One of the accepted external representations of a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeValue<'a> {
    /// An ISO 8601 date or datetime string.
    Text(&'a str),
    /// A native datetime.
    Date(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    Epoch(i64),
}

impl<'a> From<&'a str> for TimeValue<'a> {
    fn from(value: &'a str) -> Self {
        TimeValue::Text(value)
    }
}

impl<'a> From<&'a String> for TimeValue<'a> {
    fn from(value: &'a String) -> Self {
        TimeValue::Text(value.as_str())
    }
}

impl From<DateTime<Utc>> for TimeValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        TimeValue::Date(value)
    }
}

impl From<i64> for TimeValue<'_> {
    fn from(value: i64) -> Self {
        TimeValue::Epoch(value)
    }
}

impl From<Instant> for TimeValue<'_> {
    fn from(value: Instant) -> Self {
        TimeValue::Epoch(value.millis())
    }
}

/// The outcome of [`coerce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercedInstant {
    /// Empty input.
    Null,
    /// A string that is not a recognizable ISO 8601 date.
    Invalid,
    Valid(Instant),
}

impl CoercedInstant {
    /// The instant, if coercion produced one that may be compared.
    pub fn valid(self) -> Option<Instant> {
        match self {
            CoercedInstant::Valid(instant) => Some(instant),
            CoercedInstant::Null | CoercedInstant::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, CoercedInstant::Valid(_))
    }
}

/// Normalize a date representation to a canonical [`Instant`].
///
/// # Examples
///
/// ```
/// use time_domain_engine::instant::{coerce, CoercedInstant, Instant};
///
/// let from_text = coerce("2020-01-01T00:00:00Z");
/// let from_epoch = coerce(1_577_836_800_000_i64);
/// assert_eq!(from_text, from_epoch);
/// assert_eq!(from_text, CoercedInstant::Valid(Instant::from_millis(1_577_836_800_000)));
///
/// assert_eq!(coerce(""), CoercedInstant::Null);
/// assert_eq!(coerce("not a date"), CoercedInstant::Invalid);
/// ```
pub fn coerce<'a>(value: impl Into<TimeValue<'a>>) -> CoercedInstant {
    match value.into() {
        TimeValue::Text(s) if s.trim().is_empty() => CoercedInstant::Null,
        TimeValue::Text(s) => match parse_instant(s) {
            Ok(instant) => CoercedInstant::Valid(instant),
            Err(_) => CoercedInstant::Invalid,
        },
        TimeValue::Date(dt) => CoercedInstant::Valid(Instant::from(dt)),
        TimeValue::Epoch(ms) => CoercedInstant::Valid(Instant::from_millis(ms)),
    }
}

/// Strictly parse an ISO 8601 date or datetime string.
///
/// Accepts RFC 3339 datetimes, datetimes with a `Z` or numeric offset, with or
/// without seconds and fractional seconds, offset-less datetimes (read as UTC),
/// and the reduced-precision dates `YYYY-MM-DD`, `YYYY-MM` and `YYYY`.
///
/// # Errors
///
/// Returns [`TimeDomainError::InvalidDatetime`] if none of the accepted forms match.
pub fn parse_instant(s: &str) -> Result<Instant> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Instant::from(dt));
    }

    if let Some(naive) = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .and_then(parse_naive_datetime)
    {
        return Ok(Instant::from(Utc.from_utc_datetime(&naive)));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(Instant::from(dt));
        }
    }

    if let Some(naive) = parse_naive_datetime(trimmed) {
        return Ok(Instant::from(Utc.from_utc_datetime(&naive)));
    }

    parse_reduced_date(trimmed)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Instant::from(Utc.from_utc_datetime(&naive)))
        .ok_or_else(|| {
            TimeDomainError::InvalidDatetime(format!("'{}': not an ISO 8601 date", trimmed))
        })
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
fn parse_reduced_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = s.split('-');
    let year_str = parts.next()?;
    if year_str.len() != 4 || !year_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) if m.len() == 2 => m.parse().ok()?,
        Some(_) => return None,
        None => 1,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}

// ── Tests ───────────────────────────────────────────────────────────────────
