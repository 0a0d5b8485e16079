//! ISO 8601 duration arithmetic.
//!
//! Converts duration strings such as `"PT1H"` or `"P1W2DT10H"` to a magnitude
//! in milliseconds and back, and truncates a duration to its largest unit for
//! presentation as a resolution.
//!
//! # Calendar units
//!
//! Years and months have no fixed length. They are converted through the
//! average Gregorian month (146097 days per 4800 months), rounded to whole
//! days, so `P1M` is 30 days and `P1Y` is 365 days. [`IsoDuration::from_milliseconds`]
//! never emits years, months or weeks: only days, hours, minutes and seconds
//! represent a millisecond magnitude exactly.
//!
//! # Functions
//!
//! - [`to_milliseconds`] — duration string → milliseconds
//! - [`to_iso_string`] — milliseconds → canonical duration string
//! - [`round_resolution`] — duration string → duration string with only its largest unit

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimeDomainError};

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

const DAYS_PER_400_YEARS: i128 = 146_097;
const MONTHS_PER_400_YEARS: i128 = 4_800;

const DATE_UNITS: [char; 4] = ['Y', 'M', 'W', 'D'];
const TIME_UNITS: [char; 3] = ['H', 'M', 'S'];

/// A parsed ISO 8601 duration (`[-]P[nY][nM][nW][nD][T[nH][nM][nS]]`).
///
/// Component values may be fractional (`PT1.5H`, `PT0,5S`). A component of
/// zero is indistinguishable from an absent one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoDuration {
    pub negative: bool,
    pub years: f64,
    pub months: f64,
    pub weeks: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl IsoDuration {
    /// Parse an ISO 8601 duration string.
    ///
    /// # Errors
    ///
    /// Returns [`TimeDomainError::InvalidDuration`] if the string does not match
    /// the grammar, or [`TimeDomainError::MalformedDuration`] if it has the
    /// `P`/`PT` designators but no unit component at all.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// The exact decomposition of a millisecond magnitude into days, hours,
    /// minutes and (possibly fractional) seconds.
    pub fn from_milliseconds(ms: i64) -> Self {
        let abs = ms.unsigned_abs();
        let day = MILLIS_PER_DAY as u64;
        let hour = MILLIS_PER_HOUR as u64;
        let minute = MILLIS_PER_MINUTE as u64;

        let days = abs / day;
        let remainder = abs % day;
        let hours = remainder / hour;
        let remainder = remainder % hour;
        let minutes = remainder / minute;
        let millis = remainder % minute;

        IsoDuration {
            negative: ms < 0,
            days: days as f64,
            hours: hours as f64,
            minutes: minutes as f64,
            seconds: millis as f64 / MILLIS_PER_SECOND as f64,
            ..Default::default()
        }
    }

    /// Magnitude in milliseconds, signed.
    ///
    /// Whole components are summed exactly in integer arithmetic; only
    /// fractional components go through `f64`, rounded once at the end.
    ///
    /// # Errors
    ///
    /// Returns [`TimeDomainError::InvalidDuration`] if the magnitude does not
    /// fit in an `i64` millisecond count.
    pub fn to_milliseconds(&self) -> Result<i64> {
        let overflow = || TimeDomainError::InvalidDuration(format!("'{self}' is out of range"));

        let calendar_ms = self
            .calendar_days()
            .and_then(|days| days.checked_mul(i128::from(MILLIS_PER_DAY)))
            .ok_or_else(overflow)?;

        let mut whole_ms = calendar_ms;
        let mut fraction_ms = 0.0_f64;
        for (value, unit_ms) in [
            (self.weeks, 7 * MILLIS_PER_DAY),
            (self.days, MILLIS_PER_DAY),
            (self.hours, MILLIS_PER_HOUR),
            (self.minutes, MILLIS_PER_MINUTE),
            (self.seconds, MILLIS_PER_SECOND),
        ] {
            match exact_integer(value) {
                Some(n) => {
                    whole_ms = n
                        .checked_mul(i128::from(unit_ms))
                        .and_then(|ms| whole_ms.checked_add(ms))
                        .ok_or_else(overflow)?;
                }
                None => fraction_ms += value * unit_ms as f64,
            }
        }

        let magnitude = exact_integer(fraction_ms.round())
            .and_then(|fraction| whole_ms.checked_add(fraction))
            .ok_or_else(overflow)?;
        let signed = if self.negative { -magnitude } else { magnitude };
        i64::try_from(signed).map_err(|_| overflow())
    }

    /// Years and months as whole days through the average Gregorian month.
    fn calendar_days(&self) -> Option<i128> {
        match (exact_integer(self.years), exact_integer(self.months)) {
            (Some(years), Some(months)) => {
                let months = years.checked_mul(12)?.checked_add(months)?;
                let scaled = months.checked_mul(DAYS_PER_400_YEARS)?;
                // Components are never negative, so this rounds half up like f64::round.
                Some((scaled + MONTHS_PER_400_YEARS / 2) / MONTHS_PER_400_YEARS)
            }
            _ => exact_integer(
                ((self.years * 12.0 + self.months) * DAYS_PER_400_YEARS as f64
                    / MONTHS_PER_400_YEARS as f64)
                    .round(),
            ),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.components().iter().all(|(_, value)| *value == 0.0)
    }

    /// Keep only the largest nonzero component, dropping everything smaller.
    ///
    /// `P23DT23H` becomes `P23D`, `PT20H10M2S` becomes `PT20H`. The kept
    /// component is not rounded, so `PT1.5H` stays `PT1.5H`. A zero duration
    /// is returned unchanged.
    pub fn truncate_to_largest_unit(&self) -> Self {
        let mut truncated = IsoDuration {
            negative: self.negative,
            ..Default::default()
        };
        if self.years != 0.0 {
            truncated.years = self.years;
        } else if self.months != 0.0 {
            truncated.months = self.months;
        } else if self.weeks != 0.0 {
            truncated.weeks = self.weeks;
        } else if self.days != 0.0 {
            truncated.days = self.days;
        } else if self.hours != 0.0 {
            truncated.hours = self.hours;
        } else if self.minutes != 0.0 {
            truncated.minutes = self.minutes;
        } else {
            truncated.seconds = self.seconds;
        }
        truncated
    }

    fn components(&self) -> [(&'static str, f64); 7] {
        [
            ("Y", self.years),
            ("M", self.months),
            ("W", self.weeks),
            ("D", self.days),
            ("H", self.hours),
            ("M", self.minutes),
            ("S", self.seconds),
        ]
    }
}

impl FromStr for IsoDuration {
    type Err = TimeDomainError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(TimeDomainError::InvalidDuration("empty duration".to_string()));
        }

        let (negative, rest) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };

        let body = rest.strip_prefix('P').ok_or_else(|| {
            TimeDomainError::InvalidDuration(format!("duration must start with 'P': '{raw}'"))
        })?;

        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };

        let date_components = parse_section(raw, date_part, &DATE_UNITS)?;
        let time_components = parse_section(raw, time_part.unwrap_or(""), &TIME_UNITS)?;

        if date_components.is_empty() && time_components.is_empty() {
            return Err(TimeDomainError::MalformedDuration(format!(
                "no unit component in '{raw}'"
            )));
        }
        if time_part.is_some() && time_components.is_empty() {
            return Err(TimeDomainError::InvalidDuration(format!(
                "'T' designator without time components in '{raw}'"
            )));
        }

        let mut parsed = IsoDuration {
            negative,
            ..Default::default()
        };
        for (unit, value) in date_components {
            match unit {
                'Y' => parsed.years = value,
                'M' => parsed.months = value,
                'W' => parsed.weeks = value,
                _ => parsed.days = value,
            }
        }
        for (unit, value) in time_components {
            match unit {
                'H' => parsed.hours = value,
                'M' => parsed.minutes = value,
                _ => parsed.seconds = value,
            }
        }
        Ok(parsed)
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative && !self.is_zero() {
            f.write_str("-")?;
        }
        f.write_str("P")?;

        let [years, months, weeks, days, hours, minutes, seconds] = self.components();
        let mut wrote_any = false;
        for (unit, value) in [years, months, weeks, days] {
            if value != 0.0 {
                write!(f, "{value}{unit}")?;
                wrote_any = true;
            }
        }
        if hours.1 != 0.0 || minutes.1 != 0.0 || seconds.1 != 0.0 {
            f.write_str("T")?;
            for (unit, value) in [hours, minutes, seconds] {
                if value != 0.0 {
                    write!(f, "{value}{unit}")?;
                }
            }
            wrote_any = true;
        }
        if !wrote_any {
            f.write_str("0D")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for IsoDuration {
    type Error = TimeDomainError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<IsoDuration> for String {
    fn from(value: IsoDuration) -> Self {
        value.to_string()
    }
}

/// Convert an ISO 8601 duration string to milliseconds.
///
/// # Errors
///
/// Returns [`TimeDomainError::InvalidDuration`] or
/// [`TimeDomainError::MalformedDuration`] if the string cannot be parsed, and
/// [`TimeDomainError::InvalidDuration`] if its magnitude overflows an `i64`.
///
/// # Examples
///
/// ```
/// use time_domain_engine::duration::to_milliseconds;
///
/// assert_eq!(to_milliseconds("PT1H30M").unwrap(), 5_400_000);
/// assert_eq!(to_milliseconds("P1W").unwrap(), 604_800_000);
/// ```
pub fn to_milliseconds(duration: &str) -> Result<i64> {
    IsoDuration::parse(duration)?.to_milliseconds()
}

/// Render a millisecond magnitude as a canonical ISO 8601 duration string.
///
/// The output uses days, hours, minutes and seconds (with up to three decimal
/// places), so `to_milliseconds(&to_iso_string(ms)) == ms` for every `ms`.
/// Zero renders as `"P0D"`.
///
/// ```
/// use time_domain_engine::duration::to_iso_string;
///
/// assert_eq!(to_iso_string(90_061_500), "P1DT1H1M1.5S");
/// ```
pub fn to_iso_string(ms: i64) -> String {
    IsoDuration::from_milliseconds(ms).to_string()
}

/// Truncate a duration string to its largest nonzero unit.
///
/// ```
/// use time_domain_engine::duration::round_resolution;
///
/// assert_eq!(round_resolution("P23DT23H").unwrap(), "P23D");
/// assert_eq!(round_resolution("PT20H10M2S").unwrap(), "PT20H");
/// ```
///
/// # Errors
///
/// Returns [`TimeDomainError::MalformedDuration`] if the input has no
/// recognizable unit component.
pub fn round_resolution(iso: &str) -> Result<String> {
    let parsed = IsoDuration::parse(iso).map_err(|e| match e {
        TimeDomainError::InvalidDuration(msg) => TimeDomainError::MalformedDuration(msg),
        other => other,
    })?;
    Ok(parsed.truncate_to_largest_unit().to_string())
}

/// Parse one designator section (`nYnMnWnD` or `nHnMnS`), enforcing unit order.
fn parse_section(raw: &str, section: &str, units: &[char]) -> Result<Vec<(char, f64)>> {
    let mut components = Vec::new();
    let mut num_buf = String::new();
    let mut next_unit = 0;

    for ch in section.chars() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            num_buf.push(if ch == ',' { '.' } else { ch });
            continue;
        }

        let position = units[next_unit..]
            .iter()
            .position(|&u| u == ch)
            .ok_or_else(|| {
                TimeDomainError::InvalidDuration(format!("unexpected '{ch}' in '{raw}'"))
            })?;
        if num_buf.is_empty() {
            return Err(TimeDomainError::InvalidDuration(format!(
                "expected number before '{ch}' in '{raw}'"
            )));
        }
        let value: f64 = num_buf.parse().map_err(|_| {
            TimeDomainError::InvalidDuration(format!("invalid number '{num_buf}' in '{raw}'"))
        })?;
        if !value.is_finite() {
            return Err(TimeDomainError::InvalidDuration(format!(
                "number out of range in '{raw}'"
            )));
        }
        num_buf.clear();

        let unit = units[next_unit + position];
        next_unit += position + 1;
        components.push((unit, value));
    }

    if !num_buf.is_empty() {
        return Err(TimeDomainError::InvalidDuration(format!(
            "number without unit at end of '{raw}'"
        )));
    }

    Ok(components)
}

/// `value` as an integer when it has no fractional part and fits comfortably in `i128`.
fn exact_integer(value: f64) -> Option<i128> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e36 {
        Some(value as i128)
    } else {
        None
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
