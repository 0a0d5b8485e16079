//! Interval sequencing: `{start, end, duration}` → equally spaced instants.
//!
//! An [`Interval`] describes the instants `start, start + d, start + 2d, ...`
//! up to and including the last one that is `<= end`. Sequences are computed
//! fresh on every call and are always finite: a zero or negative step is
//! rejected with [`TimeDomainError::ZeroDuration`] before any iteration starts.

use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::duration::IsoDuration;
use crate::error::{Result, TimeDomainError};
use crate::instant::{parse_instant, Instant};

/// A repeating time-step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: Instant,
    pub end: Instant,
    pub duration: IsoDuration,
}

/// One full-width step of an interval, `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub start: Instant,
    pub end: Instant,
}

impl Interval {
    pub fn new(start: Instant, end: Instant, duration: IsoDuration) -> Self {
        Interval {
            start,
            end,
            duration,
        }
    }

    /// Parse the `start/end/period` form used by domain documents, e.g.
    /// `"2017-03-11T17:43:50.000Z/2017-07-28T17:25:52.000Z/PT1S"`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeDomainError::InvalidDatetime`] if the string does not have
    /// exactly three `/`-separated parts or an endpoint cannot be parsed, or a
    /// duration error if the period is not an ISO 8601 duration.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let [start, end, period] = parts.as_slice() else {
            return Err(TimeDomainError::InvalidDatetime(format!(
                "'{}': expected 'start/end/period'",
                s.trim()
            )));
        };
        Ok(Interval {
            start: parse_instant(start)?,
            end: parse_instant(end)?,
            duration: IsoDuration::parse(period)?,
        })
    }

    /// The step width in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimeDomainError::ZeroDuration`] if the step is not strictly
    /// positive; such an interval would repeat forever. A step too large for
    /// an `i64` millisecond count is [`TimeDomainError::InvalidDuration`].
    pub fn step_millis(&self) -> Result<i64> {
        let step = self.duration.to_milliseconds()?;
        if step <= 0 {
            return Err(TimeDomainError::ZeroDuration(format!(
                "step '{}' must be positive",
                self.duration
            )));
        }
        Ok(step)
    }

    /// Number of whole steps between `start` and `end`:
    /// `floor((end - start) / duration)`.
    ///
    /// An interval whose end precedes its start has no steps and yields 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use time_domain_engine::interval::Interval;
    ///
    /// let day = Interval::parse("2020-01-01T00:00:00Z/2020-01-02T00:00:00Z/PT1H").unwrap();
    /// assert_eq!(day.count_steps().unwrap(), 24);
    /// ```
    pub fn count_steps(&self) -> Result<i64> {
        let step = self.step_millis()?;
        Ok(steps_between(self.start, self.end, step))
    }

    /// Iterate the instants `start, start + d, ...` that are `<= end`.
    ///
    /// The iterator holds no shared state; call again to restart.
    pub fn instants(&self) -> Result<Instants> {
        let step = self.step_millis()?;
        let remaining = if self.start <= self.end {
            steps_between(self.start, self.end, step) as u64 + 1
        } else {
            debug!(start = %self.start, end = %self.end, "interval end precedes start");
            0
        };
        Ok(Instants {
            next: Some(self.start),
            step,
            remaining,
        })
    }

    /// Materialize the full instant sequence, `count_steps() + 1` entries long.
    ///
    /// # Examples
    ///
    /// ```
    /// use time_domain_engine::interval::Interval;
    ///
    /// let interval = Interval::parse("2020-01-01T00:00:00Z/2020-01-01T00:00:10Z/PT4S").unwrap();
    /// let sequence: Vec<String> = interval
    ///     .generate_sequence()
    ///     .unwrap()
    ///     .iter()
    ///     .map(ToString::to_string)
    ///     .collect();
    /// assert_eq!(
    ///     sequence,
    ///     [
    ///         "2020-01-01T00:00:00.000Z",
    ///         "2020-01-01T00:00:04.000Z",
    ///         "2020-01-01T00:00:08.000Z",
    ///     ]
    /// );
    /// ```
    pub fn generate_sequence(&self) -> Result<Vec<Instant>> {
        Ok(self.instants()?.collect())
    }

    /// The sequence rendered as ISO 8601 strings.
    pub fn to_iso_sequence(&self) -> Result<Vec<String>> {
        Ok(self.instants()?.map(|instant| instant.to_string()).collect())
    }

    /// Pair every instant `s` of the sequence with `s + duration`.
    ///
    /// The last bucket may end after `self.end`: every bucket is a full step wide.
    pub fn generate_interval_sequence(&self) -> Result<Vec<Bucket>> {
        let step = self.step_millis()?;
        Ok(self
            .instants()?
            .map(|start| Bucket {
                start,
                end: Instant::from_millis(start.millis().saturating_add(step)),
            })
            .collect())
    }
}

impl FromStr for Interval {
    type Err = TimeDomainError;

    fn from_str(s: &str) -> Result<Self> {
        Interval::parse(s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.start, self.end, self.duration)
    }
}

/// Lazy, exact-size iterator over the instants of an [`Interval`].
#[derive(Debug, Clone)]
pub struct Instants {
    next: Option<Instant>,
    step: i64,
    remaining: u64,
}

impl Iterator for Instants {
    type Item = Instant;

    fn next(&mut self) -> Option<Instant> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = current.checked_add_millis(self.step);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Instants {}

impl FusedIterator for Instants {}

/// `floor((to - from) / step)` clamped to `[0, i64::MAX]`; `step` must be positive.
pub(crate) fn steps_between(from: Instant, to: Instant, step: i64) -> i64 {
    let span = to.millis() as i128 - from.millis() as i128;
    if span < 0 {
        return 0;
    }
    i64::try_from(span / step as i128).unwrap_or(i64::MAX)
}

// ── Tests ───────────────────────────────────────────────────────────────────
