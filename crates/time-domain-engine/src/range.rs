//! Counting and clipping interval steps against a query range.
//!
//! [`analyze_interval_in_range`] answers "how many steps of this interval fall
//! in the visible window, and which sub-range do they cover?". It is a
//! containment test on step indices rather than full interval clipping: when
//! the window is unbounded, lies outside the interval, or straddles either of
//! its ends, the whole interval is reported instead. The result never names a
//! negative count or an instant outside the interval.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::instant::Instant;
use crate::interval::{steps_between, Interval};

/// A query window. A missing bound means the window is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    #[serde(default)]
    pub start: Option<Instant>,
    #[serde(default)]
    pub end: Option<Instant>,
}

impl QueryRange {
    pub fn new(start: Instant, end: Instant) -> Self {
        QueryRange {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn unbounded() -> Self {
        QueryRange::default()
    }

    /// Both bounds, when the range is bounded on both sides.
    pub fn bounds(&self) -> Option<(Instant, Instant)> {
        Some((self.start?, self.end?))
    }
}

/// Steps of an interval that fall within a query range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAnalysis {
    pub start: Instant,
    pub end: Instant,
    pub count: i64,
}

impl RangeAnalysis {
    fn whole(interval: &Interval) -> Result<Self> {
        Ok(RangeAnalysis {
            start: interval.start,
            end: interval.end,
            count: interval.count_steps()?,
        })
    }
}

/// Count the steps of `interval` inside `range` and clip to the covered sub-range.
///
/// With step indices relative to `interval.start` and step width `d`:
///
/// - `x1 = ceil((range.start - interval.start) / d)`, the first step in range
/// - `x2 = floor((range.end - interval.start) / d)`, the last step in range
/// - `mx = floor((interval.end - interval.start) / d)`, the last valid step
///
/// When `0 <= x1 <= x2 <= mx` the result is
/// `{start: interval.start + x1·d, end: interval.start + x2·d, count: x2 - x1}`.
/// Otherwise (unbounded range, no step inside it, or a range reaching past
/// either end of the interval) the whole interval is reported with
/// `count = interval.count_steps()`.
///
/// # Errors
///
/// Returns [`crate::TimeDomainError::ZeroDuration`] if the interval step is not positive.
///
/// # Examples
///
/// ```
/// use time_domain_engine::instant::parse_instant;
/// use time_domain_engine::interval::Interval;
/// use time_domain_engine::range::{analyze_interval_in_range, QueryRange};
///
/// let day = Interval::parse("2020-01-01T00:00:00Z/2020-01-02T00:00:00Z/PT1H").unwrap();
/// let morning = QueryRange::new(
///     parse_instant("2020-01-01T06:00:00Z").unwrap(),
///     parse_instant("2020-01-01T12:00:00Z").unwrap(),
/// );
///
/// let analysis = analyze_interval_in_range(&day, &morning).unwrap();
/// assert_eq!(analysis.count, 6);
/// assert_eq!(analysis.start.to_string(), "2020-01-01T06:00:00.000Z");
/// assert_eq!(analysis.end.to_string(), "2020-01-01T12:00:00.000Z");
/// ```
pub fn analyze_interval_in_range(interval: &Interval, range: &QueryRange) -> Result<RangeAnalysis> {
    let step = interval.step_millis()?;

    let Some((range_start, range_end)) = range.bounds() else {
        return RangeAnalysis::whole(interval);
    };

    let origin = interval.start.millis() as i128;
    let d = step as i128;
    let x1 = ceil_div(range_start.millis() as i128 - origin, d);
    let x2 = (range_end.millis() as i128 - origin).div_euclid(d);
    let mx = if interval.end < interval.start {
        -1
    } else {
        steps_between(interval.start, interval.end, step) as i128
    };

    if 0 <= x1 && x1 <= x2 && x2 <= mx {
        // Bounded by mx, so every product below fits within the interval.
        let start = Instant::from_millis((origin + x1 * d) as i64);
        let end = Instant::from_millis((origin + x2 * d) as i64);
        return Ok(RangeAnalysis {
            start,
            end,
            count: (x2 - x1) as i64,
        });
    }

    debug!(
        interval = %interval,
        first_step = %x1,
        last_step = %x2,
        max_step = %mx,
        "range not contained in interval, reporting whole interval"
    );
    RangeAnalysis::whole(interval)
}

fn ceil_div(numerator: i128, denominator: i128) -> i128 {
    -(-numerator).div_euclid(denominator)
}

// ── Tests ───────────────────────────────────────────────────────────────────
