//! Display resolution for a time range.

use serde::{Deserialize, Serialize};

use crate::duration::{round_resolution, to_iso_string};
use crate::error::{Result, TimeDomainError};
use crate::range::QueryRange;

/// A range that can be shown as a fixed number of buckets of width `resolution`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub range: QueryRange,
    /// ISO 8601 duration of one bucket, truncated to its largest unit.
    pub resolution: String,
}

/// Compute the bucket width that fits `max` times in `range`, rounded down to
/// its largest ISO 8601 unit.
///
/// The range is returned unchanged; aligning its bounds to the resolution is
/// left to the presentation layer. A reversed range (end before start) yields
/// a negative resolution.
///
/// # Errors
///
/// Returns [`TimeDomainError::InvalidRange`] if `range` is missing a bound,
/// `max` is zero, or one bucket would be wider than an `i64` millisecond count.
///
/// # Examples
///
/// ```
/// use time_domain_engine::instant::parse_instant;
/// use time_domain_engine::range::QueryRange;
/// use time_domain_engine::resolution::round_range_resolution;
///
/// let year = QueryRange::new(
///     parse_instant("2020-01-01T00:00:00Z").unwrap(),
///     parse_instant("2021-01-01T00:00:00Z").unwrap(),
/// );
/// // 366 days / 15 = 24 days 9 hours 36 minutes
/// assert_eq!(round_range_resolution(&year, 15).unwrap().resolution, "P24D");
/// ```
pub fn round_range_resolution(range: &QueryRange, max: u32) -> Result<Resolution> {
    let (start, end) = range.bounds().ok_or_else(|| {
        TimeDomainError::InvalidRange("resolution needs a bounded range".to_string())
    })?;
    if max == 0 {
        return Err(TimeDomainError::InvalidRange(
            "bucket count must be positive".to_string(),
        ));
    }

    let span = end.millis() as i128 - start.millis() as i128;
    let bucket_ms = i64::try_from(span.div_euclid(i128::from(max))).map_err(|_| {
        TimeDomainError::InvalidRange(format!("span of {span} ms over {max} buckets is out of range"))
    })?;
    let resolution = round_resolution(&to_iso_string(bucket_ms))?;

    Ok(Resolution {
        range: *range,
        resolution,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::{parse_instant, Instant};

    fn range(start: &str, end: &str) -> QueryRange {
        QueryRange::new(parse_instant(start).unwrap(), parse_instant(end).unwrap())
    }

    #[test]
    fn test_resolution_hours() {
        let r = range("2020-01-01T00:00:00Z", "2020-01-02T00:00:00Z");
        assert_eq!(round_range_resolution(&r, 24).unwrap().resolution, "PT1H");
        assert_eq!(round_range_resolution(&r, 10).unwrap().resolution, "PT2H");
    }

    #[test]
    fn test_resolution_days_drop_hours() {
        // 719 hours / 30 = 23h 58m
        let r = range("2020-01-01T00:00:00Z", "2020-01-30T23:00:00Z");
        assert_eq!(round_range_resolution(&r, 30).unwrap().resolution, "PT23H");
        // 575 hours / 1 = 23 days 23 hours
        let r = range("2020-01-01T00:00:00Z", "2020-01-24T23:00:00Z");
        assert_eq!(round_range_resolution(&r, 1).unwrap().resolution, "P23D");
    }

    #[test]
    fn test_resolution_sub_second() {
        let r = range("2020-01-01T00:00:00Z", "2020-01-01T00:00:01Z");
        assert_eq!(round_range_resolution(&r, 4).unwrap().resolution, "PT0.25S");
    }

    #[test]
    fn test_resolution_empty_range_is_zero() {
        let r = range("2020-01-01T00:00:00Z", "2020-01-01T00:00:00Z");
        assert_eq!(round_range_resolution(&r, 10).unwrap().resolution, "P0D");
    }

    #[test]
    fn test_resolution_keeps_range_untouched() {
        let r = range("2020-01-01T13:12:54Z", "2020-01-01T19:00:00Z");
        let resolution = round_range_resolution(&r, 5).unwrap();
        assert_eq!(resolution.range, r);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let r = range("2020-01-01T00:00:00Z", "2020-03-17T05:00:00Z");
        let first = round_range_resolution(&r, 7).unwrap();
        let second = round_range_resolution(&first.range, 7).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            crate::duration::round_resolution(&first.resolution).unwrap(),
            first.resolution
        );
    }

    #[test]
    fn test_resolution_requires_bounds() {
        let r = QueryRange {
            start: Some(Instant::from_millis(0)),
            end: None,
        };
        let err = round_range_resolution(&r, 10).unwrap_err();
        assert!(matches!(err, TimeDomainError::InvalidRange(_)), "got: {err}");
    }

    #[test]
    fn test_resolution_rejects_zero_buckets() {
        let r = range("2020-01-01T00:00:00Z", "2020-01-02T00:00:00Z");
        assert!(matches!(
            round_range_resolution(&r, 0).unwrap_err(),
            TimeDomainError::InvalidRange(_)
        ));
    }

    #[test]
    fn test_resolution_rejects_bucket_wider_than_i64() {
        let r = QueryRange::new(
            Instant::from_millis(i64::MIN / 2 - 10),
            Instant::from_millis(i64::MAX / 2 + 10),
        );
        let err = round_range_resolution(&r, 1).unwrap_err();
        assert!(matches!(err, TimeDomainError::InvalidRange(_)), "got: {err}");
        // Split over enough buckets the same span is fine.
        let resolution = round_range_resolution(&r, 4).unwrap().resolution;
        assert!(!resolution.starts_with('-'), "got: {resolution}");
    }

    #[test]
    fn test_resolution_reversed_range_is_negative() {
        let r = range("2020-01-02T00:00:00Z", "2020-01-01T00:00:00Z");
        assert_eq!(round_range_resolution(&r, 24).unwrap().resolution, "-PT1H");
    }
}
