//! Nearest-date resolution over raw date lists.
//!
//! Domain documents describe available times as a list of strings, each
//! either a single date (`"2020-01-01"`) or an interval (`"2020-01-01/2020-02-01"`,
//! or the legacy `"2020-01-01--2020-02-01"`). A [`SnapPolicy`] projects
//! interval entries onto one of their endpoints before matching.
//!
//! Entries that do not coerce to a valid instant are never selected; they are
//! skipped rather than reported as errors.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::is_time_domain_interval;
use crate::error::{Result, TimeDomainError};
use crate::instant::{coerce, TimeValue};

/// Which endpoint of an interval entry to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Start,
    End,
}

impl FromStr for Endpoint {
    type Err = TimeDomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Endpoint::Start),
            "end" => Ok(Endpoint::End),
            other => Err(TimeDomainError::UnknownOption(format!(
                "unknown interval endpoint '{other}'"
            ))),
        }
    }
}

/// How interval entries are rewritten before nearest-date matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapPolicy {
    /// Match entries as they are.
    #[default]
    None,
    /// Replace every interval entry with its start.
    Start,
    /// Replace every interval entry with its end.
    End,
}

impl SnapPolicy {
    pub fn endpoint(self) -> Option<Endpoint> {
        match self {
            SnapPolicy::None => None,
            SnapPolicy::Start => Some(Endpoint::Start),
            SnapPolicy::End => Some(Endpoint::End),
        }
    }
}

impl From<Endpoint> for SnapPolicy {
    fn from(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Start => SnapPolicy::Start,
            Endpoint::End => SnapPolicy::End,
        }
    }
}

impl FromStr for SnapPolicy {
    type Err = TimeDomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "none" => Ok(SnapPolicy::None),
            other => other.parse::<Endpoint>().map(SnapPolicy::from),
        }
    }
}

/// A single raw date-list entry, split once into its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEntry<'a> {
    Single(&'a str),
    Interval { start: &'a str, end: &'a str },
}

impl<'a> DateEntry<'a> {
    /// Split `raw` on `/`, or on the legacy `--` separator when there is no `/`.
    ///
    /// Only the first two `/` components are kept, so a `start/end/period`
    /// triple reads as the interval `start/end`.
    pub fn parse(raw: &'a str) -> Self {
        let mut parts = raw.split('/');
        if let (Some(start), Some(end)) = (parts.next(), parts.next()) {
            return DateEntry::Interval { start, end };
        }
        if is_time_domain_interval(raw) {
            if let Some((start, end)) = raw.split_once("--") {
                return DateEntry::Interval { start, end };
            }
        }
        DateEntry::Single(raw)
    }

    /// The requested endpoint; a single date is its own start and end.
    pub fn endpoint(&self, endpoint: Endpoint) -> &'a str {
        match (*self, endpoint) {
            (DateEntry::Single(date), _) => date,
            (DateEntry::Interval { start, .. }, Endpoint::Start) => start,
            (DateEntry::Interval { end, .. }, Endpoint::End) => end,
        }
    }
}

/// Apply `snap` to every entry of `dates`; entries are borrowed, not copied.
pub fn filter_date_list<S: AsRef<str>>(dates: &[S], snap: SnapPolicy) -> Vec<&str> {
    dates
        .iter()
        .map(|raw| match snap.endpoint() {
            Some(endpoint) => DateEntry::parse(raw.as_ref()).endpoint(endpoint),
            None => raw.as_ref(),
        })
        .collect()
}

/// Index of the entry closest to `target`.
///
/// Ties keep the earliest entry. Returns `None` for an empty list, an invalid
/// target, or a list with no valid entries.
pub fn get_nearest_date_index<'t, S: AsRef<str>>(
    dates: &[S],
    target: impl Into<TimeValue<'t>>,
) -> Option<usize> {
    let Some(target) = coerce(target).valid() else {
        debug!("nearest-date target is not a valid instant");
        return None;
    };

    let mut best: Option<(usize, u64)> = None;
    for (index, raw) in dates.iter().enumerate() {
        let Some(candidate) = coerce(raw.as_ref()).valid() else {
            debug!(candidate = raw.as_ref(), "skipping date that is not a valid instant");
            continue;
        };
        let distance = candidate.distance(target);
        if best.map_or(true, |(_, nearest)| distance < nearest) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// The entry of `dates` closest to `target` after applying `snap`.
///
/// # Examples
///
/// ```
/// use time_domain_engine::nearest::{get_nearest_date, SnapPolicy};
///
/// let dates = ["2020-01-01", "2020-06-01", "2020-12-31"];
/// assert_eq!(
///     get_nearest_date(&dates, "2020-05-01", SnapPolicy::None).as_deref(),
///     Some("2020-06-01")
/// );
///
/// let intervals = ["2020-01-01/2020-02-01", "2020-06-01/2020-07-01"];
/// assert_eq!(
///     get_nearest_date(&intervals, "2020-01-15", SnapPolicy::Start).as_deref(),
///     Some("2020-01-01")
/// );
/// ```
pub fn get_nearest_date<'t, S: AsRef<str>>(
    dates: &[S],
    target: impl Into<TimeValue<'t>>,
    snap: SnapPolicy,
) -> Option<String> {
    let candidates = filter_date_list(dates, snap);
    let index = get_nearest_date_index(&candidates, target)?;
    candidates.get(index).map(|date| date.to_string())
}

/// The `endpoint` component of every entry that lies strictly after `reference`.
///
/// Order is preserved; nothing is sorted or deduplicated. An invalid
/// reference matches nothing.
///
/// ```
/// use time_domain_engine::nearest::{get_dates_in_range, Endpoint};
///
/// let intervals = ["2020-01-01/2020-02-01", "2020-03-01/2020-04-01"];
/// assert_eq!(
///     get_dates_in_range(&intervals, "2020-01-15", Endpoint::End),
///     ["2020-02-01", "2020-04-01"]
/// );
/// assert_eq!(
///     get_dates_in_range(&intervals, "2020-01-15", Endpoint::Start),
///     ["2020-03-01"]
/// );
/// ```
pub fn get_dates_in_range<'t, S: AsRef<str>>(
    dates: &[S],
    reference: impl Into<TimeValue<'t>>,
    endpoint: Endpoint,
) -> Vec<String> {
    let Some(reference) = coerce(reference).valid() else {
        debug!("date-range reference is not a valid instant");
        return Vec::new();
    };

    dates
        .iter()
        .map(|raw| DateEntry::parse(raw.as_ref()).endpoint(endpoint))
        .filter(|date| {
            coerce(*date)
                .valid()
                .is_some_and(|instant| instant > reference)
        })
        .map(str::to_string)
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::{parse_instant, Instant};

    // ── DateEntry ───────────────────────────────────────────────────────

    #[test]
    fn test_entry_single() {
        assert_eq!(DateEntry::parse("2020-01-01"), DateEntry::Single("2020-01-01"));
    }

    #[test]
    fn test_entry_slash_interval() {
        let entry = DateEntry::parse("2020-01-01/2020-02-01");
        assert_eq!(entry.endpoint(Endpoint::Start), "2020-01-01");
        assert_eq!(entry.endpoint(Endpoint::End), "2020-02-01");
    }

    #[test]
    fn test_entry_legacy_double_dash_interval() {
        let entry = DateEntry::parse("2020-01-01T00:00:00Z--2020-02-01T00:00:00Z");
        assert_eq!(
            entry,
            DateEntry::Interval {
                start: "2020-01-01T00:00:00Z",
                end: "2020-02-01T00:00:00Z",
            }
        );
    }

    #[test]
    fn test_entry_leading_double_dash_is_not_interval() {
        assert_eq!(DateEntry::parse("--01-15"), DateEntry::Single("--01-15"));
    }

    #[test]
    fn test_entry_period_triple_keeps_endpoints() {
        let entry = DateEntry::parse("2020-01-01/2020-02-01/P1D");
        assert_eq!(entry.endpoint(Endpoint::End), "2020-02-01");
    }

    // ── SnapPolicy ──────────────────────────────────────────────────────

    #[test]
    fn test_snap_policy_from_str() {
        assert_eq!("".parse::<SnapPolicy>().unwrap(), SnapPolicy::None);
        assert_eq!("none".parse::<SnapPolicy>().unwrap(), SnapPolicy::None);
        assert_eq!("start".parse::<SnapPolicy>().unwrap(), SnapPolicy::Start);
        assert_eq!("END".parse::<SnapPolicy>().unwrap(), SnapPolicy::End);
        let err = "middle".parse::<SnapPolicy>().unwrap_err();
        assert!(matches!(err, TimeDomainError::UnknownOption(_)), "got: {err}");
    }

    #[test]
    fn test_snap_policy_serde_lowercase() {
        assert_eq!(serde_json::to_string(&SnapPolicy::End).unwrap(), "\"end\"");
        let policy: SnapPolicy = serde_json::from_str("\"start\"").unwrap();
        assert_eq!(policy, SnapPolicy::Start);
    }

    #[test]
    fn test_filter_date_list() {
        let dates = ["2020-01-01/2020-02-01", "2020-03-01", "2020-04-01--2020-05-01"];
        assert_eq!(filter_date_list(&dates, SnapPolicy::None), dates);
        assert_eq!(
            filter_date_list(&dates, SnapPolicy::Start),
            ["2020-01-01", "2020-03-01", "2020-04-01"]
        );
        assert_eq!(
            filter_date_list(&dates, SnapPolicy::End),
            ["2020-02-01", "2020-03-01", "2020-05-01"]
        );
    }

    // ── get_nearest_date ────────────────────────────────────────────────

    #[test]
    fn test_nearest_plain_dates() {
        let dates = ["2020-01-01", "2020-06-01", "2020-12-31"];
        assert_eq!(
            get_nearest_date(&dates, "2020-05-01", SnapPolicy::None),
            Some("2020-06-01".to_string())
        );
    }

    #[test]
    fn test_nearest_snap_start() {
        let dates = ["2020-01-01/2020-02-01", "2020-06-01/2020-07-01"];
        assert_eq!(
            get_nearest_date(&dates, "2020-01-15", SnapPolicy::Start),
            Some("2020-01-01".to_string())
        );
    }

    #[test]
    fn test_nearest_snap_end() {
        let dates = ["2020-01-01/2020-02-01", "2020-06-01/2020-07-01"];
        assert_eq!(
            get_nearest_date(&dates, "2020-06-20", SnapPolicy::End),
            Some("2020-07-01".to_string())
        );
    }

    #[test]
    fn test_nearest_snap_legacy_entries() {
        let dates = ["2020-01-01--2020-02-01", "2020-06-01--2020-07-01"];
        assert_eq!(
            get_nearest_date(&dates, "2020-02-10", SnapPolicy::End),
            Some("2020-02-01".to_string())
        );
    }

    #[test]
    fn test_nearest_unsnapped_intervals_are_never_selected() {
        let dates = ["2020-01-01/2020-02-01", "2021-01-01"];
        assert_eq!(
            get_nearest_date(&dates, "2020-01-01", SnapPolicy::None),
            Some("2021-01-01".to_string())
        );
    }

    #[test]
    fn test_nearest_tie_keeps_first() {
        let dates = ["2020-01-01", "2020-01-03"];
        assert_eq!(
            get_nearest_date(&dates, "2020-01-02", SnapPolicy::None),
            Some("2020-01-01".to_string())
        );
    }

    #[test]
    fn test_nearest_empty_list() {
        let dates: [&str; 0] = [];
        assert_eq!(get_nearest_date(&dates, "2020-01-01", SnapPolicy::None), None);
    }

    #[test]
    fn test_nearest_skips_invalid_candidates() {
        let dates = ["garbage", "", "2020-03-01"];
        assert_eq!(get_nearest_date_index(&dates, "2020-01-01"), Some(2));
    }

    #[test]
    fn test_nearest_all_invalid() {
        let dates = ["garbage", ""];
        assert_eq!(get_nearest_date_index(&dates, "2020-01-01"), None);
    }

    #[test]
    fn test_nearest_invalid_target() {
        let dates = ["2020-01-01"];
        assert_eq!(get_nearest_date(&dates, "soon", SnapPolicy::None), None);
        assert_eq!(get_nearest_date(&dates, "", SnapPolicy::None), None);
    }

    #[test]
    fn test_nearest_accepts_instant_target() {
        let dates = vec!["2020-01-01".to_string(), "2020-06-01".to_string()];
        let target = parse_instant("2020-05-20").unwrap();
        assert_eq!(get_nearest_date_index(&dates, target), Some(1));
        assert_eq!(get_nearest_date_index(&dates, target.millis()), Some(1));
    }

    // ── get_dates_in_range ──────────────────────────────────────────────

    #[test]
    fn test_dates_in_range_end() {
        let dates = ["2020-01-01/2020-02-01", "2020-03-01/2020-04-01"];
        assert_eq!(
            get_dates_in_range(&dates, "2020-01-15", Endpoint::End),
            ["2020-02-01", "2020-04-01"]
        );
    }

    #[test]
    fn test_dates_in_range_is_strict() {
        let dates = ["2020-01-01/2020-02-01", "2020-03-01/2020-04-01"];
        assert_eq!(
            get_dates_in_range(&dates, "2020-03-01", Endpoint::Start),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_dates_in_range_keeps_order_and_duplicates() {
        let dates = [
            "2020-05-01/2020-06-01",
            "2020-03-01/2020-06-01",
            "2020-03-01/2020-04-01",
        ];
        assert_eq!(
            get_dates_in_range(&dates, "2020-01-01", Endpoint::End),
            ["2020-06-01", "2020-06-01", "2020-04-01"]
        );
    }

    #[test]
    fn test_dates_in_range_single_dates() {
        let dates = ["2020-02-01", "2019-12-01"];
        assert_eq!(
            get_dates_in_range(&dates, "2020-01-01", Endpoint::End),
            ["2020-02-01"]
        );
    }

    #[test]
    fn test_dates_in_range_invalid_reference() {
        let dates = ["2020-01-01/2020-02-01"];
        assert!(get_dates_in_range(&dates, "whenever", Endpoint::End).is_empty());
    }

    #[test]
    fn test_dates_in_range_skips_invalid_endpoints() {
        let dates = ["2020-01-01/oops", "2020-01-01/2020-03-01"];
        assert_eq!(
            get_dates_in_range(&dates, Instant::from_millis(0), Endpoint::End),
            ["2020-03-01"]
        );
    }
}
