//! Adapter for multidimensional-extension domain documents.
//!
//! A `GetDomain` response (the JSON rendering of its XML) looks like:
//!
//! ```json
//! {
//!   "Domains": {
//!     "@version": "1.1",
//!     "DimensionDomain": [
//!       { "Identifier": "time", "Domain": "2016-02-23T00:00:00.000Z--2016-02-25T00:00:00.000Z" }
//!     ],
//!     "SpaceDomain": { "BoundingBox": { "CRS": "EPSG:4326", "minx": -180.0 } }
//!   }
//! }
//! ```
//!
//! [`domains_to_dimensions`] flattens it into one [`Dimension`] per entry, plus
//! a `space` dimension for the bounding box. Missing fields default to empty
//! values; a document that does not have this shape yields no dimensions.
//!
//! Serialized time values are classified once by [`DomainValues::parse`] so
//! the core never re-splits strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TimeDomainError};
use crate::instant::{coerce, parse_instant, Instant};
use crate::interval::Interval;

/// `source.type` of every dimension produced by this adapter.
pub const MULTIDIM_EXTENSION: &str = "multidim-extension";

/// Identifier given to the dimension built from `SpaceDomain.BoundingBox`.
pub const SPACE_DIMENSION: &str = "space";

const LEGACY_INTERVAL_SEPARATOR: &str = "--";

/// The raw domain document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainsDocument {
    #[serde(rename = "Domains", default)]
    pub domains: Option<Domains>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domains {
    #[serde(rename = "DimensionDomain", default)]
    pub dimension_domain: OneOrMany<DimensionDomain>,
    #[serde(rename = "SpaceDomain", default)]
    pub space_domain: Option<SpaceDomain>,
    #[serde(rename = "@version", default)]
    pub attribute_version: Option<Value>,
    #[serde(default)]
    pub version: Option<Value>,
}

impl Domains {
    /// `@version` when present, otherwise `version`. Numbers are rendered as text.
    pub fn version(&self) -> Option<String> {
        self.attribute_version
            .as_ref()
            .or(self.version.as_ref())
            .and_then(|value| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// XML-to-JSON converters emit a lone element as an object, several as an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T: Clone> OneOrMany<T> {
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item.clone()],
            OneOrMany::Many(items) => items.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionDomain {
    #[serde(rename = "Identifier", default)]
    pub identifier: Option<String>,
    #[serde(rename = "Domain", default)]
    pub domain: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceDomain {
    #[serde(rename = "BoundingBox", default)]
    pub bounding_box: Option<Value>,
}

/// Where a dimension description came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: Option<String>,
    pub url: Option<String>,
}

/// One normalized layer dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub source: DimensionSource,
    pub name: Option<String>,
    pub domain: Value,
}

impl Dimension {
    /// Classify the domain when it is a serialized string; `Ok(None)` otherwise
    /// (for instance the bounding box of the `space` dimension).
    pub fn domain_values(&self) -> Result<Option<DomainValues>> {
        self.domain.as_str().map(DomainValues::parse).transpose()
    }
}

/// Flatten a domain document into dimensions tagged with `url`.
pub fn domains_to_dimensions(document: &DomainsDocument, url: Option<&str>) -> Vec<Dimension> {
    let Some(domains) = &document.domains else {
        return Vec::new();
    };

    let source = DimensionSource {
        kind: MULTIDIM_EXTENSION.to_string(),
        version: domains.version(),
        url: url.map(str::to_string),
    };

    let mut entries = domains.dimension_domain.to_vec();
    if let Some(bbox) = domains
        .space_domain
        .as_ref()
        .and_then(|space| space.bounding_box.clone())
    {
        entries.push(DimensionDomain {
            identifier: Some(SPACE_DIMENSION.to_string()),
            domain: bbox,
        });
    }

    entries
        .into_iter()
        .map(|entry| Dimension {
            source: source.clone(),
            name: entry.identifier,
            domain: entry.domain,
        })
        .collect()
}

/// Parse a JSON domain document and flatten it. Malformed input yields no dimensions.
pub fn dimensions_from_json(json: &str, url: Option<&str>) -> Vec<Dimension> {
    match serde_json::from_str::<DomainsDocument>(json) {
        Ok(document) => domains_to_dimensions(&document, url),
        Err(e) => {
            debug!(error = %e, "ignoring malformed domain document");
            Vec::new()
        }
    }
}

/// Whether a serialized domain value uses the legacy `start--end` form.
///
/// The separator must not be the first thing in the string, so the ISO 8601
/// reduced form `--MM-DD` is not mistaken for an interval.
pub fn is_time_domain_interval(values: &str) -> bool {
    matches!(values.find(LEGACY_INTERVAL_SEPARATOR), Some(index) if index > 0)
}

/// A serialized time domain, classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DomainValues {
    /// `start/end/period`.
    Interval(Interval),
    /// Legacy `start--end`.
    Range { start: Instant, end: Instant },
    /// Comma-separated dates or `start/end` entries, kept raw.
    List { values: Vec<String> },
}

impl DomainValues {
    /// # Errors
    ///
    /// Returns a datetime or duration error when the value looks like an
    /// interval or a range but its parts do not parse. Lists are never
    /// rejected; invalid entries are simply never matched later.
    pub fn parse(values: &str) -> Result<Self> {
        let trimmed = values.trim();

        if !trimmed.contains(',') {
            if trimmed.split('/').count() == 3 {
                return Interval::parse(trimmed).map(DomainValues::Interval);
            }
            if is_time_domain_interval(trimmed) {
                let (start, end) = trimmed
                    .split_once(LEGACY_INTERVAL_SEPARATOR)
                    .ok_or_else(|| {
                        TimeDomainError::InvalidDatetime(format!("'{trimmed}': expected 'start--end'"))
                    })?;
                return Ok(DomainValues::Range {
                    start: parse_instant(start)?,
                    end: parse_instant(end)?,
                });
            }
        }

        Ok(DomainValues::List {
            values: trimmed
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    /// Earliest and latest instant covered.
    ///
    /// For lists, `start/end` entries contribute both endpoints and entries
    /// that are not valid dates are ignored; `None` if nothing is valid.
    pub fn bounds(&self) -> Option<(Instant, Instant)> {
        match self {
            DomainValues::Interval(interval) => Some((interval.start, interval.end)),
            DomainValues::Range { start, end } => Some((*start, *end)),
            DomainValues::List { values } => values
                .iter()
                .flat_map(|value| value.split('/').take(2))
                .filter_map(|date| coerce(date).valid())
                .fold(None, |acc, instant| match acc {
                    None => Some((instant, instant)),
                    Some((lo, hi)) => Some((lo.min(instant), hi.max(instant))),
                }),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
