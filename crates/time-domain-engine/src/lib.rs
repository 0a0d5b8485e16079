//! # time-domain-engine
//!
//! Temporal dimension arithmetic for time-indexed map layers.
//!
//! A layer declares its valid times either as an interval (a start, an end and
//! a repeating ISO 8601 duration) or as a list of dates. This crate reconciles
//! that declaration with what a client asks for: how many steps fall inside a
//! visible window, what resolution a window should be shown at, and which
//! available date is closest to a requested instant.
//!
//! Every function is pure and synchronous. Nothing reads the system clock,
//! global locale state or the network.
//!
//! ## Modules
//!
//! - [`duration`] — ISO 8601 duration ↔ milliseconds, truncation to the largest unit
//! - [`instant`] — Canonical millisecond instants and tolerant coercion of date inputs
//! - [`interval`] — `{start, end, duration}` → instant and bucket sequences
//! - [`range`] — Count and clip interval steps against a query window
//! - [`resolution`] — Bucket width for a window, rounded for display
//! - [`nearest`] — Nearest available date to a target, with interval snapping
//! - [`domain`] — Domain document adapter and serialized domain classification
//! - [`format`] — Display format selection, UTC parts, zone offsets
//! - [`error`] — Error types

pub mod domain;
pub mod duration;
pub mod error;
pub mod format;
pub mod instant;
pub mod interval;
pub mod nearest;
pub mod range;
pub mod resolution;

pub use domain::{
    dimensions_from_json, domains_to_dimensions, is_time_domain_interval, Dimension,
    DimensionSource, DomainValues, DomainsDocument,
};
pub use duration::{round_resolution, to_iso_string, to_milliseconds, IsoDuration};
pub use error::{Result, TimeDomainError};
pub use format::{
    date_time_format, order_pair, resolve_date_time_format, utc_date_part, utc_offset_millis,
    utc_time_part, DateFormatSource, DimensionKind,
};
pub use instant::{coerce, parse_instant, CoercedInstant, Instant, TimeValue};
pub use interval::{Bucket, Instants, Interval};
pub use nearest::{
    filter_date_list, get_dates_in_range, get_nearest_date, get_nearest_date_index, DateEntry,
    Endpoint, SnapPolicy,
};
pub use range::{analyze_interval_in_range, QueryRange, RangeAnalysis};
pub use resolution::{round_range_resolution, Resolution};
