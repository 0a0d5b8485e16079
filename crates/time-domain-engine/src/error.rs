//! Error types for time-domain-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeDomainError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Malformed duration: {0}")]
    MalformedDuration(String),

    #[error("Zero duration: {0}")]
    ZeroDuration(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

pub type Result<T> = std::result::Result<T, TimeDomainError>;
