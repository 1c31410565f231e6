//! Core domain errors.

use thiserror::Error;

/// Errors raised while reading wall-clock labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// Not in `H:MM` / `HH:MM` form.
    #[error("malformed clock time: {0:?}")]
    Malformed(String),

    /// Well-formed but outside 00:00..=23:59.
    #[error("clock time out of range: {0:?}")]
    OutOfRange(String),

    /// Unknown IANA timezone name.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The clock-label pattern failed to compile.
    #[error("clock pattern: {0}")]
    Pattern(String),
}
