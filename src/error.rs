//! Error type for the boundaries of the gesture pipeline.
//!
//! Steady-state tracking never errors; these cover rejected ticks and
//! malformed configuration or trace input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GestureError {
    /// Tick timestamps must strictly increase.
    #[error("non-monotonic clock: tick at {now:.4}s after {previous:.4}s")]
    NonMonotonicClock { previous: f64, now: f64 },

    #[error("non-finite tick time: {0}")]
    NonFiniteTime(f64),

    #[error("invalid configuration: {key} = {value} ({reason})")]
    InvalidConfig {
        key: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("unknown joint: {0}")]
    UnknownJoint(String),

    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    #[error("malformed s-expression: {0}")]
    Sexp(String),
}
