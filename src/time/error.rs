use thiserror::Error;

/// Errors raised while mapping continuous time onto the tick lattice.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimeError {
    #[error("Converting {seconds}s to ticks loses precision (round-trips to {round_trip}s)")]
    PrecisionLoss { seconds: f64, round_trip: f64 },

    #[error("Time value must be finite, got {0}")]
    NonFinite(f64),

    #[error("Time value {0}s is outside the representable tick range")]
    OutOfRange(f64),

    #[error("Invalid ISO-8601 timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Timestamp {0} carries sub-millisecond detail that ticks cannot represent")]
    SubTickTimestamp(String),
}
