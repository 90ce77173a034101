//! Continuous time ⇄ tick conversion.
//!
//! Every bound inside a network is an integer number of milliseconds
//! ([`Tick`]). User-facing time (seconds as `f64`, `qtty` quantities, ISO-8601
//! timestamps) is mapped onto that lattice here, and nowhere else, so
//! constraint arithmetic never accumulates floating-point drift.

mod epoch;
mod error;

pub use epoch::Epoch;
pub use error::TimeError;

/// Smallest internally addressed time unit: one millisecond.
pub type Tick = i64;

/// Number of ticks in one second.
pub const TICKS_PER_SECOND: f64 = 1_000.0;

/// Largest admissible gap between a seconds value and its tick round-trip.
pub const PRECISION_TOLERANCE: f64 = 1e-4;

/// Converts seconds to the nearest tick.
///
/// Out-of-range values saturate at the `i64` limits and `NaN` maps to `0`
/// (Rust's float-to-int cast semantics); use [`validate_precision`] when the
/// input is untrusted.
pub fn seconds_to_ticks(seconds: f64) -> Tick {
    (seconds * TICKS_PER_SECOND).round() as Tick
}

pub fn ticks_to_seconds(ticks: Tick) -> f64 {
    ticks as f64 / TICKS_PER_SECOND
}

/// Converts `seconds` to ticks, failing if the conversion is lossy.
///
/// # Errors
///
/// - `NonFinite` for `NaN` or infinite input
/// - `OutOfRange` if the tick count does not fit in an `i64`
/// - `PrecisionLoss` if `|ticks_to_seconds(ticks) - seconds| > 1e-4`
pub fn validate_precision(seconds: f64) -> Result<Tick, TimeError> {
    if !seconds.is_finite() {
        return Err(TimeError::NonFinite(seconds));
    }

    let scaled = (seconds * TICKS_PER_SECOND).round();
    // i64::MAX as f64 rounds up to 2^63, so the upper check must be exclusive.
    if scaled >= i64::MAX as f64 || scaled < i64::MIN as f64 {
        return Err(TimeError::OutOfRange(seconds));
    }

    let ticks = scaled as Tick;
    let round_trip = ticks_to_seconds(ticks);
    if (round_trip - seconds).abs() > PRECISION_TOLERANCE {
        return Err(TimeError::PrecisionLoss {
            seconds,
            round_trip,
        });
    }
    Ok(ticks)
}
