//! Absolute-time anchor for ISO-8601 timestamps.

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use super::{TimeError, Tick};

const NANOS_PER_TICK: i64 = 1_000_000;
/// `PRECISION_TOLERANCE` expressed in nanoseconds.
const MAX_RESIDUAL_NANOS: i64 = 100_000;

/// Instant that tick `0` corresponds to.
///
/// A network fixes its epoch once, at creation, and never changes it: moving
/// the anchor would silently shift every absolute bound already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epoch(DateTime<Utc>);

impl Epoch {
    pub const fn new(anchor: DateTime<Utc>) -> Self {
        Self(anchor)
    }

    /// Parses the anchor from an RFC 3339 / ISO-8601 string.
    pub fn parse(iso: &str) -> Result<Self, TimeError> {
        parse_iso(iso).map(Self)
    }

    pub const fn anchor(&self) -> DateTime<Utc> {
        self.0
    }

    /// Ticks elapsed between the anchor and `at` (negative if `at` precedes it).
    ///
    /// # Errors
    ///
    /// - `SubTickTimestamp` if `at` is more than 1e-4 s away from a tick boundary
    /// - `OutOfRange` if the offset overflows the tick range
    pub fn timestamp_to_ticks(&self, at: DateTime<Utc>) -> Result<Tick, TimeError> {
        let delta = at.signed_duration_since(self.0);
        let nanos = i64::from(delta.subsec_nanos());

        let floor = nanos.div_euclid(NANOS_PER_TICK);
        let rem = nanos.rem_euclid(NANOS_PER_TICK);
        if rem.min(NANOS_PER_TICK - rem) > MAX_RESIDUAL_NANOS {
            return Err(TimeError::SubTickTimestamp(format_instant(at)));
        }
        let millis = if rem * 2 >= NANOS_PER_TICK {
            floor + 1
        } else {
            floor
        };

        delta
            .num_seconds()
            .checked_mul(1_000)
            .and_then(|ms| ms.checked_add(millis))
            .ok_or(TimeError::OutOfRange(delta.num_seconds() as f64))
    }

    /// Parses an ISO-8601 timestamp and converts it to ticks since the anchor.
    pub fn parse_timestamp(&self, iso: &str) -> Result<Tick, TimeError> {
        self.timestamp_to_ticks(parse_iso(iso)?)
    }

    pub fn ticks_to_timestamp(&self, ticks: Tick) -> Result<DateTime<Utc>, TimeError> {
        TimeDelta::try_milliseconds(ticks)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .ok_or(TimeError::OutOfRange(super::ticks_to_seconds(ticks)))
    }

    /// Formats `ticks` as an RFC 3339 timestamp with millisecond precision.
    pub fn format_ticks(&self, ticks: Tick) -> Result<String, TimeError> {
        self.ticks_to_timestamp(ticks).map(format_instant)
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_instant(self.0))
    }
}

fn parse_iso(iso: &str) -> Result<DateTime<Utc>, TimeError> {
    DateTime::parse_from_rfc3339(iso)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TimeError::InvalidTimestamp(iso.to_string()))
}

fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> Epoch {
        Epoch::parse("2024-03-01T00:00:00Z").unwrap()
    }

    #[test]
    fn test_anchor_maps_to_zero() {
        assert_eq!(epoch().parse_timestamp("2024-03-01T00:00:00Z"), Ok(0));
    }

    #[test]
    fn test_parse_timestamp_offsets() {
        let e = epoch();
        assert_eq!(e.parse_timestamp("2024-03-01T00:00:01.250Z"), Ok(1_250));
        assert_eq!(e.parse_timestamp("2024-03-01T01:00:00+01:00"), Ok(0));
        assert_eq!(e.parse_timestamp("2024-02-29T23:59:59Z"), Ok(-1_000));
    }

    #[test]
    fn test_negative_fractional_offset() {
        assert_eq!(epoch().parse_timestamp("2024-02-29T23:59:59.750Z"), Ok(-250));
    }

    #[test]
    fn test_sub_tick_timestamp_rejected() {
        let result = epoch().parse_timestamp("2024-03-01T00:00:00.0005Z");
        assert!(matches!(result, Err(TimeError::SubTickTimestamp(_))));
    }

    #[test]
    fn test_near_tick_timestamp_rounds() {
        assert_eq!(epoch().parse_timestamp("2024-03-01T00:00:00.00105Z"), Ok(1));
    }

    #[test]
    fn test_invalid_timestamp() {
        let result = epoch().parse_timestamp("not a time");
        assert_eq!(
            result,
            Err(TimeError::InvalidTimestamp("not a time".to_string()))
        );
    }

    #[test]
    fn test_format_round_trip() {
        let e = epoch();
        let ticks = e.parse_timestamp("2024-03-01T12:30:15.125Z").unwrap();
        assert_eq!(e.format_ticks(ticks).unwrap(), "2024-03-01T12:30:15.125Z");
    }

    #[test]
    fn test_display() {
        assert_eq!(epoch().to_string(), "2024-03-01T00:00:00.000Z");
    }
}
