//! Endpoint specifications accepted by `add_interval`.

use chrono::{DateTime, Utc};
use qtty::{Quantity, Second};

use crate::network::{Bounds, StnError};
use crate::time::{self, Epoch};
use crate::units::{convert, SameDim};

/// How one endpoint of an interval is pinned.
///
/// Seconds values are routed through
/// [`validate_precision`](crate::time::validate_precision); absolute instants
/// through the network's [`Epoch`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSpec {
    /// Fixed absolute instant.
    At(DateTime<Utc>),
    /// Fixed absolute instant given as an ISO-8601 / RFC 3339 string.
    Iso(String),
    /// Fixed offset from the origin, in seconds.
    Offset(f64),
    /// Offset window from the origin, in seconds; a missing side is open.
    Window {
        earliest: Option<f64>,
        latest: Option<f64>,
    },
    /// Duration after the interval's start, in seconds. End endpoint only.
    Duration { min: f64, max: Option<f64> },
    /// No constraint.
    Open,
}

/// What a spec resolves to on the tick lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// Bounds relative to the origin.
    Origin(Bounds),
    /// Bounds relative to the interval's start.
    Start(Bounds),
    Free,
}

impl TimeSpec {
    /// Fixed window `[earliest, latest]` seconds from the origin.
    pub fn window(earliest: f64, latest: f64) -> Self {
        Self::Window {
            earliest: Some(earliest),
            latest: Some(latest),
        }
    }

    /// Exact duration in seconds.
    pub fn duration(seconds: f64) -> Self {
        Self::Duration {
            min: seconds,
            max: Some(seconds),
        }
    }

    /// Fixed offset from the origin given as a time quantity in any unit.
    pub fn offset_of<U: SameDim<Second>>(offset: Quantity<U>) -> Self {
        Self::Offset(convert::<U, Second>(offset).value())
    }

    /// Exact duration given as a time quantity in any unit.
    pub fn duration_of<U: SameDim<Second>>(duration: Quantity<U>) -> Self {
        Self::duration(convert::<U, Second>(duration).value())
    }

    pub(crate) fn resolve(&self, epoch: Option<&Epoch>) -> Result<Anchor, StnError> {
        let anchor = match self {
            Self::At(at) => {
                let epoch = epoch.ok_or(StnError::NoEpoch)?;
                Anchor::Origin(Bounds::exact(epoch.timestamp_to_ticks(*at)?))
            }
            Self::Iso(iso) => {
                let epoch = epoch.ok_or(StnError::NoEpoch)?;
                Anchor::Origin(Bounds::exact(epoch.parse_timestamp(iso)?))
            }
            Self::Offset(seconds) => {
                Anchor::Origin(Bounds::exact(time::validate_precision(*seconds)?))
            }
            Self::Window {
                earliest: None,
                latest: None,
            } => Anchor::Free,
            Self::Window { earliest, latest } => {
                Anchor::Origin(bounds_from_seconds(*earliest, *latest)?)
            }
            Self::Duration { min, max } => Anchor::Start(bounds_from_seconds(Some(*min), *max)?),
            Self::Open => Anchor::Free,
        };
        Ok(anchor)
    }
}

fn bounds_from_seconds(lower: Option<f64>, upper: Option<f64>) -> Result<Bounds, StnError> {
    let lower = match lower {
        Some(s) => time::validate_precision(s)?,
        None => Bounds::NEG_INF,
    };
    let upper = match upper {
        Some(s) => time::validate_precision(s)?,
        None => Bounds::POS_INF,
    };
    Bounds::new(lower, upper)
}
