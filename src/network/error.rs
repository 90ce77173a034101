use std::fmt::Display;

use thiserror::Error;

use super::Bounds;
use crate::time::{Tick, TimeError};
use crate::Id;

/// Diagnostic for an inconsistent network: the edge whose bounds became empty
/// while tightening, together with the bound that contradicted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub from: Id,
    pub to: Id,
    /// Bounds held by `to - from` when the contradiction was found.
    pub current: Bounds,
    /// Bounds implied for `to - from` by another path (or another assertion).
    pub implied: Bounds,
}

impl Display for Witness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {} contradicts implied {}",
            self.from, self.to, self.current, self.implied
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StnError {
    #[error("Time point already exists: {0}")]
    DuplicateId(Id),

    #[error("Unknown time point: {0}")]
    UnknownPoint(Id),

    #[error("Invalid bounds: lower {lower} exceeds upper {upper}")]
    InvalidBounds { lower: Tick, upper: Tick },

    #[error("Network is inconsistent ({0})")]
    Inconsistent(Witness),

    #[error("Network has changed since the last solve")]
    Stale,

    #[error("Solve did not reach a fixpoint within its budget after {passes} passes")]
    Timeout { passes: usize },

    #[error("Bounds on {from} -> {to} leave the representable tick range")]
    Overflow { from: Id, to: Id },

    #[error("Network has no epoch anchor for absolute timestamps")]
    NoEpoch,

    #[error("Networks are anchored to different epochs")]
    EpochMismatch,

    #[error("Time point {0} exists in both networks")]
    IdCollision(Id),

    #[error("Interval {0} belongs to a different network")]
    ForeignInterval(Id),

    #[error("Invalid time spec: {0}")]
    InvalidSpec(&'static str),

    #[error(transparent)]
    Time(#[from] TimeError),
}
