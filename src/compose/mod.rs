//! Combining independently built networks.
//!
//! - [`union`] merges two networks, unifying points with equal ids
//! - [`compose`] chains two networks through caller-supplied [`Bridge`]s, never
//!   aliasing points implicitly
//! - [`partition`] splits a network into independent connected components
//! - [`solve_batch`] solves disjoint networks on a fixed-size worker pool
//!
//! Merges build a fresh network and solve it once. Inputs are only borrowed,
//! so a failed merge leaves nothing half-applied.

mod batch;
mod partition;

#[cfg(test)]
mod tests;

pub use batch::{solve_batch, solve_partitioned, BatchEntry, BatchError, BatchReport};
pub use partition::partition;

use crate::network::{Bounds, Stn, StnError};
use crate::time::{Epoch, Tick};
use crate::Id;

/// Explicit link from an exit point of the first network to an entry point of
/// the second: `entry - exit ∈ bounds`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bridge {
    pub exit: Id,
    pub entry: Id,
    pub bounds: Bounds,
}

impl Bridge {
    pub fn new(
        exit: impl Into<Id>,
        entry: impl Into<Id>,
        lower: Tick,
        upper: Tick,
    ) -> Result<Self, StnError> {
        Ok(Self {
            exit: exit.into(),
            entry: entry.into(),
            bounds: Bounds::new(lower, upper)?,
        })
    }

    /// `entry` at or after `exit`, with no upper limit on the gap.
    pub fn sequence(exit: impl Into<Id>, entry: impl Into<Id>) -> Self {
        Self {
            exit: exit.into(),
            entry: entry.into(),
            bounds: Bounds::at_least(0),
        }
    }
}

fn merged_epoch(a: &Stn, b: &Stn) -> Result<Option<Epoch>, StnError> {
    match (a.epoch(), b.epoch()) {
        (Some(x), Some(y)) if x != y => Err(StnError::EpochMismatch),
        (x, y) => Ok(x.or(y).copied()),
    }
}

/// Copies `source`'s points (skipping ids already present) and constraints
/// into `target`, matching points by id.
fn absorb(target: &mut Stn, source: &Stn) {
    for id in source.points().skip(1) {
        target.ensure_point(id);
    }
    for c in source.constraints() {
        let (from, to) = (target.ensure_point(&c.from), target.ensure_point(&c.to));
        target.insert_edge(from, to, c.bounds);
    }
}

fn solve_merged(mut merged: Stn, kind: &'static str) -> Result<Stn, StnError> {
    match merged.solve() {
        Ok(()) => {
            tracing::debug!(
                network = %merged.id(),
                points = merged.point_count(),
                kind,
                "merged network solved"
            );
            Ok(merged)
        }
        Err(e) => {
            tracing::warn!(kind, error = %e, "merge rejected");
            Err(e)
        }
    }
}

/// Merges two networks into a new, solved one.
///
/// Points with identical ids are the same point; all others coexist. The
/// origins coincide. Neither input is modified, whatever the outcome.
///
/// # Errors
///
/// `EpochMismatch` if both networks are anchored at different instants;
/// `Inconsistent` or `Timeout` from solving the merged constraint set.
pub fn union(a: &Stn, b: &Stn) -> Result<Stn, StnError> {
    let mut merged = Stn::empty_with(merged_epoch(a, b)?, *a.config());
    absorb(&mut merged, a);
    absorb(&mut merged, b);
    solve_merged(merged, "union")
}

/// Chains `second` after `first` through explicit bridging constraints.
///
/// Apart from the shared origin, the two networks must not have any point id
/// in common: matching names are never taken to mean the same point.
///
/// # Errors
///
/// - `IdCollision` if a non-origin id appears in both networks
/// - `UnknownPoint` if a bridge's exit is not in `first` or its entry not in `second`
/// - `EpochMismatch`, `Inconsistent`, `Timeout` as for [`union`]
pub fn compose(first: &Stn, second: &Stn, bridges: &[Bridge]) -> Result<Stn, StnError> {
    let epoch = merged_epoch(first, second)?;
    if let Some(id) = second.points().skip(1).find(|id| first.contains(id)) {
        return Err(StnError::IdCollision(id.to_string()));
    }
    for bridge in bridges {
        first.lookup(&bridge.exit)?;
        second.lookup(&bridge.entry)?;
    }

    let mut merged = Stn::empty_with(epoch, *first.config());
    absorb(&mut merged, first);
    absorb(&mut merged, second);
    for bridge in bridges {
        merged.add_bounds(&bridge.exit, &bridge.entry, bridge.bounds)?;
    }
    solve_merged(merged, "compose")
}
