//! Graph primitives: time point handles and difference constraints.

use super::{Bounds, StnError};
use crate::time::{Epoch, Tick};
use crate::Id;

/// Index handle of a time point inside the network that created it.
///
/// Handles are only meaningful for their own network; two networks may hand
/// out the same index for unrelated points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(pub(crate) usize);

impl TimePoint {
    /// Handle of the origin, the first point of every network.
    pub const ORIGIN: TimePoint = TimePoint(0);

    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Directed edge meaning `to - from ∈ bounds`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    pub from: Id,
    pub to: Id,
    pub bounds: Bounds,
}

impl Constraint {
    /// # Errors
    ///
    /// Returns `InvalidBounds` if `lower > upper`.
    pub fn new(
        from: impl Into<Id>,
        to: impl Into<Id>,
        lower: Tick,
        upper: Tick,
    ) -> Result<Self, StnError> {
        Ok(Self::with_bounds(from, to, Bounds::new(lower, upper)?))
    }

    pub fn with_bounds(from: impl Into<Id>, to: impl Into<Id>, bounds: Bounds) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            bounds,
        }
    }

    /// The same restriction expressed on the reversed edge.
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            bounds: self.bounds.inverse(),
        }
    }
}

/// Flat, order-preserving dump of a network's asserted state.
///
/// This is the persistence boundary: callers store it however they like and
/// rebuild with [`Stn::from_edge_list`](super::Stn::from_edge_list), then
/// re-solve. Solved bounds are deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeList {
    pub epoch: Option<Epoch>,
    /// Point ids in creation order, excluding the origin.
    pub points: Vec<Id>,
    pub constraints: Vec<Constraint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_new_validates_bounds() {
        assert!(Constraint::new("a", "b", 0, 10).is_ok());
        assert_eq!(
            Constraint::new("a", "b", 10, 0),
            Err(StnError::InvalidBounds {
                lower: 10,
                upper: 0
            })
        );
    }

    #[test]
    fn reversed_inverts_bounds() {
        let c = Constraint::new("a", "b", 2, 5).unwrap();
        let r = c.reversed();
        assert_eq!(r.from, "b");
        assert_eq!(r.to, "a");
        assert_eq!(r.bounds, Bounds::new(-5, -2).unwrap());
    }
}
