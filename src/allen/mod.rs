//! Allen's interval algebra on top of the STN.
//!
//! Each of the 13 relations is encoded as a small set of difference
//! constraints over the four endpoints `As, Ae, Bs, Be`. Strict orderings
//! mean "at least one tick apart" on the integer lattice. The same encoding
//! drives both directions: asserting a relation adds its constraints, and
//! classifying a solved pair checks which encodings the bounds still admit.

mod relation_set;

pub use relation_set::RelationSet;

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::interval::Interval;
use crate::network::solver::{self, Limits, Matrix};
use crate::network::{Bounds, Constraint, Stn, StnError};
use crate::time::Tick;

/// The 13 mutually exclusive qualitative relations between intervals `A` and `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AllenRelation {
    Before,
    After,
    Meets,
    MetBy,
    Overlaps,
    OverlappedBy,
    During,
    Contains,
    Starts,
    StartedBy,
    Finishes,
    FinishedBy,
    Equals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    AStart = 0,
    AEnd = 1,
    BStart = 2,
    BEnd = 3,
}

/// One difference constraint `to - from ∈ bounds` of a relation's encoding.
#[derive(Debug, Clone, Copy)]
struct Atom {
    from: Endpoint,
    to: Endpoint,
    bounds: Bounds,
}

const fn atom(from: Endpoint, to: Endpoint, bounds: Bounds) -> Atom {
    Atom { from, to, bounds }
}

/// `to` strictly after `from`.
const PRECEDES: Bounds = Bounds::at_least(1);
/// `to` coincides with `from`.
const SAME: Bounds = Bounds::exact(0);

use Endpoint::*;

const BEFORE: &[Atom] = &[atom(AEnd, BStart, PRECEDES)];
const AFTER: &[Atom] = &[atom(BEnd, AStart, PRECEDES)];
const MEETS: &[Atom] = &[atom(AEnd, BStart, SAME)];
const MET_BY: &[Atom] = &[atom(BEnd, AStart, SAME)];
const OVERLAPS: &[Atom] = &[
    atom(AStart, BStart, PRECEDES),
    atom(BStart, AEnd, PRECEDES),
    atom(AEnd, BEnd, PRECEDES),
];
const OVERLAPPED_BY: &[Atom] = &[
    atom(BStart, AStart, PRECEDES),
    atom(AStart, BEnd, PRECEDES),
    atom(BEnd, AEnd, PRECEDES),
];
const DURING: &[Atom] = &[atom(BStart, AStart, PRECEDES), atom(AEnd, BEnd, PRECEDES)];
const CONTAINS: &[Atom] = &[atom(AStart, BStart, PRECEDES), atom(BEnd, AEnd, PRECEDES)];
const STARTS: &[Atom] = &[atom(AStart, BStart, SAME), atom(AEnd, BEnd, PRECEDES)];
const STARTED_BY: &[Atom] = &[atom(AStart, BStart, SAME), atom(BEnd, AEnd, PRECEDES)];
const FINISHES: &[Atom] = &[atom(AEnd, BEnd, SAME), atom(BStart, AStart, PRECEDES)];
const FINISHED_BY: &[Atom] = &[atom(AEnd, BEnd, SAME), atom(AStart, BStart, PRECEDES)];
const EQUALS: &[Atom] = &[atom(AStart, BStart, SAME), atom(AEnd, BEnd, SAME)];

impl AllenRelation {
    pub const ALL: [AllenRelation; 13] = [
        Self::Before,
        Self::After,
        Self::Meets,
        Self::MetBy,
        Self::Overlaps,
        Self::OverlappedBy,
        Self::During,
        Self::Contains,
        Self::Starts,
        Self::StartedBy,
        Self::Finishes,
        Self::FinishedBy,
        Self::Equals,
    ];

    /// The converse relation: `r(A, B)` ⇔ `r.inverse()(B, A)`.
    pub const fn inverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            Self::Meets => Self::MetBy,
            Self::MetBy => Self::Meets,
            Self::Overlaps => Self::OverlappedBy,
            Self::OverlappedBy => Self::Overlaps,
            Self::During => Self::Contains,
            Self::Contains => Self::During,
            Self::Starts => Self::StartedBy,
            Self::StartedBy => Self::Starts,
            Self::Finishes => Self::FinishedBy,
            Self::FinishedBy => Self::Finishes,
            Self::Equals => Self::Equals,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Meets => "meets",
            Self::MetBy => "met-by",
            Self::Overlaps => "overlaps",
            Self::OverlappedBy => "overlapped-by",
            Self::During => "during",
            Self::Contains => "contains",
            Self::Starts => "starts",
            Self::StartedBy => "started-by",
            Self::Finishes => "finishes",
            Self::FinishedBy => "finished-by",
            Self::Equals => "equals",
        }
    }

    const fn atoms(self) -> &'static [Atom] {
        match self {
            Self::Before => BEFORE,
            Self::After => AFTER,
            Self::Meets => MEETS,
            Self::MetBy => MET_BY,
            Self::Overlaps => OVERLAPS,
            Self::OverlappedBy => OVERLAPPED_BY,
            Self::During => DURING,
            Self::Contains => CONTAINS,
            Self::Starts => STARTS,
            Self::StartedBy => STARTED_BY,
            Self::Finishes => FINISHES,
            Self::FinishedBy => FINISHED_BY,
            Self::Equals => EQUALS,
        }
    }

    /// STN constraints asserting `self(a, b)`.
    pub fn constraints(self, a: &Interval, b: &Interval) -> Vec<Constraint> {
        let ids = [a.start(), a.end(), b.start(), b.end()];
        self.atoms()
            .iter()
            .map(|at| {
                Constraint::with_bounds(ids[at.from as usize], ids[at.to as usize], at.bounds)
            })
            .collect()
    }

    /// Whether `self(a, b)` holds for concrete `(start, end)` tick pairs.
    pub fn holds(self, a: (Tick, Tick), b: (Tick, Tick)) -> bool {
        let values = [a.0, a.1, b.0, b.1];
        self.atoms().iter().all(|at| {
            values[at.to as usize]
                .checked_sub(values[at.from as usize])
                .is_some_and(|d| at.bounds.contains(d))
        })
    }

    /// The relation between two concrete intervals.
    ///
    /// Exactly one relation holds when both intervals have positive duration;
    /// degenerate (instant) intervals may match none.
    pub fn classify_fixed(a: (Tick, Tick), b: (Tick, Tick)) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.holds(a, b))
    }
}

impl Display for AllenRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown Allen relation: {0}")]
pub struct ParseRelationError(String);

impl FromStr for AllenRelation {
    type Err = ParseRelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|r| r.name() == normalized)
            .ok_or_else(|| ParseRelationError(s.to_string()))
    }
}

impl Stn {
    /// Asserts `relation(a, b)` by adding its constraints.
    ///
    /// # Errors
    ///
    /// `ForeignInterval` if either interval belongs to another network. Nothing
    /// is added on error.
    pub fn relate(
        &mut self,
        a: &Interval,
        relation: AllenRelation,
        b: &Interval,
    ) -> Result<(), StnError> {
        a.check_owner(self)?;
        b.check_owner(self)?;
        let edges = relation
            .constraints(a, b)
            .into_iter()
            .map(|c| Ok((self.lookup(&c.from)?, self.lookup(&c.to)?, c.bounds)))
            .collect::<Result<Vec<_>, StnError>>()?;
        for (from, to, bounds) in edges {
            self.insert_edge(from, to, bounds);
        }
        Ok(())
    }
}

/// Relations between `a` and `b` still consistent with the solved network.
///
/// The minimal network projected onto the four endpoints is exact, so for each
/// relation a four-point PC-2 run over that projection plus the relation's
/// constraints decides whether some schedule realises it.
///
/// # Errors
///
/// `ForeignInterval`, `Stale` (network changed since its last solve), or
/// `Inconsistent`.
pub fn allen_relation(stn: &Stn, a: &Interval, b: &Interval) -> Result<RelationSet, StnError> {
    a.check_owner(stn)?;
    b.check_owner(stn)?;
    let minimal = stn.minimal()?;

    let mut points = [0usize; 4];
    for (slot, id) in points.iter_mut().zip([a.start(), a.end(), b.start(), b.end()]) {
        *slot = stn
            .point(id)
            .ok_or_else(|| StnError::UnknownPoint(id.to_string()))?
            .index();
    }

    let mut projection = Matrix::new(4);
    for i in 0..4 {
        for j in 0..4 {
            if i != j && projection.restrict(i, j, minimal.get(points[i], points[j])).is_err() {
                return Ok(RelationSet::empty());
            }
        }
    }

    let limits = Limits {
        max_passes: stn.config().max_passes,
        deadline: None,
    };
    let relations = AllenRelation::ALL
        .into_iter()
        .filter(|r| {
            let mut m = projection.clone();
            r.atoms()
                .iter()
                .all(|at| m.restrict(at.from as usize, at.to as usize, at.bounds).is_ok())
                && solver::path_consistency(&mut m, limits).is_ok()
        })
        .collect();
    Ok(relations)
}
