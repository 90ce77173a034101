//! Simple Temporal Network with incremental construction and PC-2 solving.

mod bounds;
mod constraint;
mod error;
pub(crate) mod solver;


pub use bounds::Bounds;
pub use constraint::{Constraint, EdgeList, TimePoint};
pub use error::{StnError, Witness};

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::time::Instant;

use crate::config::SolverConfig;
use crate::time::{Epoch, Tick};
use crate::Id;
use solver::{Failure, Limits, Matrix};

/// Solve status of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    /// Mutated since the last successful solve; bound queries are stale.
    Unsolved,
    /// Minimal network cached; bound queries are answered from it.
    Solved,
    /// Terminal until a constraint is removed and the network re-solved.
    Inconsistent,
}

#[derive(Debug, Clone)]
enum Status {
    Unsolved,
    Solved(Matrix),
    Inconsistent(Witness),
}

/// Simple Temporal Network.
///
/// Time points live in an arena owned by the network and are addressed by
/// string id (or by [`TimePoint`] index handle). Constraints are kept as a
/// sparse map keyed by ordered point pair; a successful [`solve`](Self::solve)
/// caches the dense minimal network used by bound queries.
///
/// # Invariants
///
/// - Point `0` is the origin ([`Stn::ORIGIN`]); `earliest`/`latest` are relative to it
/// - Every stored edge was asserted with `lower <= upper`; repeated assertions on the
///   same ordered pair are intersected
/// - Any mutation discards the cached minimal network
/// - An inconsistent network stays inconsistent until a constraint is removed
///
/// # Example
///
/// ```
/// use tempora::network::Stn;
///
/// let mut stn = Stn::new();
/// stn.add_time_point("wake").unwrap();
/// stn.add_time_point("leave").unwrap();
/// stn.add_constraint(Stn::ORIGIN, "wake", 0, 1_000).unwrap();
/// stn.add_constraint("wake", "leave", 3_000, 5_000).unwrap();
///
/// stn.solve().unwrap();
/// assert_eq!(stn.earliest("leave").unwrap(), 3_000);
/// assert_eq!(stn.latest("leave").unwrap(), 6_000);
/// ```
#[derive(Debug, Clone)]
pub struct Stn {
    id: Id,
    epoch: Option<Epoch>,
    config: SolverConfig,
    names: Vec<Id>,
    index: HashMap<Id, TimePoint>,
    edges: BTreeMap<(TimePoint, TimePoint), Bounds>,
    status: Status,
}

impl Default for Stn {
    fn default() -> Self {
        Self::new()
    }
}

impl Stn {
    /// Id of the distinguished zero point every network starts with.
    pub const ORIGIN: &'static str = "@origin";

    /// Creates an empty network holding only the origin. It is trivially solved.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates an empty network whose origin sits at `epoch`.
    ///
    /// The anchor is fixed for the network's lifetime.
    pub fn with_epoch(epoch: Epoch) -> Self {
        Self::build(Some(epoch))
    }

    fn build(epoch: Option<Epoch>) -> Self {
        let origin: Id = Self::ORIGIN.to_string();
        Self {
            id: crate::generate_id(),
            epoch,
            config: SolverConfig::default(),
            names: vec![origin.clone()],
            index: HashMap::from([(origin, TimePoint::ORIGIN)]),
            edges: BTreeMap::new(),
            status: Status::Solved(Matrix::new(1)),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// An empty network sharing this one's epoch and solver config.
    pub(crate) fn empty_like(&self) -> Self {
        Self::empty_with(self.epoch, self.config)
    }

    pub(crate) fn empty_with(epoch: Option<Epoch>, config: SolverConfig) -> Self {
        Self::build(epoch).with_config(config)
    }

    /// Unique identity of this network instance.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn epoch(&self) -> Option<&Epoch> {
        self.epoch.as_ref()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> SolveState {
        match self.status {
            Status::Unsolved => SolveState::Unsolved,
            Status::Solved(_) => SolveState::Solved,
            Status::Inconsistent(_) => SolveState::Inconsistent,
        }
    }

    /// The witness recorded by the last failed solve, if the network is inconsistent.
    pub fn witness(&self) -> Option<&Witness> {
        match &self.status {
            Status::Inconsistent(w) => Some(w),
            _ => None,
        }
    }

    /// Number of time points, origin included.
    pub fn point_count(&self) -> usize {
        self.names.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn point(&self, id: &str) -> Option<TimePoint> {
        self.index.get(id).copied()
    }

    pub fn name_of(&self, point: TimePoint) -> Option<&str> {
        self.names.get(point.0).map(|s| s.as_str())
    }

    /// Point ids in creation order, origin first.
    pub fn points(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    /// Asserted constraints in `(from, to)` index order.
    pub fn constraints(&self) -> impl Iterator<Item = Constraint> + '_ {
        self.edges.iter().map(|(&(from, to), &bounds)| {
            Constraint::with_bounds(self.names[from.0].clone(), self.names[to.0].clone(), bounds)
        })
    }

    pub(crate) fn edges(&self) -> impl Iterator<Item = (TimePoint, TimePoint, Bounds)> + '_ {
        self.edges.iter().map(|(&(from, to), &b)| (from, to, b))
    }

    pub(crate) fn lookup(&self, id: &str) -> Result<TimePoint, StnError> {
        self.point(id)
            .ok_or_else(|| StnError::UnknownPoint(id.to_string()))
    }

    fn invalidate(&mut self) {
        if !matches!(self.status, Status::Inconsistent(_)) {
            self.status = Status::Unsolved;
        }
    }

    /// Adds a time point.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a point with this id already exists (the origin included).
    pub fn add_time_point(&mut self, id: impl Into<Id>) -> Result<TimePoint, StnError> {
        let id: Id = id.into();
        if self.index.contains_key(&id) {
            return Err(StnError::DuplicateId(id));
        }
        let point = TimePoint(self.names.len());
        self.names.push(id.clone());
        self.index.insert(id, point);
        self.invalidate();
        Ok(point)
    }

    /// Handle of `id`, adding the point first if it does not exist yet.
    pub(crate) fn ensure_point(&mut self, id: &str) -> TimePoint {
        if let Some(point) = self.point(id) {
            return point;
        }
        let point = TimePoint(self.names.len());
        self.names.push(id.to_string());
        self.index.insert(id.to_string(), point);
        self.invalidate();
        point
    }

    /// Asserts `to - from ∈ [lower, upper]` (ticks).
    ///
    /// If the ordered pair is already constrained the bounds are intersected with
    /// the existing ones. An empty intersection is stored as-is and reported by
    /// the next [`solve`](Self::solve).
    ///
    /// # Errors
    ///
    /// - `InvalidBounds` if `lower > upper`
    /// - `UnknownPoint` if either endpoint does not exist
    ///
    /// The network is unchanged on error.
    pub fn add_constraint(
        &mut self,
        from: &str,
        to: &str,
        lower: Tick,
        upper: Tick,
    ) -> Result<(), StnError> {
        let bounds = Bounds::new(lower, upper)?;
        self.add_bounds(from, to, bounds)
    }

    /// Like [`add_constraint`](Self::add_constraint) with prebuilt bounds.
    pub fn add_bounds(&mut self, from: &str, to: &str, bounds: Bounds) -> Result<(), StnError> {
        if bounds.is_empty() {
            return Err(StnError::InvalidBounds {
                lower: bounds.lower(),
                upper: bounds.upper(),
            });
        }
        let from = self.lookup(from)?;
        let to = self.lookup(to)?;
        self.insert_edge(from, to, bounds);
        Ok(())
    }

    pub(crate) fn insert_edge(&mut self, from: TimePoint, to: TimePoint, bounds: Bounds) {
        self.edges
            .entry((from, to))
            .and_modify(|b| *b = b.intersect(bounds))
            .or_insert(bounds);
        self.invalidate();
    }

    /// Removes the constraint on the ordered pair `(from, to)`, returning its bounds.
    ///
    /// Removing a constraint is the repair path out of [`SolveState::Inconsistent`]:
    /// the network becomes unsolved and the next `solve` starts afresh.
    pub fn remove_constraint(&mut self, from: &str, to: &str) -> Result<Option<Bounds>, StnError> {
        let key = (self.lookup(from)?, self.lookup(to)?);
        let removed = self.edges.remove(&key);
        if removed.is_some() {
            self.status = Status::Unsolved;
        }
        Ok(removed)
    }

    /// Asserted (pre-solve) bounds on `to - from`, if any.
    pub fn constraint(&self, from: &str, to: &str) -> Result<Option<Bounds>, StnError> {
        let key = (self.lookup(from)?, self.lookup(to)?);
        Ok(self.edges.get(&key).copied())
    }

    /// Runs PC-2 to a fixpoint within the configured budget.
    ///
    /// Re-solving an unchanged solved network is a no-op. Tightening happens on
    /// a working copy that is committed only on success.
    ///
    /// # Errors
    ///
    /// - `Inconsistent` if the constraints admit no schedule; the network then
    ///   stays inconsistent until a constraint is removed
    /// - `Timeout` if the pass budget or timeout is exhausted; the network is left
    ///   as it was before the call
    /// - `Overflow` if a derived finite bound leaves the `i64` tick range; the
    ///   network is left as it was before the call
    pub fn solve(&mut self) -> Result<(), StnError> {
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        self.solve_within(deadline)
    }

    /// Like [`solve`](Self::solve), bounded by an absolute deadline.
    pub fn solve_until(&mut self, deadline: Instant) -> Result<(), StnError> {
        self.solve_within(Some(deadline))
    }

    fn solve_within(&mut self, deadline: Option<Instant>) -> Result<(), StnError> {
        match &self.status {
            Status::Solved(_) => return Ok(()),
            Status::Inconsistent(w) => return Err(StnError::Inconsistent(w.clone())),
            Status::Unsolved => {}
        }

        let limits = Limits {
            max_passes: self.config.max_passes,
            deadline,
        };
        let mut working = Matrix::new(self.names.len());
        let outcome = self
            .edges
            .iter()
            .try_for_each(|(&(from, to), &b)| working.restrict(from.0, to.0, b))
            .map_err(Failure::Conflict)
            .and_then(|()| solver::path_consistency(&mut working, limits));

        match outcome {
            Ok(stats) => {
                tracing::debug!(
                    network = %self.id,
                    points = self.names.len(),
                    edges = self.edges.len(),
                    passes = stats.passes,
                    tightened = stats.tightened,
                    "network solved"
                );
                self.status = Status::Solved(working);
                Ok(())
            }
            Err(Failure::Conflict(c)) => {
                let witness = Witness {
                    from: self.names[c.from].clone(),
                    to: self.names[c.to].clone(),
                    current: c.current,
                    implied: c.implied,
                };
                tracing::warn!(network = %self.id, %witness, "network inconsistent");
                self.status = Status::Inconsistent(witness.clone());
                Err(StnError::Inconsistent(witness))
            }
            Err(Failure::Overflow { from, to }) => {
                let (from, to) = (self.names[from].clone(), self.names[to].clone());
                tracing::warn!(network = %self.id, %from, %to, "bounds overflow the tick range");
                Err(StnError::Overflow { from, to })
            }
            Err(Failure::Timeout { passes }) => {
                tracing::warn!(network = %self.id, passes, "solve budget exhausted");
                Err(StnError::Timeout { passes })
            }
        }
    }

    /// Solves if needed and reports whether the network admits a schedule.
    ///
    /// Returns `false` on inconsistency and on an exhausted solve budget.
    pub fn is_consistent(&mut self) -> bool {
        self.solve().is_ok()
    }

    /// The cached minimal network, or why it is unavailable.
    pub(crate) fn minimal(&self) -> Result<&Matrix, StnError> {
        match &self.status {
            Status::Solved(m) => Ok(m),
            Status::Unsolved => Err(StnError::Stale),
            Status::Inconsistent(w) => Err(StnError::Inconsistent(w.clone())),
        }
    }

    /// Solved bounds on `to - from`.
    ///
    /// # Errors
    ///
    /// `UnknownPoint`, `Stale` (mutated since the last solve), or `Inconsistent`.
    pub fn bounds(&self, from: &str, to: &str) -> Result<Bounds, StnError> {
        let (from, to) = (self.lookup(from)?, self.lookup(to)?);
        Ok(self.minimal()?.get(from.0, to.0))
    }

    /// Solved window of `point` relative to the origin.
    pub fn window(&self, point: &str) -> Result<Bounds, StnError> {
        self.bounds(Self::ORIGIN, point)
    }

    /// Earliest solved time of `point`; [`Bounds::NEG_INF`] if unbounded.
    pub fn earliest(&self, point: &str) -> Result<Tick, StnError> {
        self.window(point).map(|b| b.lower())
    }

    /// Latest solved time of `point`; [`Bounds::POS_INF`] if unbounded.
    pub fn latest(&self, point: &str) -> Result<Tick, StnError> {
        self.window(point).map(|b| b.upper())
    }

    /// Dumps the asserted points and constraints for persistence.
    pub fn edge_list(&self) -> EdgeList {
        EdgeList {
            epoch: self.epoch,
            points: self.names[1..].to_vec(),
            constraints: self.constraints().collect(),
        }
    }

    /// Rebuilds a network from an [`EdgeList`]. Callers re-solve before querying bounds.
    ///
    /// Stored edges are taken verbatim, so a list dumped from an inconsistent
    /// network reloads as one that fails its next solve.
    pub fn from_edge_list(list: EdgeList) -> Result<Self, StnError> {
        let mut stn = Self::build(list.epoch);
        for id in list.points {
            stn.add_time_point(id)?;
        }
        for c in list.constraints {
            let (from, to) = (stn.lookup(&c.from)?, stn.lookup(&c.to)?);
            stn.insert_edge(from, to, c.bounds);
        }
        Ok(stn)
    }
}

impl Display for Stn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Stn {{")?;
        writeln!(f, "  Points: {}", self.names.len())?;
        writeln!(f, "  Constraints: {}", self.edges.len())?;
        writeln!(f, "  State: {:?}", self.state())?;
        for c in self.constraints() {
            writeln!(f, "    {} -> {} {}", c.from, c.to, c.bounds)?;
        }
        write!(f, "}}")
    }
}
