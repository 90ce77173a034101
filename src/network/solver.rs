//! PC-2 path consistency over a dense bounds matrix.
//!
//! The solver never touches a [`Stn`](super::Stn) directly: it tightens a
//! working [`Matrix`] that the caller commits only on success, so a
//! contradiction or a blown budget leaves the network exactly as it was.

use std::time::Instant;

use super::Bounds;

/// Dense `n × n` minimal-network cache; cell `(i, j)` bounds `p_j - p_i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Matrix {
    n: usize,
    cells: Vec<Bounds>,
}

impl Matrix {
    /// All pairs unbounded, diagonal pinned to `[0, 0]`.
    pub(crate) fn new(n: usize) -> Self {
        let mut cells = vec![Bounds::UNBOUNDED; n * n];
        for i in 0..n {
            cells[i * n + i] = Bounds::exact(0);
        }
        Self { n, cells }
    }

    pub(crate) fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> Bounds {
        self.cells[i * self.n + j]
    }

    /// Writes `(i, j)` and its mirror `(j, i)`.
    #[inline]
    fn set(&mut self, i: usize, j: usize, bounds: Bounds) {
        self.cells[i * self.n + j] = bounds;
        self.cells[j * self.n + i] = bounds.inverse();
    }

    /// Intersects `(i, j)` with `bounds` (and the mirror with its inverse).
    pub(crate) fn restrict(&mut self, i: usize, j: usize, bounds: Bounds) -> Result<(), Conflict> {
        let current = self.get(i, j);
        let next = current.intersect(bounds);
        if next.is_empty() {
            return Err(Conflict {
                from: i,
                to: j,
                current,
                implied: bounds,
            });
        }
        self.set(i, j, next);
        Ok(())
    }
}

/// Indices and bounds of the edge that became empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict {
    pub from: usize,
    pub to: usize,
    pub current: Bounds,
    pub implied: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Conflict(Conflict),
    Timeout { passes: usize },
    /// A derived finite bound on `to - from` left the tick range.
    Overflow { from: usize, to: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Stats {
    pub passes: usize,
    pub tightened: usize,
}

/// Budget for a single solve.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub max_passes: usize,
    pub deadline: Option<Instant>,
}

/// Runs full PC-2 passes until no edge changes.
///
/// Each pass visits every triple `(i, k, j)` and intersects `(i, j)` with the
/// composition of `(i, k)` and `(k, j)`. Bounds only shrink, so the loop
/// terminates. An edge becoming empty is the same event as the self-loop
/// `(i, i)` excluding zero (the cycle `i → j → i` would yield it), and aborts
/// immediately with that edge as witness.
pub(crate) fn path_consistency(m: &mut Matrix, limits: Limits) -> Result<Stats, Failure> {
    let n = m.size();
    let mut stats = Stats::default();

    loop {
        if stats.passes == limits.max_passes {
            return Err(Failure::Timeout {
                passes: stats.passes,
            });
        }
        stats.passes += 1;
        let mut changed = false;

        for k in 0..n {
            if limits.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(Failure::Timeout {
                    passes: stats.passes,
                });
            }
            for i in 0..n {
                let ik = m.get(i, k);
                if i == k || ik == Bounds::UNBOUNDED {
                    continue;
                }
                for j in 0..n {
                    let kj = m.get(k, j);
                    if j == k || kj == Bounds::UNBOUNDED {
                        continue;
                    }
                    let Some(implied) = ik.compose(kj) else {
                        return Err(Failure::Overflow { from: i, to: j });
                    };
                    let current = m.get(i, j);
                    let next = current.intersect(implied);
                    if next == current {
                        continue;
                    }
                    if next.is_empty() {
                        return Err(Failure::Conflict(Conflict {
                            from: i,
                            to: j,
                            current,
                            implied,
                        }));
                    }
                    m.set(i, j, next);
                    changed = true;
                    stats.tightened += 1;
                }
            }
        }

        tracing::trace!(pass = stats.passes, tightened = stats.tightened, "pc-2 pass");
        if !changed {
            return Ok(stats);
        }
    }
}
