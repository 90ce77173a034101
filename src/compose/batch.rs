//! Solving many disjoint networks on a fixed-size worker pool.

use std::collections::HashSet;
use std::time::Instant;

use crossbeam::channel;
use thiserror::Error;

use super::partition;
use crate::config::PoolConfig;
use crate::network::{Stn, StnError};
use crate::Id;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BatchError {
    #[error("Time point {0} appears in more than one batch network")]
    SharedPoint(Id),

    #[error("Worker pool lost network #{index}")]
    WorkerLost { index: usize },

    #[error("Network #{index} failed to solve: {source}")]
    Solve { index: usize, source: StnError },
}

/// Outcome for one input network.
#[derive(Debug)]
pub enum BatchEntry {
    /// The network came back from the pool together with its own solve result.
    Returned(Stn, Result<(), StnError>),
    /// The worker holding this network died; the network is gone.
    Lost,
}

impl BatchEntry {
    pub fn network(&self) -> Option<&Stn> {
        match self {
            Self::Returned(stn, _) => Some(stn),
            Self::Lost => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Returned(_, Ok(())))
    }
}

/// Per-network outcome of a batch solve, in input order.
///
/// Each network comes back with whatever state its own solve left it in, so
/// a failed component can be inspected (or repaired and re-solved) afterwards.
/// A lost network only affects its own entry.
#[derive(Debug)]
pub struct BatchReport {
    entries: Vec<BatchEntry>,
}

impl BatchReport {
    /// Places received results at their input positions; missing ones are lost.
    fn collect(
        total: usize,
        received: impl IntoIterator<Item = (usize, Stn, Result<(), StnError>)>,
    ) -> Self {
        let mut entries: Vec<BatchEntry> =
            std::iter::repeat_with(|| BatchEntry::Lost).take(total).collect();
        for (index, stn, result) in received {
            if let Some(slot) = entries.get_mut(index) {
                *slot = BatchEntry::Returned(stn, result);
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_ok(&self) -> bool {
        self.entries.iter().all(BatchEntry::is_ok)
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Input positions and errors of the returned networks that failed to solve.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &StnError)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match entry {
                BatchEntry::Returned(_, Err(e)) => Some((i, e)),
                _ => None,
            })
    }

    /// Input positions of the networks lost with their worker.
    pub fn lost(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| matches!(entry, BatchEntry::Lost))
            .map(|(i, _)| i)
    }

    /// The returned networks, in input order. Lost ones are skipped.
    pub fn networks(&self) -> impl Iterator<Item = &Stn> {
        self.entries.iter().filter_map(BatchEntry::network)
    }

    /// Solve results of the returned networks, in input order.
    pub fn results(&self) -> impl Iterator<Item = &Result<(), StnError>> {
        self.entries.iter().filter_map(|entry| match entry {
            BatchEntry::Returned(_, r) => Some(r),
            BatchEntry::Lost => None,
        })
    }

    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }

    /// All solved networks, or the first failure (by input position).
    pub fn into_all_or_nothing(self) -> Result<Vec<Stn>, BatchError> {
        let mut solved = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.into_iter().enumerate() {
            match entry {
                BatchEntry::Returned(stn, Ok(())) => solved.push(stn),
                BatchEntry::Returned(_, Err(source)) => {
                    return Err(BatchError::Solve { index, source })
                }
                BatchEntry::Lost => return Err(BatchError::WorkerLost { index }),
            }
        }
        Ok(solved)
    }
}

fn check_disjoint(networks: &[Stn]) -> Result<(), BatchError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for stn in networks {
        for id in stn.points().skip(1) {
            if !seen.insert(id) {
                return Err(BatchError::SharedPoint(id.to_string()));
            }
        }
    }
    Ok(())
}

/// Solves every network in `networks` on a pool of `config.workers` threads.
///
/// The networks must not share any point besides their origins. Each worker
/// takes exclusive ownership of the network it is solving; results are
/// gathered once every worker has finished. A failure in one network never
/// stops the others.
///
/// If `config.deadline` is set it bounds the whole batch and replaces each
/// network's own solve timeout.
///
/// A worker that panics loses the network it was holding; that network is
/// reported as [`BatchEntry::Lost`] and every other entry is unaffected.
///
/// # Errors
///
/// `SharedPoint` if two networks contain the same non-origin point id.
pub fn solve_batch(networks: Vec<Stn>, config: &PoolConfig) -> Result<BatchReport, BatchError> {
    check_disjoint(&networks)?;

    let total = networks.len();
    let deadline = config.deadline.map(|d| Instant::now() + d);
    let workers = config.workers.get().min(total).max(1);
    tracing::debug!(networks = total, workers, "dispatching batch solve");

    let (job_tx, job_rx) = channel::unbounded::<(usize, Stn)>();
    let (done_tx, done_rx) = channel::unbounded::<(usize, Stn, Result<(), StnError>)>();
    for job in networks.into_iter().enumerate() {
        // The receiver is alive for the whole function.
        if job_tx.send(job).is_err() {
            break;
        }
    }
    drop(job_tx);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                scope.spawn(move || {
                    for (index, mut stn) in jobs.iter() {
                        let result = match deadline {
                            Some(d) => stn.solve_until(d),
                            None => stn.solve(),
                        };
                        tracing::debug!(
                            worker,
                            index,
                            network = %stn.id(),
                            ok = result.is_ok(),
                            "component solved"
                        );
                        if done.send((index, stn, result)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        for (worker, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                tracing::warn!(worker, "batch worker panicked");
            }
        }
    });
    drop(done_tx);

    let report = BatchReport::collect(total, done_rx.iter());
    for index in report.lost() {
        tracing::warn!(index, "batch network lost with its worker");
    }
    tracing::debug!(
        networks = total,
        failed = report.failures().count(),
        lost = report.lost().count(),
        "batch solve finished"
    );
    Ok(report)
}

/// Partitions `stn` into connected components and solves them as a batch.
pub fn solve_partitioned(stn: &Stn, config: &PoolConfig) -> Result<BatchReport, BatchError> {
    solve_batch(partition(stn), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(id: &str) -> Stn {
        let mut stn = Stn::new();
        stn.add_time_point(id).unwrap();
        stn.solve().unwrap();
        stn
    }

    #[test]
    fn missing_results_are_lost_entries() {
        let received = vec![(0, solved("a"), Ok(())), (2, solved("c"), Ok(()))];
        let report = BatchReport::collect(3, received);

        assert_eq!(report.len(), 3);
        assert!(!report.all_ok());
        assert_eq!(report.lost().collect::<Vec<_>>(), [1]);
        assert_eq!(report.failures().count(), 0);
        assert_eq!(report.networks().count(), 2);
        assert!(report.entries()[2].network().is_some_and(|s| s.contains("c")));
        assert_eq!(
            report.into_all_or_nothing().unwrap_err(),
            BatchError::WorkerLost { index: 1 }
        );
    }

    #[test]
    fn solve_failure_is_reported_with_its_index() {
        let received = vec![
            (1, solved("b"), Err(StnError::Stale)),
            (0, solved("a"), Ok(())),
        ];
        let report = BatchReport::collect(2, received);
        assert_eq!(report.lost().count(), 0);
        assert_eq!(
            report.into_all_or_nothing().unwrap_err(),
            BatchError::Solve {
                index: 1,
                source: StnError::Stale
            }
        );
    }
}
