//! Solver and worker-pool configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

/// Budget applied to every [`Stn::solve`](crate::network::Stn::solve) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Maximum number of full PC-2 passes before giving up.
    pub max_passes: usize,
    /// Wall-clock budget per solve; `None` means unbounded.
    pub timeout: Option<Duration>,
}

impl SolverConfig {
    pub const DEFAULT_MAX_PASSES: usize = 64;

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_passes: Self::DEFAULT_MAX_PASSES,
            timeout: None,
        }
    }
}

/// Fixed-size worker pool used by [`solve_batch`](crate::compose::solve_batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    pub workers: NonZeroUsize,
    /// Deadline for the whole batch, measured from dispatch.
    pub deadline: Option<Duration>,
}

impl PoolConfig {
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for PoolConfig {
    /// One worker per available core.
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.max_passes, SolverConfig::DEFAULT_MAX_PASSES);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn builders_override_fields() {
        let config = SolverConfig::default()
            .with_max_passes(3)
            .with_timeout(Duration::from_millis(5));
        assert_eq!(config.max_passes, 3);
        assert_eq!(config.timeout, Some(Duration::from_millis(5)));

        let workers = NonZeroUsize::new(2).unwrap();
        let pool = PoolConfig::default().with_workers(workers);
        assert_eq!(pool.workers, workers);
    }
}
