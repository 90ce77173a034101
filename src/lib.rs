//! tempora - temporal constraint engine
//!
//! Simple Temporal Networks solved by PC-2 path consistency, an Allen
//! interval-algebra bridge, tick-precision time conversion, and composition /
//! parallel batch solving of independent networks.

pub mod allen;
pub mod compose;
pub mod config;
pub mod interval;
pub mod network;
pub mod participant;
pub mod time;
pub mod units;

pub use allen::{allen_relation, AllenRelation, RelationSet};
pub use compose::{
    compose, partition, solve_batch, union, BatchEntry, BatchError, BatchReport, Bridge,
};
pub use config::{PoolConfig, SolverConfig};
pub use interval::{Interval, TimeSpec};
pub use network::{Bounds, Constraint, SolveState, Stn, StnError, TimePoint, Witness};
pub use participant::Participant;
pub use time::{Epoch, Tick, TimeError};

/// Identifier type used for time points, intervals, networks and participants.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
