//! Intervals: start/end time-point pairs layered on a network.

mod spec;

pub use spec::TimeSpec;

use spec::Anchor;

use crate::allen::{allen_relation, RelationSet};
use crate::network::{Bounds, Stn, StnError, TimePoint};
use crate::participant::Participant;
use crate::time::Tick;
use crate::Id;

/// A `(start, end)` pair of time points in one network.
///
/// The interval remembers which network created it (by network id) and every
/// query checks that it is asked of that same network. Participants are
/// attached by id only.
///
/// Before a successful solve the endpoints may be inconsistent; afterwards
/// `end >= start` holds unless a negative duration was modelled explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    name: Id,
    network: Id,
    start: Id,
    end: Id,
    participants: Vec<Id>,
}

impl Interval {
    /// Wraps two existing points of `stn` as an interval, adding no constraints.
    pub fn from_points(
        stn: &Stn,
        name: impl Into<Id>,
        start: &str,
        end: &str,
    ) -> Result<Self, StnError> {
        stn.lookup(start)?;
        stn.lookup(end)?;
        Ok(Self {
            name: name.into(),
            network: stn.id().to_string(),
            start: start.to_string(),
            end: end.to_string(),
            participants: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the owning network.
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn participants(&self) -> &[Id] {
        &self.participants
    }

    /// Associates a participant by id. Assigning twice is a no-op.
    pub fn assign(&mut self, participant: &Participant) {
        if !self.participants.iter().any(|p| p == participant.id()) {
            self.participants.push(participant.id().to_string());
        }
    }

    pub fn unassign(&mut self, participant_id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p != participant_id);
        self.participants.len() != before
    }

    pub(crate) fn check_owner(&self, stn: &Stn) -> Result<(), StnError> {
        if self.network == stn.id() {
            Ok(())
        } else {
            Err(StnError::ForeignInterval(self.name.clone()))
        }
    }

    /// Re-targets this interval at another network holding the same point ids,
    /// such as the result of a union or a partition.
    pub fn rebind(&self, stn: &Stn) -> Result<Self, StnError> {
        stn.lookup(&self.start)?;
        stn.lookup(&self.end)?;
        Ok(Self {
            network: stn.id().to_string(),
            ..self.clone()
        })
    }

    /// Solved bounds on `end - start`.
    ///
    /// This is a range, not a point value: with slack in the network the
    /// duration is genuinely uncertain.
    pub fn duration(&self, stn: &Stn) -> Result<Bounds, StnError> {
        self.check_owner(stn)?;
        stn.bounds(&self.start, &self.end)
    }

    /// Solved window of the start point relative to the origin.
    pub fn start_window(&self, stn: &Stn) -> Result<Bounds, StnError> {
        self.check_owner(stn)?;
        stn.window(&self.start)
    }

    /// Solved window of the end point relative to the origin.
    pub fn end_window(&self, stn: &Stn) -> Result<Bounds, StnError> {
        self.check_owner(stn)?;
        stn.window(&self.end)
    }

    /// Allen relations to `other` still possible in the solved network.
    pub fn relation_to(&self, stn: &Stn, other: &Interval) -> Result<RelationSet, StnError> {
        allen_relation(stn, self, other)
    }
}

impl Stn {
    /// Adds an interval named `name` with points `"{name}.start"` / `"{name}.end"`.
    ///
    /// Unless `end` is a [`TimeSpec::Duration`], the interval also gets
    /// `end - start ∈ [0, +∞)`.
    ///
    /// # Errors
    ///
    /// `DuplicateId` if either point id is taken, `InvalidSpec` for a duration
    /// start, `NoEpoch` for absolute specs on an unanchored network, and any
    /// conversion error. Nothing is added on error.
    pub fn add_interval(
        &mut self,
        name: impl Into<Id>,
        start: TimeSpec,
        end: TimeSpec,
    ) -> Result<Interval, StnError> {
        let name: Id = name.into();
        let start_id = format!("{name}.start");
        let end_id = format!("{name}.end");
        for id in [&start_id, &end_id] {
            if self.contains(id) {
                return Err(StnError::DuplicateId(id.clone()));
            }
        }

        let start_anchor = start.resolve(self.epoch())?;
        if matches!(start_anchor, Anchor::Start(_)) {
            return Err(StnError::InvalidSpec("a duration cannot pin an interval start"));
        }
        let end_anchor = end.resolve(self.epoch())?;

        let origin = TimePoint::ORIGIN;
        let s = self.add_time_point(start_id.clone())?;
        let e = self.add_time_point(end_id.clone())?;
        if let Anchor::Origin(b) = start_anchor {
            self.insert_edge(origin, s, b);
        }
        match end_anchor {
            Anchor::Origin(b) => {
                self.insert_edge(origin, e, b);
                self.insert_edge(s, e, Bounds::at_least(0));
            }
            Anchor::Start(b) => self.insert_edge(s, e, b),
            Anchor::Free => self.insert_edge(s, e, Bounds::at_least(0)),
        }

        Ok(Interval {
            name,
            network: self.id().to_string(),
            start: start_id,
            end: end_id,
            participants: Vec::new(),
        })
    }

    /// Adds an interval pinned to `[start, end]` ticks from the origin.
    pub fn add_fixed_interval(
        &mut self,
        name: impl Into<Id>,
        start: Tick,
        end: Tick,
    ) -> Result<Interval, StnError> {
        let name: Id = name.into();
        let start_id = format!("{name}.start");
        let end_id = format!("{name}.end");
        for id in [&start_id, &end_id] {
            if self.contains(id) {
                return Err(StnError::DuplicateId(id.clone()));
            }
        }

        let origin = TimePoint::ORIGIN;
        let s = self.add_time_point(start_id.clone())?;
        let e = self.add_time_point(end_id.clone())?;
        self.insert_edge(origin, s, Bounds::exact(start));
        self.insert_edge(origin, e, Bounds::exact(end));

        Ok(Interval {
            name,
            network: self.id().to_string(),
            start: start_id,
            end: end_id,
            participants: Vec::new(),
        })
    }
}

/// Adds an interval with a generated name. See [`Stn::add_interval`].
pub fn add_interval(stn: &mut Stn, start: TimeSpec, end: TimeSpec) -> Result<Interval, StnError> {
    stn.add_interval(crate::generate_id(), start, end)
}
