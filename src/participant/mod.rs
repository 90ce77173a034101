//! Participants: agents or entities that timeline intervals refer to.
//!
//! A participant is never owned by a network. Intervals hold participant ids
//! only, so the same participant can appear in many networks (or none) and
//! dropping a network never touches it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::interval::Interval;
use crate::Id;

/// An agent or entity tag with capabilities and free-form properties.
///
/// # Example
///
/// ```
/// use tempora::participant::Participant;
///
/// let rover = Participant::new("rover-1")
///     .with_capability("drive")
///     .with_capability("drill")
///     .with_property("battery", "full");
///
/// assert!(rover.has_capability("drill"));
/// assert_eq!(rover.property("battery"), Some("full"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    id: Id,
    capabilities: BTreeSet<String>,
    properties: BTreeMap<String, String>,
}

impl Participant {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            capabilities: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Creates a participant with a generated id.
    pub fn anonymous() -> Self {
        Self::new(crate::generate_id())
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(|s| s.as_str())
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns true if this participant has every capability in `required`.
    pub fn has_all<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> bool {
        required.into_iter().all(|c| self.has_capability(c))
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|s| s.as_str())
    }

    /// Sets a property, returning the previous value.
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.properties.insert(key.into(), value.into())
    }

    /// Returns true if `interval` lists this participant.
    pub fn is_assigned_to(&self, interval: &Interval) -> bool {
        interval.participants().iter().any(|p| *p == self.id)
    }
}

impl Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)?;
        if !self.capabilities.is_empty() {
            let caps: Vec<&str> = self.capabilities().collect();
            write!(f, " [{}]", caps.join(", "))?;
        }
        Ok(())
    }
}
