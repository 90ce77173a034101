//! Compact set of Allen relations.

use std::fmt::Display;

use super::AllenRelation;

/// Set of [`AllenRelation`]s, stored as a 13-bit mask.
///
/// Classification of a solved interval pair returns one of these: with slack
/// in the bounds several relations may remain possible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelationSet(u16);

impl RelationSet {
    const MASK: u16 = (1 << AllenRelation::ALL.len()) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::MASK)
    }

    pub const fn single(relation: AllenRelation) -> Self {
        Self(1 << relation as u16)
    }

    pub fn insert(&mut self, relation: AllenRelation) {
        self.0 |= 1 << relation as u16;
    }

    pub fn remove(&mut self, relation: AllenRelation) {
        self.0 &= !(1 << relation as u16);
    }

    pub const fn contains(&self, relation: AllenRelation) -> bool {
        self.0 & (1 << relation as u16) != 0
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The only relation in the set, if there is exactly one.
    pub fn only(&self) -> Option<AllenRelation> {
        if self.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// The set of converse relations (`r(A, B)` ⇔ `r⁻¹(B, A)`).
    pub fn inverse(&self) -> Self {
        self.iter().map(AllenRelation::inverse).collect()
    }

    /// Iterates in [`AllenRelation::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = AllenRelation> + '_ {
        AllenRelation::ALL
            .iter()
            .copied()
            .filter(move |r| self.contains(*r))
    }
}

impl FromIterator<AllenRelation> for RelationSet {
    fn from_iter<I: IntoIterator<Item = AllenRelation>>(iter: I) -> Self {
        let mut set = Self::empty();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

impl From<AllenRelation> for RelationSet {
    fn from(relation: AllenRelation) -> Self {
        Self::single(relation)
    }
}

impl Display for RelationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, r) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{r}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AllenRelation::*;

    #[test]
    fn empty_and_all() {
        assert!(RelationSet::empty().is_empty());
        assert_eq!(RelationSet::all().len(), 13);
        assert!(RelationSet::all().iter().eq(AllenRelation::ALL.iter().copied()));
    }

    #[test]
    fn insert_remove_contains() {
        let mut set = RelationSet::empty();
        set.insert(Before);
        set.insert(Meets);
        assert!(set.contains(Before));
        assert!(!set.contains(After));
        set.remove(Before);
        assert_eq!(set.only(), Some(Meets));
    }

    #[test]
    fn inverse_maps_each_member() {
        let set: RelationSet = [Before, During, Equals].into_iter().collect();
        let inv = set.inverse();
        assert!(inv.contains(After));
        assert!(inv.contains(Contains));
        assert!(inv.contains(Equals));
        assert_eq!(inv.len(), 3);
    }

    #[test]
    fn display_lists_members() {
        let set: RelationSet = [Meets, Before].into_iter().collect();
        assert_eq!(set.to_string(), "{before, meets}");
    }
}
