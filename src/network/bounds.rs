//! Interval-valued bounds on the difference between two time points.

use std::fmt::Display;

use super::error::StnError;
use crate::time::Tick;

/// Closed range `[lower, upper]` of ticks, with infinite sides encoded as
/// [`Bounds::NEG_INF`] / [`Bounds::POS_INF`].
///
/// Bounds built through [`Bounds::new`] always satisfy `lower <= upper`.
/// [`intersect`](Self::intersect) may produce an *empty* value
/// (`lower > upper`); the solver treats that as a contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    lower: Tick,
    upper: Tick,
}

impl Bounds {
    /// Sentinel for "no lower bound".
    pub const NEG_INF: Tick = Tick::MIN;
    /// Sentinel for "no upper bound".
    pub const POS_INF: Tick = Tick::MAX;

    pub const UNBOUNDED: Self = Self {
        lower: Self::NEG_INF,
        upper: Self::POS_INF,
    };

    /// Creates `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if `lower > upper`.
    pub fn new(lower: Tick, upper: Tick) -> Result<Self, StnError> {
        if lower > upper {
            return Err(StnError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// `[t, t]`.
    pub const fn exact(t: Tick) -> Self {
        Self { lower: t, upper: t }
    }

    /// `[t, +∞)`.
    pub const fn at_least(t: Tick) -> Self {
        Self {
            lower: t,
            upper: Self::POS_INF,
        }
    }

    /// `(-∞, t]`.
    pub const fn at_most(t: Tick) -> Self {
        Self {
            lower: Self::NEG_INF,
            upper: t,
        }
    }

    pub const fn lower(&self) -> Tick {
        self.lower
    }

    pub const fn upper(&self) -> Tick {
        self.upper
    }

    pub const fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    pub const fn has_lower(&self) -> bool {
        self.lower != Self::NEG_INF
    }

    pub const fn has_upper(&self) -> bool {
        self.upper != Self::POS_INF
    }

    pub const fn contains(&self, t: Tick) -> bool {
        self.lower <= t && t <= self.upper
    }

    /// Returns true if every value allowed by `self` is allowed by `other`.
    pub const fn is_within(&self, other: &Bounds) -> bool {
        other.lower <= self.lower && self.upper <= other.upper
    }

    /// Path composition: if `y - x ∈ self` and `z - y ∈ other` then
    /// `z - x ∈ self.compose(other)`.
    ///
    /// Infinite sides stay infinite. Returns `None` if a finite side leaves
    /// the finite tick range, which would otherwise read as an infinity.
    pub const fn compose(self, other: Bounds) -> Option<Self> {
        let lower = if self.lower == Self::NEG_INF || other.lower == Self::NEG_INF {
            Self::NEG_INF
        } else {
            match finite_sum(self.lower, other.lower) {
                Some(t) => t,
                None => return None,
            }
        };
        let upper = if self.upper == Self::POS_INF || other.upper == Self::POS_INF {
            Self::POS_INF
        } else {
            match finite_sum(self.upper, other.upper) {
                Some(t) => t,
                None => return None,
            }
        };
        Some(Self { lower, upper })
    }

    /// Tightest-wins intersection. The result may be empty.
    pub const fn intersect(self, other: Bounds) -> Self {
        Self {
            lower: if self.lower > other.lower {
                self.lower
            } else {
                other.lower
            },
            upper: if self.upper < other.upper {
                self.upper
            } else {
                other.upper
            },
        }
    }

    /// Bounds of the reversed edge: `y - x ∈ [l, u]` ⇔ `x - y ∈ [-u, -l]`.
    pub const fn inverse(self) -> Self {
        Self {
            lower: negate(self.upper),
            upper: negate(self.lower),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// `a + b`, or `None` if the sum overflows or lands on a sentinel.
const fn finite_sum(a: Tick, b: Tick) -> Option<Tick> {
    match a.checked_add(b) {
        Some(Bounds::NEG_INF) | Some(Bounds::POS_INF) | None => None,
        sum => sum,
    }
}

const fn negate(t: Tick) -> Tick {
    match t {
        Bounds::NEG_INF => Bounds::POS_INF,
        Bounds::POS_INF => Bounds::NEG_INF,
        t => -t,
    }
}

impl Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        if self.has_lower() {
            write!(f, "{}", self.lower)?;
        } else {
            f.write_str("-inf")?;
        }
        f.write_str(", ")?;
        if self.has_upper() {
            write!(f, "{}", self.upper)?;
        } else {
            f.write_str("+inf")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(lower: Tick, upper: Tick) -> Bounds {
        Bounds::new(lower, upper).unwrap()
    }

    #[test]
    fn new_rejects_inverted_bounds() {
        assert_eq!(
            Bounds::new(5, 3),
            Err(StnError::InvalidBounds { lower: 5, upper: 3 })
        );
    }

    #[test]
    fn compose_adds_sides() {
        assert_eq!(b(1, 4).compose(b(2, 3)), Some(b(3, 7)));
    }

    #[test]
    fn compose_propagates_infinity() {
        let c = Bounds::at_least(2).compose(b(-1, 1)).unwrap();
        assert_eq!(c.lower(), 1);
        assert!(!c.has_upper());

        let c = Bounds::at_most(0).compose(Bounds::at_least(0));
        assert_eq!(c, Some(Bounds::UNBOUNDED));
    }

    #[test]
    fn compose_overflow_is_not_infinity() {
        let near_max = Bounds::exact(Bounds::POS_INF - 5);
        assert_eq!(near_max.compose(Bounds::exact(10)), None);
        assert_eq!(near_max.compose(Bounds::exact(5)), None);
        assert_eq!(near_max.compose(Bounds::exact(4)), Some(Bounds::exact(Tick::MAX - 1)));

        let near_min = Bounds::exact(Bounds::NEG_INF + 3);
        assert_eq!(near_min.compose(Bounds::exact(-3)), None);
        assert_eq!(near_min.compose(Bounds::at_least(-10)), None);
    }

    #[test]
    fn intersect_takes_tightest() {
        assert_eq!(b(0, 10).intersect(b(5, 20)), b(5, 10));
        assert!(b(0, 3).intersect(b(5, 8)).is_empty());
    }

    #[test]
    fn inverse_swaps_and_negates() {
        assert_eq!(b(2, 5).inverse(), b(-5, -2));
        assert_eq!(Bounds::at_least(3).inverse(), Bounds::at_most(-3));
        assert_eq!(Bounds::UNBOUNDED.inverse(), Bounds::UNBOUNDED);
    }

    #[test]
    fn is_within() {
        assert!(b(2, 3).is_within(&b(0, 5)));
        assert!(!b(2, 6).is_within(&b(0, 5)));
        assert!(b(2, 6).is_within(&Bounds::UNBOUNDED));
    }

    #[test]
    fn display_infinite_sides() {
        assert_eq!(Bounds::at_least(0).to_string(), "[0, +inf]");
        assert_eq!(b(-2, 7).to_string(), "[-2, 7]");
    }
}
