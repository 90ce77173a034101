//! Bridging `qtty` time quantities onto the tick lattice.
//!
//! Callers may express offsets and durations in whatever time unit is natural
//! to them (seconds, minutes, days); this module converts them to seconds with
//! a compile-time dimension check and then to ticks through
//! [`validate_precision`](crate::time::validate_precision).

use qtty::{Quantity, Second, Unit};

use crate::time::{self, Tick, TimeError};

/// Marker trait for units that share the same physical dimension.
///
/// Blanket-implemented for any pair of units where `From::Dim == To::Dim`,
/// so `Quantity<Meter>` can never be passed where a time is expected.
pub trait SameDim<To: Unit>: Unit<Dim = To::Dim> {}

impl<From, To> SameDim<To> for From
where
    From: Unit,
    To: Unit<Dim = From::Dim>,
{
}

/// Converts a quantity from one unit to another unit of the same dimension.
#[inline]
pub const fn convert<From, To>(q: Quantity<From>) -> Quantity<To>
where
    From: SameDim<To>,
    To: Unit,
{
    q.to_const::<To>()
}

/// Converts any time quantity to ticks, rejecting lossy conversions.
///
/// # Example
///
/// ```
/// use qtty::{Minute, Quantity};
/// use tempora::units::quantity_to_ticks;
///
/// assert_eq!(quantity_to_ticks(Quantity::<Minute>::new(1.5)), Ok(90_000));
/// ```
pub fn quantity_to_ticks<U>(q: Quantity<U>) -> Result<Tick, TimeError>
where
    U: SameDim<Second>,
{
    time::validate_precision(convert::<U, Second>(q).value())
}

/// Converts ticks back into a quantity of unit `U`.
pub fn ticks_to_quantity<U>(ticks: Tick) -> Quantity<U>
where
    U: Unit,
    Second: SameDim<U>,
{
    convert::<Second, U>(Quantity::<Second>::new(time::ticks_to_seconds(ticks)))
}
