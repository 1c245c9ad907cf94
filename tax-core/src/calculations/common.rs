//! Shared arithmetic for the calculators.
//!
//! Money is rounded to cents with half-up rounding. Every operation that can
//! leave the [`Decimal`] range goes through a checked helper so an extreme
//! input surfaces as [`CalculationError::ArithmeticOverflow`] instead of a
//! panic.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CalculationError;

/// Decimal places kept on effective rates.
pub const RATE_SCALE: u32 = 4;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(0)).to_string(), "0.00");
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Rounds a rate to [`RATE_SCALE`] places, half-up.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the minimum of two decimal values.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// Restricts `value` to the optional `[minimum, maximum]` range.
pub fn clamp(
    value: Decimal,
    minimum: Option<Decimal>,
    maximum: Option<Decimal>,
) -> Decimal {
    let floored = minimum.map_or(value, |minimum| max(value, minimum));
    maximum.map_or(floored, |maximum| min(floored, maximum))
}

pub(crate) fn checked_add(
    a: Decimal,
    b: Decimal,
    what: &'static str,
) -> Result<Decimal, CalculationError> {
    a.checked_add(b)
        .ok_or(CalculationError::ArithmeticOverflow(what))
}

pub(crate) fn checked_sub(
    a: Decimal,
    b: Decimal,
    what: &'static str,
) -> Result<Decimal, CalculationError> {
    a.checked_sub(b)
        .ok_or(CalculationError::ArithmeticOverflow(what))
}

pub(crate) fn checked_mul(
    a: Decimal,
    b: Decimal,
    what: &'static str,
) -> Result<Decimal, CalculationError> {
    a.checked_mul(b)
        .ok_or(CalculationError::ArithmeticOverflow(what))
}

pub(crate) fn checked_div(
    a: Decimal,
    b: Decimal,
    what: &'static str,
) -> Result<Decimal, CalculationError> {
    a.checked_div(b)
        .ok_or(CalculationError::ArithmeticOverflow(what))
}

/// Sums `values`, failing on overflow.
pub(crate) fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, CalculationError> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| checked_add(acc, value, what))
}

/// `total / base` rounded to [`RATE_SCALE`] places, or zero when there is
/// no base.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::effective_rate;
///
/// assert_eq!(effective_rate(dec!(8435.00), dec!(45000)).unwrap(), dec!(0.1874));
/// assert_eq!(effective_rate(dec!(0), dec!(0)).unwrap(), dec!(0));
/// ```
pub fn effective_rate(
    total: Decimal,
    base: Decimal,
) -> Result<Decimal, CalculationError> {
    if base <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    checked_div(total, base, "effective rate").map(round_rate)
}
