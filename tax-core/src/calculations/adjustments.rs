//! Jurisdiction-specific adjustments around the bracket result.
//!
//! Two household models are supported for income tax:
//!
//! - **Flat allowance**: brackets run on the taxable base, then fixed
//!   allowances (personal, married, per dependent) come off the tax, floored
//!   at zero.
//! - **Family quotient**: brackets run on `base / parts` and the result is
//!   multiplied back by `parts`, where parts grow with marriage and
//!   dependents.
//!
//! Corporate tax may use a reduced rate on profit up to a threshold, which
//! is expressed here as a two-band [`BracketSchedule`].

use rust_decimal::Decimal;

use crate::calculations::common::{checked_add, checked_mul, min};
use crate::error::CalculationError;
use crate::models::{Allowances, BracketSchedule, CorporateTaxRules, QuotientParts, TaxBracket};

/// An amount after a reduction was taken off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduced {
    pub amount: Decimal,
    /// Portion of the reduction actually used; never more than the gross.
    pub applied: Decimal,
}

/// Takes `reduction` off `gross`, flooring the result at zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::adjustments::reduce;
///
/// let reduced = reduce(dec!(500.00), dec!(800.00));
/// assert_eq!(reduced.amount, dec!(0.00));
/// assert_eq!(reduced.applied, dec!(500.00));
/// ```
pub fn reduce(
    gross: Decimal,
    reduction: Decimal,
) -> Reduced {
    let applied = min(gross, reduction.max(Decimal::ZERO));
    Reduced {
        amount: gross - applied,
        applied,
    }
}

/// Total flat allowance for a household.
pub fn flat_allowance(
    allowances: &Allowances,
    married: bool,
    dependents: u32,
) -> Result<Decimal, CalculationError> {
    let married_allowance = if married {
        allowances.married
    } else {
        Decimal::ZERO
    };
    let dependent_allowance = checked_mul(
        allowances.per_dependent,
        Decimal::from(dependents),
        "dependent allowance",
    )?;
    let total = checked_add(allowances.personal, married_allowance, "allowances")?;
    checked_add(total, dependent_allowance, "allowances")
}

/// Number of parts the household income is split over.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::QuotientParts;
/// use tax_core::calculations::adjustments::quotient_parts;
///
/// // Married couple with two children.
/// assert_eq!(quotient_parts(&QuotientParts::default(), true, 2).unwrap(), dec!(3.0));
/// ```
pub fn quotient_parts(
    parts: &QuotientParts,
    married: bool,
    dependents: u32,
) -> Result<Decimal, CalculationError> {
    let married_parts = if married { parts.married } else { Decimal::ZERO };
    let dependent_parts = checked_mul(
        parts.per_dependent,
        Decimal::from(dependents),
        "dependent parts",
    )?;
    let total = checked_add(parts.base, married_parts, "quotient parts")?;
    checked_add(total, dependent_parts, "quotient parts")
}

/// The schedule a company is taxed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorporateSchedule {
    pub schedule: BracketSchedule,
    /// Whether the reduced-rate band applies.
    pub reduced_rate_applied: bool,
}

/// Builds the band schedule for the corporate rules and the company's
/// turnover.
///
/// Under the threshold model a company whose turnover is unknown or above
/// `max_turnover` pays the standard rate on all profit.
pub fn corporate_schedule(
    rules: &CorporateTaxRules,
    turnover: Option<Decimal>,
) -> Result<CorporateSchedule, CalculationError> {
    let (brackets, reduced_rate_applied) = match rules {
        CorporateTaxRules::Flat { rate } => {
            (vec![TaxBracket::new(Decimal::ZERO, None, *rate)], false)
        }
        CorporateTaxRules::ThresholdReducedRate {
            standard_rate,
            reduced_rate,
            threshold,
            max_turnover,
        } => {
            let eligible = match (max_turnover, turnover) {
                (None, _) => true,
                (Some(max_turnover), Some(turnover)) => turnover <= *max_turnover,
                (Some(_), None) => false,
            };
            if eligible {
                (
                    vec![
                        TaxBracket::new(Decimal::ZERO, Some(*threshold), *reduced_rate),
                        TaxBracket::new(*threshold, None, *standard_rate),
                    ],
                    true,
                )
            } else {
                (vec![TaxBracket::new(Decimal::ZERO, None, *standard_rate)], false)
            }
        }
    };

    let schedule = BracketSchedule::new(brackets)
        .map_err(|err| CalculationError::invalid("corporate_tax", err.to_string()))?;
    Ok(CorporateSchedule {
        schedule,
        reduced_rate_applied,
    })
}
