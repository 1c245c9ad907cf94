//! Progressive bracket evaluation.
//!
//! Each bracket taxes the slice of the base that falls inside it:
//!
//! ```text
//! width_i        = min(base, upper_i) - lower_i        (clamped at zero)
//! contribution_i = round_half_up(width_i * rate_i)
//! total          = sum(contribution_i)
//! ```
//!
//! Evaluation stops at the first bracket whose lower bound is at or above
//! the base, so a zero base yields an empty breakdown. Brackets with a zero
//! rate that the base reaches still appear, with a zero contribution.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::BracketEvaluator;
//! use tax_core::{BracketSchedule, TaxBracket};
//!
//! let schedule = BracketSchedule::new(vec![
//!     TaxBracket::new(dec!(0), Some(dec!(9100)), dec!(0.00)),
//!     TaxBracket::new(dec!(9100), Some(dec!(14500)), dec!(0.15)),
//!     TaxBracket::new(dec!(14500), None, dec!(0.25)),
//! ])
//! .unwrap();
//!
//! let evaluation = BracketEvaluator::new(&schedule).evaluate(dec!(20000)).unwrap();
//!
//! assert_eq!(evaluation.total, dec!(2185.00));
//! assert_eq!(evaluation.marginal_rate, dec!(0.25));
//! assert_eq!(evaluation.breakdown.len(), 3);
//! ```

use rust_decimal::Decimal;

use crate::calculations::common::{checked_div, checked_mul, checked_sub, checked_sum, min, round_half_up};
use crate::error::CalculationError;
use crate::models::{BracketContribution, BracketRange, BracketSchedule, ContributionKind};

/// Bracket-by-bracket result of applying a schedule to a base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketEvaluation {
    pub breakdown: Vec<BracketContribution>,
    /// Sum of the rounded contributions.
    pub total: Decimal,
    /// Rate of the bracket holding the last unit of the base.
    pub marginal_rate: Decimal,
}

/// Applies a [`BracketSchedule`] to amounts.
#[derive(Debug, Clone, Copy)]
pub struct BracketEvaluator<'a> {
    schedule: &'a BracketSchedule,
}

impl<'a> BracketEvaluator<'a> {
    pub fn new(schedule: &'a BracketSchedule) -> Self {
        Self { schedule }
    }

    /// Evaluates the schedule on `base`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for a negative base and
    /// [`CalculationError::ArithmeticOverflow`] if a product leaves the
    /// decimal range.
    pub fn evaluate(
        &self,
        base: Decimal,
    ) -> Result<BracketEvaluation, CalculationError> {
        CalculationError::ensure_non_negative("base", base)?;
        let slices = self.slices(base)?;
        self.finish(slices, base)
    }

    /// Evaluates the schedule on `base / parts` and scales every slice back
    /// up by `parts` before rounding.
    ///
    /// With `parts == 1` this is the same as [`evaluate`](Self::evaluate).
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for a negative base or a
    /// non-positive part count.
    pub fn evaluate_divided(
        &self,
        base: Decimal,
        parts: Decimal,
    ) -> Result<BracketEvaluation, CalculationError> {
        CalculationError::ensure_non_negative("base", base)?;
        if parts <= Decimal::ZERO {
            return Err(CalculationError::invalid(
                "quotient_parts",
                format!("must be positive, got {parts}"),
            ));
        }

        let share = checked_div(base, parts, "quotient share")?;
        let mut slices = self.slices(share)?;
        for slice in &mut slices {
            slice.width = checked_mul(slice.width, parts, "scaled bracket width")?;
            slice.contribution =
                checked_mul(slice.contribution, parts, "scaled bracket contribution")?;
        }
        self.finish(slices, share)
    }

    /// Unrounded width and contribution of each bracket the base reaches.
    fn slices(
        &self,
        base: Decimal,
    ) -> Result<Vec<Slice>, CalculationError> {
        let mut slices = Vec::new();
        for (index, bracket) in self.schedule.brackets().iter().enumerate() {
            if base <= bracket.lower_bound {
                break;
            }
            let top = bracket.upper_bound.map_or(base, |upper| min(base, upper));
            let width = checked_sub(top, bracket.lower_bound, "bracket width")?;
            let contribution = checked_mul(width, bracket.rate, "bracket contribution")?;
            slices.push(Slice {
                index,
                width,
                contribution,
            });
        }
        Ok(slices)
    }

    fn finish(
        &self,
        slices: Vec<Slice>,
        marginal_point: Decimal,
    ) -> Result<BracketEvaluation, CalculationError> {
        let brackets = self.schedule.brackets();
        let breakdown: Vec<BracketContribution> = slices
            .into_iter()
            .map(|slice| {
                let bracket = &brackets[slice.index];
                BracketContribution {
                    kind: ContributionKind::Bracket,
                    range: BracketRange::from(bracket),
                    rate: bracket.rate,
                    taxable_amount: round_half_up(slice.width),
                    contribution_amount: round_half_up(slice.contribution),
                }
            })
            .collect();
        let total = checked_sum(
            breakdown.iter().map(|c| c.contribution_amount),
            "bracket total",
        )?;

        Ok(BracketEvaluation {
            breakdown,
            total,
            marginal_rate: self.schedule.bracket_for(marginal_point).rate,
        })
    }
}

#[derive(Debug)]
struct Slice {
    index: usize,
    width: Decimal,
    contribution: Decimal,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TaxBracket;

    fn malta_single() -> BracketSchedule {
        BracketSchedule::new(vec![
            TaxBracket::new(dec!(0), Some(dec!(9100)), dec!(0.00)),
            TaxBracket::new(dec!(9100), Some(dec!(14500)), dec!(0.15)),
            TaxBracket::new(dec!(14500), Some(dec!(19500)), dec!(0.25)),
            TaxBracket::new(dec!(19500), Some(dec!(60000)), dec!(0.25)),
            TaxBracket::new(dec!(60000), None, dec!(0.35)),
        ])
        .unwrap()
    }

    fn france() -> BracketSchedule {
        BracketSchedule::new(vec![
            TaxBracket::new(dec!(0), Some(dec!(11497)), dec!(0.00)),
            TaxBracket::new(dec!(11497), Some(dec!(29315)), dec!(0.11)),
            TaxBracket::new(dec!(29315), Some(dec!(83823)), dec!(0.30)),
            TaxBracket::new(dec!(83823), Some(dec!(180294)), dec!(0.41)),
            TaxBracket::new(dec!(180294), None, dec!(0.45)),
        ])
        .unwrap()
    }

    // =========================================================================
    // evaluate tests
    // =========================================================================

    #[test]
    fn evaluate_malta_single_45000() {
        let schedule = malta_single();

        let result = BracketEvaluator::new(&schedule).evaluate(dec!(45000)).unwrap();

        assert_eq!(result.total, dec!(8435.00));
        assert_eq!(result.marginal_rate, dec!(0.25));
        let contributions: Vec<Decimal> = result
            .breakdown
            .iter()
            .map(|c| c.contribution_amount)
            .collect();
        assert_eq!(
            contributions,
            vec![dec!(0.00), dec!(810.00), dec!(1250.00), dec!(6375.00)]
        );
    }

    #[test]
    fn evaluate_includes_zero_rate_bracket() {
        let schedule = malta_single();

        let result = BracketEvaluator::new(&schedule).evaluate(dec!(5000)).unwrap();

        assert_eq!(result.total, dec!(0.00));
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.breakdown[0].taxable_amount, dec!(5000.00));
        assert_eq!(result.breakdown[0].contribution_amount, dec!(0.00));
    }

    #[test]
    fn evaluate_zero_base_has_empty_breakdown() {
        let schedule = malta_single();

        let result = BracketEvaluator::new(&schedule).evaluate(dec!(0)).unwrap();

        assert_eq!(result.total, dec!(0));
        assert!(result.breakdown.is_empty());
        assert_eq!(result.marginal_rate, dec!(0.00));
    }

    #[test]
    fn evaluate_at_exact_boundary_stops_before_next_bracket() {
        let schedule = malta_single();

        let result = BracketEvaluator::new(&schedule).evaluate(dec!(9100)).unwrap();

        assert_eq!(result.total, dec!(0.00));
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.marginal_rate, dec!(0.00));
    }

    #[test]
    fn evaluate_just_past_boundary_taxes_the_cent() {
        let schedule = malta_single();

        let result = BracketEvaluator::new(&schedule).evaluate(dec!(9100.10)).unwrap();

        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[1].taxable_amount, dec!(0.10));
        assert_eq!(result.total, dec!(0.02)); // 0.015 rounds up
        assert_eq!(result.marginal_rate, dec!(0.15));
    }

    #[test]
    fn evaluate_unbounded_bracket_uses_remaining_base() {
        let schedule = malta_single();

        let result = BracketEvaluator::new(&schedule).evaluate(dec!(100000)).unwrap();

        let last = result.breakdown.last().unwrap();
        assert_eq!(last.range.upper_bound, None);
        assert_eq!(last.taxable_amount, dec!(40000.00));
        assert_eq!(last.contribution_amount, dec!(14000.00));
        assert_eq!(result.total, dec!(26185.00));
    }

    #[test]
    fn evaluate_rejects_negative_base() {
        let schedule = malta_single();

        let result = BracketEvaluator::new(&schedule).evaluate(dec!(-1));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { field: "base", .. })
        ));
    }

    // =========================================================================
    // evaluate_divided tests
    // =========================================================================

    #[test]
    fn evaluate_divided_with_one_part_matches_evaluate() {
        let schedule = france();
        let evaluator = BracketEvaluator::new(&schedule);

        let divided = evaluator.evaluate_divided(dec!(50000), dec!(1)).unwrap();
        let plain = evaluator.evaluate(dec!(50000)).unwrap();

        assert_eq!(divided, plain);
    }

    #[test]
    fn evaluate_divided_spreads_base_over_parts() {
        let schedule = france();

        // 60000 / 2 = 30000 per part:
        // 11% of 17818 = 1959.98, 30% of 685 = 205.50, times two parts.
        let result = BracketEvaluator::new(&schedule)
            .evaluate_divided(dec!(60000), dec!(2))
            .unwrap();

        assert_eq!(result.total, dec!(4330.96));
        assert_eq!(result.marginal_rate, dec!(0.30));
        assert_eq!(result.breakdown[1].taxable_amount, dec!(35636.00));
        assert_eq!(result.breakdown[2].contribution_amount, dec!(411.00));
    }

    #[test]
    fn evaluate_divided_reports_overflow() {
        let schedule = france();

        let result = BracketEvaluator::new(&schedule).evaluate_divided(Decimal::MAX, dec!(0.5));

        assert_eq!(result, Err(CalculationError::ArithmeticOverflow("quotient share")));
    }

    #[test]
    fn evaluate_divided_rejects_zero_parts() {
        let schedule = france();

        let result = BracketEvaluator::new(&schedule).evaluate_divided(dec!(1000), dec!(0));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput {
                field: "quotient_parts",
                ..
            })
        ));
    }
}
