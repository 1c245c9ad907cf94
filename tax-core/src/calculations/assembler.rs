//! Turns a calculator's [`Assessment`] into a [`CalculationResult`].
//!
//! The assembler derives the total from the bracket lines and the
//! adjustments, then closes the breakdown with one adjustment line, so every
//! result satisfies `total == sum(breakdown)` by construction. Money figures
//! always carry two decimal places, zero included.

use rust_decimal::Decimal;

use crate::calculations::common::{checked_sub, checked_sum, effective_rate, round_half_up};
use crate::error::CalculationError;
use crate::models::{
    BracketContribution, BracketRange, CalculationMetadata, CalculationRequest,
    CalculationResult, ContributionKind, JurisdictionRuleSet,
};

/// What a calculator found, before totals and metadata are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assessment {
    /// Amount the effective rate is measured against.
    pub base: Decimal,
    /// Amount the rates were applied to.
    pub taxable_base: Decimal,
    pub breakdown: Vec<BracketContribution>,
    /// Taken off the bracket sum; negative when a minimum raised it.
    pub adjustments: Decimal,
    /// Kind of the closing breakdown line. Defaults to relief for a
    /// reduction and minimum for a top-up.
    pub adjustment_kind: Option<ContributionKind>,
    pub marginal_rate: Decimal,
    pub model: Option<&'static str>,
    pub schedule: Option<String>,
    pub quotient_parts: Option<Decimal>,
    pub net_amount: Option<Decimal>,
    pub gross_amount: Option<Decimal>,
    pub employer_contribution: Option<Decimal>,
    pub periods: Option<u32>,
}

/// One unbounded line at a flat `rate`, or no line for a zero base.
pub(crate) fn flat_line(
    taxable_amount: Decimal,
    rate: Decimal,
    contribution_amount: Decimal,
) -> Vec<BracketContribution> {
    if taxable_amount.is_zero() {
        return Vec::new();
    }
    vec![BracketContribution {
        kind: ContributionKind::Bracket,
        range: BracketRange {
            lower_bound: Decimal::ZERO,
            upper_bound: None,
        },
        rate,
        taxable_amount: round_half_up(taxable_amount),
        contribution_amount: round_half_up(contribution_amount),
    }]
}

/// Closing line that takes `adjustments` off the bracket lines.
fn adjustment_line(
    kind: ContributionKind,
    adjustments: Decimal,
) -> BracketContribution {
    BracketContribution {
        kind,
        range: BracketRange {
            lower_bound: Decimal::ZERO,
            upper_bound: None,
        },
        rate: Decimal::ZERO,
        taxable_amount: round_half_up(Decimal::ZERO),
        contribution_amount: -adjustments,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResultAssembler<'a> {
    rule_set: &'a JurisdictionRuleSet,
    request: &'a CalculationRequest,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(
        rule_set: &'a JurisdictionRuleSet,
        request: &'a CalculationRequest,
    ) -> Self {
        Self { rule_set, request }
    }

    pub fn assemble(
        &self,
        assessment: Assessment,
    ) -> Result<CalculationResult, CalculationError> {
        let gross = checked_sum(
            assessment.breakdown.iter().map(|c| c.contribution_amount),
            "breakdown total",
        )?;
        let adjustments = round_half_up(assessment.adjustments);
        let total = round_half_up(checked_sub(gross, adjustments, "total")?);
        debug_assert!(total >= Decimal::ZERO, "adjustments exceed the breakdown");

        let mut breakdown = assessment.breakdown;
        if !adjustments.is_zero() {
            let kind = assessment.adjustment_kind.unwrap_or(if adjustments > Decimal::ZERO {
                ContributionKind::Relief
            } else {
                ContributionKind::Minimum
            });
            breakdown.push(adjustment_line(kind, adjustments));
        }

        let metadata = CalculationMetadata {
            jurisdiction_code: self.rule_set.jurisdiction_code.clone(),
            calculation_type: self.request.calculation_type(),
            as_of_date: self.request.as_of_date,
            rule_set_effective_from: self.rule_set.effective_from,
            rule_set_effective_to: self.rule_set.effective_to,
            currency: self.rule_set.currency.clone(),
            base: assessment.base,
            taxable_base: assessment.taxable_base,
            model: assessment.model.map(str::to_string),
            schedule: assessment.schedule,
            quotient_parts: assessment.quotient_parts,
            net_amount: assessment.net_amount,
            gross_amount: assessment.gross_amount,
            employer_contribution: assessment.employer_contribution,
            periods: assessment.periods,
        };

        Ok(CalculationResult {
            total,
            effective_rate: effective_rate(total, assessment.base)?,
            marginal_rate: assessment.marginal_rate,
            adjustments_applied: adjustments,
            breakdown,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{CalculationType, StampDutyInputs};

    fn rule_set() -> JurisdictionRuleSet {
        JurisdictionRuleSet {
            currency: Some("EUR".to_string()),
            ..JurisdictionRuleSet::new("MT", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        }
    }

    fn breakdown_sum(result: &CalculationResult) -> Decimal {
        result.breakdown.iter().map(|c| c.contribution_amount).sum()
    }

    fn request() -> CalculationRequest {
        CalculationRequest::new(
            "mt",
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            StampDutyInputs {
                property_value: dec!(200000),
                is_first_time_buyer: true,
            },
        )
    }

    #[test]
    fn assemble_derives_total_from_breakdown_and_adjustments() {
        let rule_set = rule_set();
        let request = request();
        let assessment = Assessment {
            base: dec!(1000),
            taxable_base: dec!(1000),
            breakdown: flat_line(dec!(1000), dec!(0.10), dec!(100.00)),
            adjustments: dec!(25.00),
            marginal_rate: dec!(0.10),
            ..Assessment::default()
        };

        let result = ResultAssembler::new(&rule_set, &request).assemble(assessment).unwrap();

        assert_eq!(result.total, dec!(75.00));
        assert_eq!(result.effective_rate, dec!(0.075));
        assert_eq!(result.gross_amount() - result.adjustments_applied, result.total);
        assert_eq!(breakdown_sum(&result), result.total);

        let closing = result.breakdown.last().unwrap();
        assert_eq!(closing.kind, ContributionKind::Relief);
        assert_eq!(closing.contribution_amount, dec!(-25.00));
    }

    #[test]
    fn assemble_uses_the_calculator_adjustment_kind() {
        let rule_set = rule_set();
        let request = request();
        let assessment = Assessment {
            base: dec!(40000),
            taxable_base: dec!(40000),
            breakdown: flat_line(dec!(40000), dec!(0.15), dec!(6000.00)),
            adjustments: dec!(2205.60),
            adjustment_kind: Some(ContributionKind::Cap),
            ..Assessment::default()
        };

        let result = ResultAssembler::new(&rule_set, &request).assemble(assessment).unwrap();

        assert_eq!(result.total, dec!(3794.40));
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[1].kind, ContributionKind::Cap);
        assert_eq!(breakdown_sum(&result), result.total);
    }

    #[test]
    fn assemble_without_adjustments_adds_no_line() {
        let rule_set = rule_set();
        let request = request();
        let assessment = Assessment {
            base: dec!(1000),
            taxable_base: dec!(1000),
            breakdown: flat_line(dec!(1000), dec!(0.10), dec!(100.00)),
            ..Assessment::default()
        };

        let result = ResultAssembler::new(&rule_set, &request).assemble(assessment).unwrap();

        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.gross_amount(), result.total);
    }

    #[test]
    fn assemble_zero_total_has_two_decimal_places() {
        let rule_set = rule_set();
        let request = request();

        let result = ResultAssembler::new(&rule_set, &request)
            .assemble(Assessment::default())
            .unwrap();

        assert_eq!(result.total.to_string(), "0.00");
        assert_eq!(result.adjustments_applied.to_string(), "0.00");
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn assemble_fills_metadata_from_rule_set_and_request() {
        let rule_set = rule_set();
        let request = request();

        let result = ResultAssembler::new(&rule_set, &request)
            .assemble(Assessment::default())
            .unwrap();

        assert_eq!(result.metadata.jurisdiction_code, "MT");
        assert_eq!(result.metadata.calculation_type, CalculationType::StampDuty);
        assert_eq!(result.metadata.currency.as_deref(), Some("EUR"));
        assert_eq!(
            result.metadata.rule_set_effective_from,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn assemble_negative_adjustment_raises_total() {
        let rule_set = rule_set();
        let request = request();
        let assessment = Assessment {
            base: dec!(10),
            taxable_base: dec!(10),
            breakdown: flat_line(dec!(10), dec!(0.10), dec!(1.00)),
            adjustments: dec!(-1.43),
            ..Assessment::default()
        };

        let result = ResultAssembler::new(&rule_set, &request).assemble(assessment).unwrap();

        assert_eq!(result.total, dec!(2.43));
        assert_eq!(result.breakdown[1].kind, ContributionKind::Minimum);
        assert_eq!(result.breakdown[1].contribution_amount, dec!(1.43));
        assert_eq!(breakdown_sum(&result), result.total);
    }

    #[test]
    fn flat_line_is_empty_for_zero_base() {
        assert!(flat_line(dec!(0), dec!(0.18), dec!(0)).is_empty());
    }
}
