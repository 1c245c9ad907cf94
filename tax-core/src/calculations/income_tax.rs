//! Personal income tax.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Taxable income = max(0, gross income - deductions) |
//! | 2    | Pick the married schedule if the taxpayer is married and one exists |
//! | 3    | Evaluate brackets, divided by household parts under the quotient model |
//! | 4    | Take allowances (flat model) and tax credits off, floored at zero |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::IncomeTaxCalculator;
//! use tax_core::{AdjustmentModel, Allowances, BracketSchedule, IncomeTaxInputs, IncomeTaxRules, TaxBracket};
//!
//! let rules = IncomeTaxRules {
//!     single: BracketSchedule::new(vec![
//!         TaxBracket::new(dec!(0), Some(dec!(10000)), dec!(0)),
//!         TaxBracket::new(dec!(10000), None, dec!(0.20)),
//!     ])
//!     .unwrap(),
//!     married: None,
//!     allowances: Allowances::default(),
//!     adjustment: AdjustmentModel::FlatAllowance,
//! };
//!
//! let assessment = IncomeTaxCalculator::new(&rules)
//!     .calculate(&IncomeTaxInputs::single(dec!(25000)))
//!     .unwrap();
//!
//! assert_eq!(assessment.breakdown[1].contribution_amount, dec!(3000.00));
//! assert_eq!(assessment.marginal_rate, dec!(0.20));
//! ```

use rust_decimal::Decimal;

use crate::calculations::adjustments::{flat_allowance, quotient_parts, reduce};
use crate::calculations::assembler::Assessment;
use crate::calculations::brackets::BracketEvaluator;
use crate::calculations::common::{checked_add, checked_sub, max, round_half_up};
use crate::error::CalculationError;
use crate::models::{AdjustmentModel, ContributionKind, IncomeTaxInputs, IncomeTaxRules};

#[derive(Debug, Clone, Copy)]
pub struct IncomeTaxCalculator<'a> {
    rules: &'a IncomeTaxRules,
}

impl<'a> IncomeTaxCalculator<'a> {
    pub fn new(rules: &'a IncomeTaxRules) -> Self {
        Self { rules }
    }

    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] when an amount is negative.
    pub fn calculate(
        &self,
        inputs: &IncomeTaxInputs,
    ) -> Result<Assessment, CalculationError> {
        CalculationError::ensure_non_negative("gross_income", inputs.gross_income)?;
        CalculationError::ensure_non_negative("deductions", inputs.deductions)?;
        CalculationError::ensure_non_negative("tax_credits", inputs.tax_credits)?;

        let taxable = self.taxable_income(inputs)?;
        let married = inputs.marital_status.is_married();
        let evaluator = BracketEvaluator::new(self.rules.schedule_for(inputs.marital_status));

        let (evaluation, allowance, parts) = match &self.rules.adjustment {
            AdjustmentModel::FlatAllowance => {
                let allowance =
                    flat_allowance(&self.rules.allowances, married, inputs.dependent_count)?;
                (evaluator.evaluate(taxable)?, round_half_up(allowance), None)
            }
            AdjustmentModel::FamilyQuotient(quotient) => {
                let parts = quotient_parts(quotient, married, inputs.dependent_count)?;
                (
                    evaluator.evaluate_divided(taxable, parts)?,
                    Decimal::ZERO,
                    Some(parts),
                )
            }
        };

        let reduction = checked_add(allowance, round_half_up(inputs.tax_credits), "reductions")?;
        let reduced = reduce(evaluation.total, reduction);

        Ok(Assessment {
            base: inputs.gross_income,
            taxable_base: taxable,
            breakdown: evaluation.breakdown,
            adjustments: reduced.applied,
            adjustment_kind: Some(ContributionKind::Relief),
            marginal_rate: evaluation.marginal_rate,
            model: Some(self.rules.adjustment.name()),
            schedule: Some(self.schedule_name(married).to_string()),
            quotient_parts: parts,
            ..Assessment::default()
        })
    }

    fn taxable_income(
        &self,
        inputs: &IncomeTaxInputs,
    ) -> Result<Decimal, CalculationError> {
        let taxable = checked_sub(inputs.gross_income, inputs.deductions, "taxable income")?;
        Ok(max(taxable, Decimal::ZERO))
    }

    fn schedule_name(
        &self,
        married: bool,
    ) -> &'static str {
        if married && self.rules.married.is_some() {
            "married"
        } else {
            "single"
        }
    }
}
