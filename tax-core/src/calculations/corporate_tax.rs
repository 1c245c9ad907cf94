//! Corporate tax on company profit.
//!
//! Taxable profit is profit less deductible expenses, floored at zero. The
//! rules supply either a single flat rate or a reduced rate up to a profit
//! threshold for companies under a turnover ceiling.

use rust_decimal::Decimal;

use crate::calculations::adjustments::corporate_schedule;
use crate::calculations::assembler::Assessment;
use crate::calculations::brackets::BracketEvaluator;
use crate::calculations::common::{checked_sub, max};
use crate::error::CalculationError;
use crate::models::{CorporateTaxInputs, CorporateTaxRules};

#[derive(Debug, Clone, Copy)]
pub struct CorporateTaxCalculator<'a> {
    rules: &'a CorporateTaxRules,
}

impl<'a> CorporateTaxCalculator<'a> {
    pub fn new(rules: &'a CorporateTaxRules) -> Self {
        Self { rules }
    }

    pub fn calculate(
        &self,
        inputs: &CorporateTaxInputs,
    ) -> Result<Assessment, CalculationError> {
        CalculationError::ensure_non_negative("profit", inputs.profit)?;
        CalculationError::ensure_non_negative("deductible_expenses", inputs.deductible_expenses)?;
        if let Some(turnover) = inputs.turnover {
            CalculationError::ensure_non_negative("turnover", turnover)?;
        }

        let taxable = max(
            checked_sub(inputs.profit, inputs.deductible_expenses, "taxable profit")?,
            Decimal::ZERO,
        );
        let corporate = corporate_schedule(self.rules, inputs.turnover)?;
        let evaluation = BracketEvaluator::new(&corporate.schedule).evaluate(taxable)?;

        let schedule = match self.rules {
            CorporateTaxRules::Flat { .. } => None,
            CorporateTaxRules::ThresholdReducedRate { .. } if corporate.reduced_rate_applied => {
                Some("reduced_rate".to_string())
            }
            CorporateTaxRules::ThresholdReducedRate { .. } => Some("standard_rate".to_string()),
        };

        Ok(Assessment {
            base: inputs.profit,
            taxable_base: taxable,
            breakdown: evaluation.breakdown,
            marginal_rate: evaluation.marginal_rate,
            model: Some(self.rules.model_name()),
            schedule,
            ..Assessment::default()
        })
    }
}
