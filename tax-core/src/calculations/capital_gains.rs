//! Capital gains on the disposal of an asset.
//!
//! The gain is the sale price less the purchase price, improvement costs and
//! selling costs. Assets held for at least `long_term_after_years` whole
//! calendar years are taxed at the long-term rate. A loss owes nothing.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::calculations::assembler::{Assessment, flat_line};
use crate::calculations::common::{checked_add, checked_mul, checked_sub, max, round_half_up};
use crate::error::CalculationError;
use crate::models::{CapitalGainsInputs, CapitalGainsRules};

#[derive(Debug, Clone, Copy)]
pub struct CapitalGainsCalculator<'a> {
    rules: &'a CapitalGainsRules,
}

impl<'a> CapitalGainsCalculator<'a> {
    pub fn new(rules: &'a CapitalGainsRules) -> Self {
        Self { rules }
    }

    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for a negative amount or
    /// a sale dated on or before the purchase.
    pub fn calculate(
        &self,
        inputs: &CapitalGainsInputs,
    ) -> Result<Assessment, CalculationError> {
        CalculationError::ensure_non_negative("purchase_price", inputs.purchase_price)?;
        CalculationError::ensure_non_negative("sale_price", inputs.sale_price)?;
        CalculationError::ensure_non_negative("improvement_costs", inputs.improvement_costs)?;
        CalculationError::ensure_non_negative("selling_costs", inputs.selling_costs)?;
        if inputs.sale_date <= inputs.purchase_date {
            return Err(CalculationError::invalid(
                "sale_date",
                format!(
                    "{} is not after purchase_date {}",
                    inputs.sale_date, inputs.purchase_date
                ),
            ));
        }

        let gain = max(Self::gain(inputs)?, Decimal::ZERO);
        let long_term = self.is_long_term(inputs.purchase_date, inputs.sale_date);
        let rate = if long_term {
            self.rules.long_term_rate
        } else {
            self.rules.short_term_rate
        };
        let tax = round_half_up(checked_mul(gain, rate, "capital gains tax")?);
        let holding = if long_term { "long_term" } else { "short_term" };

        Ok(Assessment {
            base: gain,
            taxable_base: gain,
            breakdown: flat_line(gain, rate, tax),
            marginal_rate: rate,
            schedule: Some(holding.to_string()),
            ..Assessment::default()
        })
    }

    fn gain(inputs: &CapitalGainsInputs) -> Result<Decimal, CalculationError> {
        let cost = checked_add(inputs.purchase_price, inputs.improvement_costs, "cost basis")?;
        let cost = checked_add(cost, inputs.selling_costs, "cost basis")?;
        checked_sub(inputs.sale_price, cost, "capital gain")
    }

    fn is_long_term(
        &self,
        purchase_date: NaiveDate,
        sale_date: NaiveDate,
    ) -> bool {
        self.rules
            .long_term_after_years
            .checked_mul(12)
            .and_then(|months| purchase_date.checked_add_months(Months::new(months)))
            .is_some_and(|threshold| sale_date >= threshold)
    }
}
