//! Stamp duty on property purchases.

use rust_decimal::Decimal;

use crate::calculations::assembler::Assessment;
use crate::calculations::brackets::BracketEvaluator;
use crate::error::CalculationError;
use crate::models::{StampDutyInputs, StampDutyRules};

#[derive(Debug, Clone, Copy)]
pub struct StampDutyCalculator<'a> {
    rules: &'a StampDutyRules,
}

impl<'a> StampDutyCalculator<'a> {
    pub fn new(rules: &'a StampDutyRules) -> Self {
        Self { rules }
    }

    /// Applies the first-time-buyer bands when requested and defined,
    /// otherwise the general bands.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] unless the property value
    /// is positive.
    pub fn calculate(
        &self,
        inputs: &StampDutyInputs,
    ) -> Result<Assessment, CalculationError> {
        if inputs.property_value <= Decimal::ZERO {
            return Err(CalculationError::invalid(
                "property_value",
                format!("must be positive, got {}", inputs.property_value),
            ));
        }

        let (schedule, first_time_buyer) = self.rules.schedule_for(inputs.is_first_time_buyer);
        let evaluation = BracketEvaluator::new(schedule).evaluate(inputs.property_value)?;
        let schedule_name = if first_time_buyer {
            "first_time_buyer"
        } else {
            "general"
        };

        Ok(Assessment {
            base: inputs.property_value,
            taxable_base: inputs.property_value,
            breakdown: evaluation.breakdown,
            marginal_rate: evaluation.marginal_rate,
            schedule: Some(schedule_name.to_string()),
            ..Assessment::default()
        })
    }
}
